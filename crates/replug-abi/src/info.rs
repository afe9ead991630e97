//! Raw `#[repr(C)]` types crossing the host/plugin boundary.

use std::ffi::c_void;
use std::slice;

/// Name of the single symbol every plugin image exports.
pub const MODULE_INFO_SYMBOL: &[u8] = b"_replug_module_info";

/// Signature of the exported entry point.
pub type ModuleInfoFn = unsafe extern "C" fn() -> RawModuleInfo;

/// Signature of the lifecycle callback returned by the entry point.
pub type LifecycleFn = unsafe extern "C" fn(LifecycleOp, *mut c_void);

/// Lifecycle transition delivered to a plugin image.
///
/// Each transition is delivered exactly once per load/reload/unload; the
/// host fixes the ordering.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleOp {
    /// Image just opened for the first time.
    Load,
    /// Image is about to close permanently.
    Unload,
    /// Image is about to close for a reload.
    BeforeReload,
    /// Replacement image just opened as part of a reload.
    AfterReload,
}

impl std::fmt::Display for LifecycleOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleOp::Load => write!(f, "load"),
            LifecycleOp::Unload => write!(f, "unload"),
            LifecycleOp::BeforeReload => write!(f, "before-reload"),
            LifecycleOp::AfterReload => write!(f, "after-reload"),
        }
    }
}

/// Descriptor of one preserved variable inside an open image.
///
/// Valid only while the owning image is open; the pointers dangle the
/// instant that image closes and must never be dereferenced afterwards.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct VarInfo {
    pub name: *const u8,
    pub name_len: usize,
    pub value: *mut c_void,
    pub value_size: usize,
}

impl VarInfo {
    /// Name bytes of the variable.
    ///
    /// # Safety
    /// The owning image must still be open.
    pub unsafe fn name_bytes(&self) -> &[u8] {
        unsafe { slice::from_raw_parts(self.name, self.name_len) }
    }

    /// Current value bytes of the variable.
    ///
    /// # Safety
    /// The owning image must still be open and the value must not be
    /// written concurrently.
    pub unsafe fn value_bytes(&self) -> &[u8] {
        unsafe { slice::from_raw_parts(self.value.cast_const().cast::<u8>(), self.value_size) }
    }
}

/// Record a plugin image hands back describing its variable registry and
/// lifecycle callback.
///
/// Produced fresh by the entry point on every open; the host replaces its
/// copy wholesale on each reload, never merges.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawModuleInfo {
    /// Start of the descriptor table. Entries may be null placeholders,
    /// which every consumer skips.
    pub vars_begin: *const *const VarInfo,
    /// One past the last descriptor table entry.
    pub vars_end: *const *const VarInfo,
    /// Callback receiving lifecycle transitions and the host's userdata.
    pub lifecycle: LifecycleFn,
}

impl RawModuleInfo {
    /// Iterates the non-placeholder descriptors of the registry.
    ///
    /// # Safety
    /// The owning image must still be open.
    pub unsafe fn vars(&self) -> impl Iterator<Item = &VarInfo> {
        let table: &[*const VarInfo] =
            if self.vars_begin.is_null() || self.vars_begin == self.vars_end {
                &[]
            } else {
                let len = unsafe { self.vars_end.offset_from(self.vars_begin) } as usize;
                unsafe { slice::from_raw_parts(self.vars_begin, len) }
            };
        table.iter().filter_map(|entry| unsafe { entry.as_ref() })
    }
}

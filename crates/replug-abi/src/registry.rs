//! Per-image variable registry.
//!
//! Each image owns one registry: a descriptor sequence assembled by
//! registration calls while the image starts up, then frozen into a table
//! with stable addresses that the entry point exposes as a
//! `[begin, end)` pointer range.

use std::ptr;

use tracing::debug;

use crate::VarInfo;

enum Slot {
    Var(VarInfo),
    Placeholder,
}

/// Growable descriptor sequence for one image.
#[derive(Default)]
pub struct VarRegistry {
    slots: Vec<Slot>,
}

impl VarRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Appends a variable descriptor.
    pub fn register(&mut self, var: VarInfo) {
        // The descriptor came from a live `Preserved` slot, so the name
        // bytes are readable here.
        let name = String::from_utf8_lossy(unsafe { var.name_bytes() }).into_owned();
        debug!(name = %name, size = var.value_size, "registered preserved variable");
        self.slots.push(Slot::Var(var));
    }

    /// Reserves an empty slot. Every consumer of the frozen table detects
    /// and skips it; it is never counted, snapshotted, or matched.
    pub fn register_placeholder(&mut self) {
        self.slots.push(Slot::Placeholder);
    }

    /// Number of slots, including placeholders.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Freezes the sequence into a table with stable addresses.
    pub fn freeze(self) -> RegistryTable {
        let vars: Box<[VarInfo]> = self
            .slots
            .iter()
            .filter_map(|slot| match slot {
                Slot::Var(var) => Some(*var),
                Slot::Placeholder => None,
            })
            .collect();

        let mut next = 0;
        let refs: Box<[*const VarInfo]> = self
            .slots
            .iter()
            .map(|slot| match slot {
                Slot::Var(_) => {
                    let entry = ptr::from_ref(&vars[next]);
                    next += 1;
                    entry
                }
                Slot::Placeholder => ptr::null(),
            })
            .collect();

        RegistryTable { _vars: vars, refs }
    }
}

/// Frozen registry: the descriptor range an image exposes through its
/// entry point. Placeholder slots are null entries.
pub struct RegistryTable {
    // Keeps the descriptors alive; `refs` points into this allocation, and
    // boxed slices never move.
    _vars: Box<[VarInfo]>,
    refs: Box<[*const VarInfo]>,
}

// Written only during freeze(); afterwards the table is read-only shared
// data addressed by raw pointer under the host's serialization contract.
unsafe impl Send for RegistryTable {}
unsafe impl Sync for RegistryTable {}

impl RegistryTable {
    /// Start of the `[begin, end)` descriptor range.
    pub fn begin(&self) -> *const *const VarInfo {
        self.refs.as_ptr()
    }

    /// One past the end of the descriptor range.
    pub fn end(&self) -> *const *const VarInfo {
        unsafe { self.refs.as_ptr().add(self.refs.len()) }
    }
}

/// Declares the module entry point of a plugin image.
///
/// Expands to the single exported symbol the host resolves
/// (`_replug_module_info`), assembling the image's variable registry from
/// the `preserve` list on the first call and reusing it afterwards. A `_`
/// item reserves a placeholder slot. Duplicate names are allowed and
/// restore first-match in list order.
///
/// ```ignore
/// use std::ffi::c_void;
/// use replug_abi::{LifecycleOp, Preserved};
///
/// static COUNTER: Preserved<u32> = Preserved::new(0);
///
/// fn lifecycle(op: LifecycleOp, _userdata: *mut c_void) {
///     let _ = op;
/// }
///
/// replug_abi::declare_module! {
///     lifecycle: lifecycle,
///     preserve: [COUNTER],
/// }
/// ```
#[macro_export]
macro_rules! declare_module {
    (lifecycle: $lifecycle:path, preserve: [$($slot:tt),* $(,)?] $(,)?) => {
        #[unsafe(no_mangle)]
        pub extern "C" fn _replug_module_info() -> $crate::RawModuleInfo {
            unsafe extern "C" fn __replug_lifecycle(
                op: $crate::LifecycleOp,
                userdata: *mut ::std::ffi::c_void,
            ) {
                $lifecycle(op, userdata)
            }

            static TABLE: ::std::sync::OnceLock<$crate::RegistryTable> =
                ::std::sync::OnceLock::new();
            let table = TABLE.get_or_init(|| {
                let mut registry = $crate::VarRegistry::new();
                $($crate::__register_slot!(registry, $slot);)*
                registry.freeze()
            });

            $crate::RawModuleInfo {
                vars_begin: table.begin(),
                vars_end: table.end(),
                lifecycle: __replug_lifecycle,
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __register_slot {
    ($registry:ident, _) => {
        $registry.register_placeholder()
    };
    ($registry:ident, $var:ident) => {
        $registry.register($var.slot(stringify!($var)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LifecycleOp, Preserved, RawModuleInfo};

    unsafe extern "C" fn noop(_op: LifecycleOp, _userdata: *mut std::ffi::c_void) {}

    fn info_for(table: &RegistryTable) -> RawModuleInfo {
        RawModuleInfo {
            vars_begin: table.begin(),
            vars_end: table.end(),
            lifecycle: noop,
        }
    }

    #[test]
    fn frozen_table_exposes_registered_vars() {
        static FIRST: Preserved<u32> = Preserved::new(1);
        static SECOND: Preserved<u64> = Preserved::new(2);

        let mut registry = VarRegistry::new();
        registry.register(FIRST.slot("FIRST"));
        registry.register(SECOND.slot("SECOND"));
        assert_eq!(registry.len(), 2);

        let table = registry.freeze();
        let info = info_for(&table);

        let names: Vec<&[u8]> = unsafe { info.vars() }
            .map(|var| unsafe { var.name_bytes() })
            .collect();
        assert_eq!(names, [b"FIRST".as_slice(), b"SECOND".as_slice()]);
    }

    #[test]
    fn placeholders_are_null_and_skipped() {
        static VAR: Preserved<u16> = Preserved::new(3);

        let mut registry = VarRegistry::new();
        registry.register_placeholder();
        registry.register(VAR.slot("VAR"));
        registry.register_placeholder();

        let table = registry.freeze();

        // Raw range keeps the placeholder slots...
        let raw_len = unsafe { table.end().offset_from(table.begin()) };
        assert_eq!(raw_len, 3);
        assert!(unsafe { (*table.begin()).is_null() });

        // ...but the walk only yields real descriptors.
        let info = info_for(&table);
        assert_eq!(unsafe { info.vars() }.count(), 1);
    }

    #[test]
    fn empty_registry_freezes_to_empty_range() {
        let table = VarRegistry::new().freeze();
        assert_eq!(table.begin(), table.end());
        let info = info_for(&table);
        assert_eq!(unsafe { info.vars() }.count(), 0);
    }
}

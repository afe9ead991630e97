//! Host-side loading, reloading and unloading of plugin images.

use std::ffi::c_void;
use std::path::{Path, PathBuf};

use libloading::Library;
use tracing::{debug, info};

use replug_abi::{LifecycleOp, MODULE_INFO_SYMBOL, ModuleInfoFn, RawModuleInfo};

use crate::snapshot::VarSnapshot;

/// A native plugin module owned by the host.
///
/// `load`, `reload` and `unload` must be serialized by the caller; the
/// module holds no locks, and every step (lifecycle callbacks included)
/// runs to completion on the calling thread before the next step begins.
pub struct Module {
    path: PathBuf,
    userdata: *mut c_void,
    info: RawModuleInfo,
    /// `None` only inside the reload window, between closing the old image
    /// and resolving the replacement's descriptor.
    lib: Option<Library>,
}

impl Module {
    /// Opens the image at `path` and delivers [`LifecycleOp::Load`].
    ///
    /// `userdata` is opaque to the core: it is forwarded to every lifecycle
    /// callback and never dereferenced by the host. It must stay valid for
    /// the lifetime of the module.
    ///
    /// # Panics
    /// If the image cannot be opened or does not export
    /// `_replug_module_info`. Both are deployment defects with no supported
    /// recovery; the process is expected to terminate.
    pub fn load<P: AsRef<Path>>(path: P, userdata: *mut c_void) -> Self {
        let path = path.as_ref().to_path_buf();
        info!(path = %path.display(), "loading plugin module");

        let lib = open_image(&path);
        let info = resolve_info(&lib, &path);
        unsafe { (info.lifecycle)(LifecycleOp::Load, userdata) };

        Self {
            path,
            userdata,
            info,
            lib: Some(lib),
        }
    }

    /// Swaps the underlying image for whatever currently lives at the
    /// module's path, transplanting every preserved variable whose name and
    /// size are unchanged. Variables that were added, removed or resized
    /// across the swap keep their own static initialization.
    ///
    /// Delivers exactly [`LifecycleOp::BeforeReload`] on the old descriptor,
    /// then [`LifecycleOp::AfterReload`] on the new one.
    ///
    /// # Panics
    /// If the replacement image cannot be opened or resolved. The old image
    /// is already closed at that point, so the module is unusable and the
    /// process is expected to terminate.
    pub fn reload(&mut self) {
        info!(path = %self.path.display(), "reloading plugin module");

        unsafe { (self.info.lifecycle)(LifecycleOp::BeforeReload, self.userdata) };
        let snapshot = unsafe { VarSnapshot::capture(&self.info) };

        // The old image must be fully closed before the replacement opens,
        // or the platform loader may hand back the resident copy instead of
        // reading the new on-disk bytes.
        drop(self.lib.take());

        let lib = open_image(&self.path);
        self.info = resolve_info(&lib, &self.path);
        self.lib = Some(lib);

        unsafe { snapshot.restore(&self.info) };
        drop(snapshot);

        unsafe { (self.info.lifecycle)(LifecycleOp::AfterReload, self.userdata) };
    }

    /// Path the image was loaded from, reused verbatim by every reload.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The opaque context pointer forwarded to lifecycle callbacks.
    pub fn userdata(&self) -> *mut c_void {
        self.userdata
    }

    /// Names of the registered variables, in registry order.
    pub fn var_names(&self) -> Vec<String> {
        unsafe { self.info.vars() }
            .map(|var| String::from_utf8_lossy(unsafe { var.name_bytes() }).into_owned())
            .collect()
    }

    /// Current bytes of the registered variable `name`, if present.
    pub fn var_bytes(&self, name: &str) -> Option<Vec<u8>> {
        unsafe { self.info.vars() }
            .find(|var| unsafe { var.name_bytes() } == name.as_bytes())
            .map(|var| unsafe { var.value_bytes() }.to_vec())
    }

    /// Delivers [`LifecycleOp::Unload`] and closes the image. Dropping the
    /// module does the same; this form just names the transition.
    pub fn unload(mut self) {
        self.close();
    }

    fn close(&mut self) {
        if let Some(lib) = self.lib.take() {
            debug!(path = %self.path.display(), "unloading plugin module");
            unsafe { (self.info.lifecycle)(LifecycleOp::Unload, self.userdata) };
            drop(lib);
        }
    }
}

impl Drop for Module {
    fn drop(&mut self) {
        self.close();
    }
}

fn open_image(path: &Path) -> Library {
    match unsafe { Library::new(path) } {
        Ok(lib) => lib,
        Err(err) => panic!("cannot open plugin image {}: {err}", path.display()),
    }
}

fn resolve_info(lib: &Library, path: &Path) -> RawModuleInfo {
    let entry: libloading::Symbol<'_, ModuleInfoFn> = match unsafe { lib.get(MODULE_INFO_SYMBOL) } {
        Ok(entry) => entry,
        Err(err) => panic!(
            "plugin image {} does not export {}: {err}",
            path.display(),
            String::from_utf8_lossy(MODULE_INFO_SYMBOL),
        ),
    };
    unsafe { entry() }
}

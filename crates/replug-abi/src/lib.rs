//! ABI shared between a replug host and its plugin images.
//!
//! A plugin image declares the globals it wants to survive reloads as
//! [`Preserved`] statics and exports the single entry point with
//! [`declare_module!`]. The host resolves that symbol after every open and
//! receives a [`RawModuleInfo`]: the image's variable registry range plus
//! its lifecycle callback. Nothing else crosses the host/plugin boundary.

mod info;
mod registry;
mod slot;

pub use info::{
    LifecycleFn, LifecycleOp, MODULE_INFO_SYMBOL, ModuleInfoFn, RawModuleInfo, VarInfo,
};
pub use registry::{RegistryTable, VarRegistry};
pub use slot::Preserved;

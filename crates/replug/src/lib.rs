//! Hot-reload for native plugin modules with state transplant.
//!
//! A [`Module`] owns one plugin image loaded from a shared library. On
//! [`Module::reload`] the host snapshots every variable the image
//! registered for preservation, swaps the underlying image for the current
//! on-disk bytes at the same path, and restores each variable whose name
//! and size are unchanged. Everything else keeps its own static
//! initialization.
//!
//! Plugin images declare preserved globals with [`Preserved`] and export
//! their single entry point with [`replug_abi::declare_module!`]:
//!
//! ```ignore
//! use std::ffi::c_void;
//! use replug_abi::{LifecycleOp, Preserved};
//!
//! static COUNTER: Preserved<u32> = Preserved::new(0);
//!
//! fn lifecycle(op: LifecycleOp, _userdata: *mut c_void) {
//!     let _ = op;
//! }
//!
//! replug_abi::declare_module! {
//!     lifecycle: lifecycle,
//!     preserve: [COUNTER],
//! }
//! ```
//!
//! The host side is three calls:
//!
//! ```ignore
//! let mut module = replug::Module::load("plugins/libgame.so", userdata);
//! // ... later, after new bytes landed at the same path:
//! module.reload();
//! // ... eventually:
//! module.unload();
//! ```
//!
//! When to call [`Module::reload`] is the caller's business: the core is
//! purely reactive and never watches the filesystem.

mod loader;
mod snapshot;

pub use loader::Module;
pub use replug_abi::{
    LifecycleOp, MODULE_INFO_SYMBOL, Preserved, RawModuleInfo, RegistryTable, VarInfo, VarRegistry,
};

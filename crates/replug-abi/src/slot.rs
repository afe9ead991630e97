//! Preserved variable slots.

use std::cell::UnsafeCell;
use std::ffi::c_void;

use crate::VarInfo;

/// A global whose value survives module reloads.
///
/// The slot is a named, fixed-length cell: the reload protocol reads and
/// writes it as raw bytes through its [`VarInfo`] descriptor. `T` must be
/// plain old data (`Copy`); the transplant is a byte copy, so no
/// constructors or destructors ever run on the restored value.
///
/// ```
/// use replug_abi::Preserved;
///
/// static COUNTER: Preserved<u32> = Preserved::new(7);
///
/// COUNTER.set(COUNTER.get() + 1);
/// assert_eq!(COUNTER.get(), 8);
/// ```
pub struct Preserved<T: Copy> {
    value: UnsafeCell<T>,
}

// load/reload/unload and all plugin calls are serialized by the host
// contract; the cell is never accessed from two threads at once.
unsafe impl<T: Copy> Sync for Preserved<T> {}

impl<T: Copy> Preserved<T> {
    /// Creates a slot with its default-initialized value.
    pub const fn new(value: T) -> Self {
        Self {
            value: UnsafeCell::new(value),
        }
    }

    /// Current value of the slot.
    pub fn get(&self) -> T {
        unsafe { *self.value.get() }
    }

    /// Overwrites the slot.
    pub fn set(&self, value: T) {
        unsafe { *self.value.get() = value }
    }

    /// Updates the slot in place.
    pub fn update(&self, f: impl FnOnce(T) -> T) {
        self.set(f(self.get()));
    }

    /// Descriptor registering this slot under `name`.
    ///
    /// Duplicate names are legal; the reload protocol restores the first
    /// match in registration order.
    pub fn slot(&'static self, name: &'static str) -> VarInfo {
        VarInfo {
            name: name.as_ptr(),
            name_len: name.len(),
            value: self.value.get().cast::<c_void>(),
            value_size: size_of::<T>(),
        }
    }
}

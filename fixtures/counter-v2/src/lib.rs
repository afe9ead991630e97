//! Second generation of the counter fixture.
//!
//! Keeps `COUNTER` at the same name and size (default 0, so a successful
//! transplant is observable), drops `DROPPED`, widens `WIDENED` to 8 bytes,
//! introduces `ADDED`, and reserves a placeholder registry slot.

use std::ffi::c_void;

use replug_abi::{LifecycleOp, Preserved};
use replug_probe::HostProbe;

static COUNTER: Preserved<u32> = Preserved::new(0);
static ADDED: Preserved<u32> = Preserved::new(42);
static WIDENED: Preserved<u64> = Preserved::new(5);

fn lifecycle(op: LifecycleOp, userdata: *mut c_void) {
    if userdata.is_null() {
        return;
    }
    let probe = unsafe { &mut *userdata.cast::<HostProbe>() };
    probe.log(op);
    probe.counter = COUNTER.get().into();
    probe.added = ADDED.get().into();
    probe.widened = WIDENED.get();
}

replug_abi::declare_module! {
    lifecycle: lifecycle,
    preserve: [COUNTER, _, ADDED, WIDENED],
}

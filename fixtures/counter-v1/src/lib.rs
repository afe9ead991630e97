//! First generation of the counter fixture.
//!
//! Preserves a 4-byte `COUNTER` (default 7), a `DROPPED` variable that the
//! second generation no longer carries, a 4-byte `WIDENED` that the second
//! generation widens to 8 bytes, and a `TICKS` count bumped on every
//! lifecycle call so a transplant onto identical bytes stays observable.

use std::ffi::c_void;

use replug_abi::{LifecycleOp, Preserved};
use replug_probe::HostProbe;

static COUNTER: Preserved<u32> = Preserved::new(7);
static DROPPED: Preserved<u32> = Preserved::new(11);
static WIDENED: Preserved<u32> = Preserved::new(1);
static TICKS: Preserved<u64> = Preserved::new(0);

fn lifecycle(op: LifecycleOp, userdata: *mut c_void) {
    TICKS.update(|t| t + 1);
    if userdata.is_null() {
        return;
    }
    let probe = unsafe { &mut *userdata.cast::<HostProbe>() };
    probe.log(op);
    probe.counter = COUNTER.get().into();
    probe.dropped = DROPPED.get().into();
    probe.widened = WIDENED.get().into();
    probe.ticks = TICKS.get();
}

replug_abi::declare_module! {
    lifecycle: lifecycle,
    preserve: [COUNTER, DROPPED, WIDENED, TICKS],
}

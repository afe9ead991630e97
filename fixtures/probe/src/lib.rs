//! Host-owned probe record the fixture images fill from their lifecycle
//! callbacks. The host reads it to observe what the plugin saw.

use replug_abi::LifecycleOp;

pub const OP_LOG_CAPACITY: usize = 16;

/// One record per loaded fixture, allocated by the host and handed to the
/// image as its opaque userdata.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct HostProbe {
    /// Deliveries per lifecycle operation, indexed by `op as usize`.
    pub op_counts: [u32; 4],
    /// Order the operations arrived in.
    pub op_log: [u32; OP_LOG_CAPACITY],
    pub op_log_len: usize,
    /// Variable values the image observed at its most recent callback.
    pub counter: u64,
    pub dropped: u64,
    pub widened: u64,
    pub added: u64,
    pub ticks: u64,
}

impl HostProbe {
    pub const fn new() -> Self {
        Self {
            op_counts: [0; 4],
            op_log: [0; OP_LOG_CAPACITY],
            op_log_len: 0,
            counter: 0,
            dropped: 0,
            widened: 0,
            added: 0,
            ticks: 0,
        }
    }

    /// Records one lifecycle delivery.
    pub fn log(&mut self, op: LifecycleOp) {
        self.op_counts[op as usize] += 1;
        if self.op_log_len < OP_LOG_CAPACITY {
            self.op_log[self.op_log_len] = op as u32;
            self.op_log_len += 1;
        }
    }

    /// The operations delivered so far, in order.
    pub fn ops(&self) -> &[u32] {
        &self.op_log[..self.op_log_len]
    }
}

impl Default for HostProbe {
    fn default() -> Self {
        Self::new()
    }
}

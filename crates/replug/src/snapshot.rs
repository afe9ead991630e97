//! Transient variable snapshots taken across an image swap.
//!
//! A snapshot exists only inside one `reload()` call: captured just before
//! the old image closes, drained into the new image's registry right after
//! it opens, then dropped.

use tracing::debug;

use replug_abi::RawModuleInfo;

/// Offsets of one captured variable inside the snapshot payload.
struct SnapshotEntry {
    name_off: usize,
    name_len: usize,
    value_off: usize,
    value_size: usize,
}

/// Captured copy of every preserved variable of an image.
pub(crate) struct VarSnapshot {
    /// Concatenated (name bytes, value bytes) per captured variable.
    /// Sized exactly once, before any copying; never resized.
    payload: Vec<u8>,
    entries: Vec<SnapshotEntry>,
}

impl VarSnapshot {
    /// Copies name and value bytes of every non-placeholder registry entry.
    ///
    /// # Safety
    /// `info` must describe a currently open image.
    pub(crate) unsafe fn capture(info: &RawModuleInfo) -> Self {
        let mut count = 0usize;
        let mut payload_len = 0usize;
        for var in unsafe { info.vars() } {
            count += 1;
            payload_len += var.name_len + var.value_size;
        }

        let mut payload = Vec::with_capacity(payload_len);
        let mut entries = Vec::with_capacity(count);
        for var in unsafe { info.vars() } {
            let name_off = payload.len();
            payload.extend_from_slice(unsafe { var.name_bytes() });
            let value_off = payload.len();
            payload.extend_from_slice(unsafe { var.value_bytes() });
            entries.push(SnapshotEntry {
                name_off,
                name_len: var.name_len,
                value_off,
                value_size: var.value_size,
            });
        }
        debug_assert_eq!(payload.len(), payload_len);

        debug!(vars = count, bytes = payload_len, "captured variable snapshot");
        Self { payload, entries }
    }

    /// Writes captured values back into every matching entry of a freshly
    /// resolved registry.
    ///
    /// A variable matches when its name bytes and size are both identical;
    /// the first matching snapshot entry wins. Unmatched variables keep
    /// whatever their own static initialization produced, which is the
    /// expected steady state after a source edit, not a failure.
    ///
    /// # Safety
    /// `info` must describe a currently open image.
    pub(crate) unsafe fn restore(&self, info: &RawModuleInfo) {
        for var in unsafe { info.vars() } {
            let name = unsafe { var.name_bytes() };
            let matched = self.entries.iter().find(|entry| {
                entry.value_size == var.value_size
                    && entry.name_len == name.len()
                    && self.name_of(entry) == name
            });
            match matched {
                Some(entry) => unsafe {
                    std::ptr::copy_nonoverlapping(
                        self.payload.as_ptr().add(entry.value_off),
                        var.value.cast::<u8>(),
                        entry.value_size,
                    );
                },
                None => {
                    debug!(
                        name = %String::from_utf8_lossy(name),
                        size = var.value_size,
                        "no snapshot match, variable keeps its default"
                    );
                }
            }
        }
    }

    fn name_of(&self, entry: &SnapshotEntry) -> &[u8] {
        &self.payload[entry.name_off..entry.name_off + entry.name_len]
    }

    pub(crate) fn var_count(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn payload_len(&self) -> usize {
        self.payload.len()
    }
}

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use more_asserts::debug_assert_le;

/// Callback receiving the new upload percentage (0..=100).
pub type PercentCallback = Arc<dyn Fn(u8) + Send + Sync + 'static>;

/// `floor(completed * 100 / total)`, saturating at 100.  An empty transfer counts as done.
pub fn percent_of(completed: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let completed = completed.min(total);
    let percent = (completed as u128 * 100) / total as u128;
    debug_assert_le!(percent, 100);
    percent as u8
}

/// Turns byte-level upload progress into whole-percent updates.
///
/// Only increases are passed on: a repeated or lower percentage (e.g. from a stream that was
/// restarted) is swallowed, so observers see a strictly increasing sequence that never
/// exceeds 100.  Clones share the same high-water mark.
#[derive(Clone)]
pub struct UploadPercentReporter {
    total_bytes: u64,
    last_reported: Arc<AtomicU8>,
    callback: PercentCallback,
}

impl UploadPercentReporter {
    pub fn new(total_bytes: u64, callback: PercentCallback) -> Self {
        Self {
            total_bytes,
            last_reported: Arc::new(AtomicU8::new(0)),
            callback,
        }
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Records that `completed_bytes` bytes have been handed to the transport.
    pub fn report_bytes(&self, completed_bytes: u64) {
        let percent = percent_of(completed_bytes, self.total_bytes);
        let previous = self.last_reported.fetch_max(percent, Ordering::Relaxed);

        if previous < percent {
            (self.callback)(percent);
        }
    }

    /// Marks the whole payload as sent.
    pub fn report_complete(&self) {
        self.report_bytes(self.total_bytes);
    }

    pub fn last_reported(&self) -> u8 {
        self.last_reported.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for UploadPercentReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadPercentReporter")
            .field("total_bytes", &self.total_bytes)
            .field("last_reported", &self.last_reported())
            .finish()
    }
}

/// A point-in-time view of server-side processing of an import job.
///
/// Each progress event from the server replaces the previous snapshot wholesale; no history is
/// kept.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProcessingSnapshot {
    /// Completion in whole percent, 0..=100.
    pub percent: u8,

    /// Free-text status line from the server, e.g. "Processing... 50%".
    pub status: String,

    /// Records processed so far.
    pub current: u64,

    /// Records known to process.
    pub total: u64,
}

impl ProcessingSnapshot {
    /// Builds a snapshot, clamping the percentage into 0..=100.
    pub fn new(percent: u64, status: impl Into<String>, current: u64, total: u64) -> Self {
        Self {
            percent: percent.min(100) as u8,
            status: status.into(),
            current,
            total,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.percent == 100
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_clamps_percent() {
        let s = ProcessingSnapshot::new(250, "processing", 10, 10);
        assert_eq!(s.percent, 100);
        assert!(s.is_complete());

        let s = ProcessingSnapshot::new(50, "processing", 5, 10);
        assert_eq!(s.percent, 50);
        assert!(!s.is_complete());
    }
}

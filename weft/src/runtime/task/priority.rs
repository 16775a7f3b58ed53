/// Scheduling priority of a task.
///
/// Each priority is a FIFO band in the run queue. Workers always drain the
/// highest non-empty band first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Priority {
    /// Background work.
    Low,
    /// The default band.
    #[default]
    Normal,
    /// Latency-sensitive work.
    High,
}

impl Priority {
    /// Number of bands in the run queue.
    pub(crate) const BANDS: usize = 3;

    /// Index of this priority's band, `0` being drained first.
    pub(crate) fn band(self) -> usize {
        match self {
            Self::High => 0,
            Self::Normal => 1,
            Self::Low => 2,
        }
    }
}

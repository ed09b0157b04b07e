//! Progress filtering for export jobs.

/// Highest progress value.
pub const PROGRESS_COMPLETE: u8 = 100;

/// Turns raw service progress into a non-decreasing sequence in `[0, 100]`.
///
/// [`update`](Self::update) returns the value to publish, or `None` when the
/// raw value would not move progress forward. The first update always
/// publishes, so a job that reports `0` emits one event.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    current: Option<u8>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, raw: u8) -> Option<u8> {
        let value = raw.min(PROGRESS_COMPLETE);
        match self.current {
            Some(current) if value <= current => None,
            _ => {
                self.current = Some(value);
                Some(value)
            }
        }
    }

    /// Last published value, `0` before any update.
    pub fn current(&self) -> u8 {
        self.current.unwrap_or(0)
    }
}

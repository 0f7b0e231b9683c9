use core::time::Duration;

/// A countdown driven by the elapsed time reported to [`TimeTracker::update`].
///
/// ```rust
/// use dyntree3d::utils::TimeTracker;
/// use std::time::Duration;
///
/// let mut timer = TimeTracker::new(Duration::from_millis(200));
/// timer.update(Duration::from_millis(150));
/// assert!(!timer.passed());
/// timer.update(Duration::from_millis(150));
/// assert!(timer.passed());
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct TimeTracker {
    expiry: Duration,
}

impl TimeTracker {
    /// A countdown expiring after `expiry`.
    pub fn new(expiry: Duration) -> Self {
        Self { expiry }
    }

    /// Advances the countdown by `diff`.
    #[inline]
    pub fn update(&mut self, diff: Duration) {
        self.expiry = self.expiry.saturating_sub(diff);
    }

    /// Has the countdown expired?
    #[inline]
    pub fn passed(&self) -> bool {
        self.expiry.is_zero()
    }

    /// Restarts the countdown.
    #[inline]
    pub fn reset(&mut self, expiry: Duration) {
        self.expiry = expiry;
    }

    /// The time left before expiry.
    #[inline]
    pub fn expiry(&self) -> Duration {
        self.expiry
    }
}

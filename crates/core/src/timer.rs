//! Countdown reducer for the exam clock.

/// Monotonically decreasing countdown over whole seconds.
///
/// The timer is a pure reducer: the embedder delivers one [`tick`] per
/// elapsed second while the session is active, and stops delivering ticks
/// once the session is submitted or torn down.
///
/// [`tick`]: CountdownTimer::tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownTimer {
    remaining: u32,
    expiry_fired: bool,
}

impl CountdownTimer {
    /// Timer initialized from an exam duration in seconds.
    #[must_use]
    pub fn new(duration_secs: u32) -> Self {
        Self {
            remaining: duration_secs,
            expiry_fired: false,
        }
    }

    /// Remaining whole seconds, clamped at 0.
    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        self.remaining
    }

    /// True once the expiry signal has fired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expiry_fired
    }

    /// Consume one elapsed second.
    ///
    /// Returns `true` exactly once, on the tick that reaches (or first
    /// observes) zero. Later ticks decrement nothing and never re-fire.
    #[must_use]
    pub fn tick(&mut self) -> bool {
        if self.expiry_fired {
            return false;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.expiry_fired = true;
            return true;
        }
        false
    }

    /// Restart the countdown with a fresh duration, clearing any fired
    /// expiry. Used when a new question set is loaded.
    pub fn reset(&mut self, duration_secs: u32) {
        self.remaining = duration_secs;
        self.expiry_fired = false;
    }
}

use std::time::Duration;

/// Cancellable single-shot countdown driven by ticks.
///
/// `tick` reports expiry exactly once; after that, or after `cancel`, the
/// countdown is inert until re-armed with `start`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Countdown {
    remaining: Option<Duration>,
}

impl Countdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, budget: Duration) {
        self.remaining = Some(budget);
    }

    pub fn cancel(&mut self) {
        self.remaining = None;
    }

    pub fn is_armed(&self) -> bool {
        self.remaining.is_some()
    }

    /// Time left, or `None` when not armed
    pub fn remaining(&self) -> Option<Duration> {
        self.remaining
    }

    /// Returns true on the tick that runs the countdown out.
    pub fn tick(&mut self, elapsed: Duration) -> bool {
        match self.remaining {
            Some(left) if elapsed >= left => {
                self.remaining = None;
                true
            }
            Some(left) => {
                self.remaining = Some(left - elapsed);
                false
            }
            None => false,
        }
    }
}

/// `mm:ss`, rounding partial seconds up so the display hits 00:00 on expiry
pub fn format_clock(left: Duration) -> String {
    let secs = left.as_secs() + u64::from(left.subsec_nanos() > 0);
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

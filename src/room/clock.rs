//! Clock backed by the tokio timer.

use tokio::time::Instant;

use crate::core::Clock;

/// Milliseconds elapsed on the tokio clock, offset by `base_ms`.
///
/// Follows tokio's paused time in tests, so room timers and engine deadlines
/// advance together.
#[derive(Clone, Copy, Debug)]
pub struct TokioClock {
    origin: Instant,
    base_ms: u64,
}

impl TokioClock {
    #[must_use]
    pub fn new(base_ms: u64) -> Self {
        Self {
            origin: Instant::now(),
            base_ms,
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Clock for TokioClock {
    fn now_millis(&self) -> u64 {
        self.base_ms + self.origin.elapsed().as_millis() as u64
    }
}

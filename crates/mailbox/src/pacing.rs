//! Pacing helpers for callers that loop over retrievals
//!
//! The batch fetcher never sleeps on its own; callers that need to stay
//! under a request rate insert these delays between their calls.

use std::time::{Duration, Instant};

/// Block the calling thread for `millis` milliseconds
pub fn timer(millis: u64) {
    std::thread::sleep(Duration::from_millis(millis));
}

/// Enforces a minimum interval between consecutive calls to [`Pacer::wait`]
#[derive(Debug)]
pub struct Pacer {
    interval: Duration,
    last: Option<Instant>,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Sleep just long enough that `interval` has passed since the previous wait.
    /// The first call returns immediately.
    pub fn wait(&mut self) {
        if let Some(last) = self.last {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                std::thread::sleep(self.interval - elapsed);
            }
        }
        self.last = Some(Instant::now());
    }
}

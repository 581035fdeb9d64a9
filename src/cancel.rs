use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Cooperative cancellation shared by all workers of an evaluation run. Workers poll the token
/// between test events, it fires either when cancelled explicitly or when its deadline passes.
#[derive(Debug, Default)]
pub struct CancellationToken {
    cancelled: AtomicBool,
    deadline: Option<Instant>,
}

impl CancellationToken {

    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_time_limit(time_limit: Duration) -> Self {
        CancellationToken {
            cancelled: AtomicBool::new(false),
            deadline: Some(Instant::now() + time_limit),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        if self.cancelled.load(Ordering::Relaxed) {
            return true
        }

        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                self.cancel();
                true
            },
            _ => false,
        }
    }
}

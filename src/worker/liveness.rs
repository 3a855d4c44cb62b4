// Mon Jul 20 2026 - Alex

use std::time::{Duration, Instant};

/// Wall-clock guard a worker uses to notice it has stopped making forward
/// progress. Soft detection only: the worker that trips it exits on its
/// own, nothing is done to rescue peers or break lock state.
pub struct LivenessGuard {
    last_progress: Instant,
    timeout: Duration,
}

impl LivenessGuard {
    pub fn new(timeout: Duration) -> Self {
        Self {
            last_progress: Instant::now(),
            timeout,
        }
    }

    pub fn touch(&mut self) {
        self.last_progress = Instant::now();
    }

    pub fn idle_time(&self) -> Duration {
        self.last_progress.elapsed()
    }

    pub fn stalled(&self) -> bool {
        self.idle_time() > self.timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_guard_is_live() {
        let guard = LivenessGuard::new(Duration::from_secs(10));
        assert!(!guard.stalled());
    }

    #[test]
    fn test_stalls_after_timeout() {
        let guard = LivenessGuard::new(Duration::from_millis(20));
        std::thread::sleep(Duration::from_millis(40));
        assert!(guard.stalled());
    }

    #[test]
    fn test_touch_resets_idle_time() {
        let mut guard = LivenessGuard::new(Duration::from_millis(50));
        std::thread::sleep(Duration::from_millis(30));
        guard.touch();
        assert!(guard.idle_time() < Duration::from_millis(30));
        assert!(!guard.stalled());
    }
}

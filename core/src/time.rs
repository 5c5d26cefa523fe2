use std::time::{Duration, Instant};

/// Times a named operation and warns on drop when it took longer than `TR` milliseconds
pub struct Stopwatch<const TR: u64 = 1000> {
    name: &'static str,
    start: Instant,
}

impl<const TR: u64> Stopwatch<TR> {
    pub fn with_threshold(name: &'static str) -> Self {
        Self { name, start: Instant::now() }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl<const TR: u64> Drop for Stopwatch<TR> {
    fn drop(&mut self) {
        let elapsed = self.elapsed();
        if elapsed > Duration::from_millis(TR) {
            crate::warn!("[{}] abnormal time: {:?} (threshold {}ms)", self.name, elapsed, TR);
        }
    }
}

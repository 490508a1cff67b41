//! A background thread that triggers a fixed interrupt number on a fixed period. Grounded
//! in the source machine's timer device: a short-sleep poll loop checking a monotonic
//! clock, rather than a platform timer API, so shutdown is a simple flag instead of a
//! signal.

use emu_pic::Pic;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_micros(100);

/// Owns the background thread; dropping it (or calling `stop`) joins the thread.
pub struct Timer {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Timer {
    pub fn start(pic: Arc<Pic>, period: Duration, interrupt: u8) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let thread_running = running.clone();
        let handle = thread::Builder::new()
            .name("emu-timer".into())
            .spawn(move || run_loop(&pic, period, interrupt, &thread_running))
            .expect("failed to spawn timer thread");

        Self {
            running,
            handle: Some(handle),
        }
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            handle.join().expect("timer thread panicked");
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_loop(pic: &Pic, period: Duration, interrupt: u8, running: &AtomicBool) {
    let mut last = Instant::now();
    while running.load(Ordering::Relaxed) {
        thread::sleep(POLL_INTERVAL);
        let now = Instant::now();
        if now.duration_since(last) > period {
            pic.trigger(interrupt);
            debug!(interrupt, "timer: fired");
            last = now;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_at_least_once_within_a_few_periods() {
        let pic = Pic::new();
        let mut timer = Timer::start(pic.clone(), Duration::from_millis(2), 0);
        thread::sleep(Duration::from_millis(40));
        timer.stop();
        assert!(pic.any_deliverable());
    }

    #[test]
    fn stop_joins_the_thread_cleanly() {
        let pic = Pic::new();
        let mut timer = Timer::start(pic, Duration::from_secs(60), 0);
        timer.stop();
        assert!(timer.handle.is_none());
    }
}

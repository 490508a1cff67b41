use std::sync::{Arc, Condvar, Mutex};

/// A per-subscriber wake endpoint. `notify` bumps a generation counter and wakes every
/// waiter; waiters compare against the generation they last observed. Signals are
/// level-independent — any number of writes between two `wait` calls coalesce into one
/// wake-up, so callers must re-read whatever state they care about after waking rather
/// than assuming exactly one write happened.
pub struct WakeChannel {
    generation: Mutex<u64>,
    condvar: Condvar,
}

impl WakeChannel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            generation: Mutex::new(0),
            condvar: Condvar::new(),
        })
    }

    pub fn notify(&self) {
        let mut generation = self.generation.lock().expect("wake channel mutex poisoned");
        *generation = generation.wrapping_add(1);
        self.condvar.notify_all();
    }

    pub fn current(&self) -> u64 {
        *self.generation.lock().expect("wake channel mutex poisoned")
    }

    /// Blocks until the generation counter differs from `last_seen`, returning the new value.
    pub fn wait(&self, last_seen: u64) -> u64 {
        let mut generation = self.generation.lock().expect("wake channel mutex poisoned");
        while *generation == last_seen {
            generation = self.condvar.wait(generation).expect("wake channel mutex poisoned");
        }
        *generation
    }
}

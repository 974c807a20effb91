use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::spawn::Job;

/// `executed` is bumped by the workers, `tried` only ever by the driver thread.
#[derive(Debug, Default)]
pub struct Counters {
    executed: Arc<AtomicUsize>,
    tried: usize,
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn executed(&self) -> usize {
        self.executed.load(Ordering::Relaxed)
    }

    pub fn tried(&self) -> usize {
        self.tried
    }

    pub fn record_attempt(&mut self) {
        self.tried += 1;
    }

    /// A fresh worker body bound to this run's `executed` counter.
    pub fn job(&self) -> Job {
        let executed = Arc::clone(&self.executed);
        Box::new(move || worker(&executed))
    }
}

pub fn worker(executed: &AtomicUsize) {
    executed.fetch_add(1, Ordering::Relaxed);
}

use std::io;
use std::thread::{self, JoinHandle};

use nix::errno::Errno;

use crate::config::Config;
use crate::counters::Counters;
use crate::error::StressError;

pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Source of worker threads. The harness only ever goes through this, so the creation path can be
/// starved on purpose.
pub trait Spawner {
    fn spawn(&mut self, job: Job) -> io::Result<JoinHandle<()>>;
}

/// Plain OS threads via `std::thread::Builder`.
#[derive(Clone, Debug)]
pub struct OsSpawner {
    stack_size: usize,
}

impl Default for OsSpawner {
    fn default() -> Self {
        // Workers only bump a counter.
        Self { stack_size: 64 * 1024 }
    }
}

impl Spawner for OsSpawner {
    fn spawn(&mut self, job: Job) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("stress-worker".into())
            .stack_size(self.stack_size)
            .spawn(job)
    }
}

/// Only EAGAIN means "try again"; everything else, including errors without an errno, is fatal.
pub fn is_retryable(err: &io::Error) -> bool {
    err.raw_os_error().map(Errno::from_raw) == Some(Errno::EAGAIN)
}

/// Fills `slot` with a running worker, making at most `config.retries` creation attempts.
pub fn spawn_with_retry(
    spawner: &mut impl Spawner,
    counters: &mut Counters,
    config: &Config,
    index: usize,
    slot: &mut Option<JoinHandle<()>>,
) -> Result<(), StressError> {
    debug_assert!(slot.is_none(), "slot {index} still holds an unjoined thread");

    for attempt in 1..=config.retries {
        counters.record_attempt();
        match spawner.spawn(counters.job()) {
            Ok(handle) => {
                *slot = Some(handle);
                return Ok(());
            }
            Err(err) if is_retryable(&err) => thread::sleep(config.retry_delay),
            Err(source) => {
                return Err(StressError::SpawnFailed {
                    slot: index,
                    attempt,
                    source,
                })
            }
        }
    }

    Err(StressError::RetriesExhausted {
        slot: index,
        attempts: config.retries,
    })
}

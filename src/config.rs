use std::time::Duration;

pub const NUM_ITER: usize = 200_000;
pub const NUM_RETRY: usize = 5;
pub const MAX_NUM_THREADS: usize = 8;

/// Parameters of one stress run. The slot count is a const parameter of the harness instead.
#[derive(Clone, Debug)]
pub struct Config {
    pub iterations: usize,
    /// Creation attempts per spawn, including the first one.
    pub retries: usize,
    pub retry_delay: Duration,
    /// Sleep before every spawn.
    pub throttle: Duration,
    /// Exclusive upper bound on `threads_creation_tried / threads_executed`.
    pub max_retry_ratio: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            iterations: NUM_ITER,
            retries: NUM_RETRY,
            retry_delay: Duration::from_millis(1),
            throttle: Duration::from_millis(1),
            max_retry_ratio: 2.5,
        }
    }
}

impl Config {
    /// Same bounds, no sleeping, `iterations` rounds.
    #[cfg(test)]
    pub fn quick(iterations: usize) -> Self {
        Self {
            iterations,
            retry_delay: Duration::ZERO,
            throttle: Duration::ZERO,
            ..Self::default()
        }
    }
}

use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StressError {
    #[error("thread creation for slot {slot} failed on attempt {attempt}: {source}")]
    SpawnFailed {
        slot: usize,
        attempt: usize,
        #[source]
        source: io::Error,
    },

    #[error("thread creation for slot {slot} still unavailable after {attempts} attempts")]
    RetriesExhausted { slot: usize, attempts: usize },

    #[error("joining the thread in slot {slot} failed")]
    JoinFailed { slot: usize },

    #[error("slot {slot} holds no thread after a successful spawn")]
    MissingHandle { slot: usize },

    #[error("test executed more threads ({executed}) than were created ({tried})")]
    ExecutedExceedsTried { executed: usize, tried: usize },

    #[error("retry ratio {ratio} is not below {limit}")]
    RetryRatio { ratio: f64, limit: f64 },

    #[error("writing diagnostics failed: {0}")]
    Diagnostic(#[from] io::Error),
}

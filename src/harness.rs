use std::fmt;
use std::io::{self, Write};
use std::thread::{self, JoinHandle};

use anyhow::Context;

use crate::config::{Config, MAX_NUM_THREADS};
use crate::counters::Counters;
use crate::error::StressError;
use crate::progress::Progress;
use crate::spawn::{spawn_with_retry, OsSpawner, Spawner};

/// Final counters of a completed run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Report {
    pub executed: usize,
    pub tried: usize,
}

impl Report {
    /// Undefined when nothing ran.
    pub fn ratio(&self) -> Option<f64> {
        if self.executed == 0 {
            None
        } else {
            Some(self.tried as f64 / self.executed as f64)
        }
    }

    pub fn validate(&self, max_ratio: f64) -> Result<(), StressError> {
        if self.tried < self.executed {
            return Err(StressError::ExecutedExceedsTried {
                executed: self.executed,
                tried: self.tried,
            });
        }
        match self.ratio() {
            Some(ratio) if ratio >= max_ratio => Err(StressError::RetryRatio {
                ratio,
                limit: max_ratio,
            }),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Spawning stress test finished successfully executed {} threads ({} creation attempts) with retry ratio ",
            self.executed, self.tried
        )?;
        match self.ratio() {
            Some(ratio) => write!(f, "{ratio:.6}"),
            None => f.write_str("n/a"),
        }
    }
}

/// Rotates spawns through `SLOTS` thread handles, joining each occupant before reusing its slot.
pub struct Harness<const SLOTS: usize, W> {
    config: Config,
    counters: Counters,
    slots: [Option<JoinHandle<()>>; SLOTS],
    out: W,
}

impl<const SLOTS: usize, W: Write> Harness<SLOTS, W> {
    pub fn new(config: Config, out: W) -> Self {
        assert!(SLOTS > 0, "need at least one slot");
        Self {
            config,
            counters: Counters::new(),
            slots: std::array::from_fn(|_| None),
            out,
        }
    }

    pub fn run(mut self, spawner: &mut impl Spawner) -> Result<Report, StressError> {
        let mut progress = Progress::new(self.config.iterations);

        for iter in 0..self.config.iterations {
            if let Some(pct) = progress.advance(iter) {
                writeln!(self.out, "Spawning stress test is {pct}% finished")?;
            }

            let index = iter % SLOTS;
            self.join_slot(index)?;

            thread::sleep(self.config.throttle);
            spawn_with_retry(
                spawner,
                &mut self.counters,
                &self.config,
                index,
                &mut self.slots[index],
            )?;
            if self.slots[index].is_none() {
                return Err(StressError::MissingHandle { slot: index });
            }
        }

        for index in 0..SLOTS {
            self.join_slot(index)?;
        }

        let report = Report {
            executed: self.counters.executed(),
            tried: self.counters.tried(),
        };
        report.validate(self.config.max_retry_ratio)?;

        writeln!(self.out, "{report}")?;
        Ok(report)
    }

    fn join_slot(&mut self, index: usize) -> Result<(), StressError> {
        if let Some(handle) = self.slots[index].take() {
            handle
                .join()
                .map_err(|_| StressError::JoinFailed { slot: index })?;
        }
        Ok(())
    }
}

/// The full run: 200k spawns over 8 slots, diagnostics on stderr.
pub fn thread_creation() -> anyhow::Result<()> {
    Harness::<MAX_NUM_THREADS, _>::new(Config::default(), io::stderr())
        .run(&mut OsSpawner::default())
        .context("thread creation stress test failed")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spawn::testing::{PanickingSpawner, ScriptedSpawner};

    fn lines(out: &[u8]) -> Vec<String> {
        String::from_utf8_lossy(out).lines().map(str::to_owned).collect()
    }

    #[test]
    fn nominal_run() {
        let mut out = Vec::new();
        let report = Harness::<8, _>::new(Config::quick(200), &mut out)
            .run(&mut OsSpawner::default())
            .unwrap();

        assert_eq!(report, Report { executed: 200, tried: 200 });
        assert_eq!(report.ratio(), Some(1.0));

        let lines = lines(&out);
        assert_eq!(lines.len(), 10);
        assert_eq!(lines[0], "Spawning stress test is 10% finished");
        assert_eq!(lines[8], "Spawning stress test is 90% finished");
        assert_eq!(
            lines[9],
            "Spawning stress test finished successfully executed 200 threads (200 creation attempts) with retry ratio 1.000000"
        );
    }

    #[test]
    fn single_slot() {
        let report = Harness::<1, _>::new(Config::quick(20), io::sink())
            .run(&mut OsSpawner::default())
            .unwrap();
        assert_eq!(report, Report { executed: 20, tried: 20 });
    }

    #[test]
    fn zero_iterations() {
        let mut out = Vec::new();
        let report = Harness::<8, _>::new(Config::quick(0), &mut out)
            .run(&mut OsSpawner::default())
            .unwrap();

        assert_eq!(report, Report { executed: 0, tried: 0 });
        assert_eq!(report.ratio(), None);
        assert_eq!(
            lines(&out),
            ["Spawning stress test finished successfully executed 0 threads (0 creation attempts) with retry ratio n/a"]
        );
    }

    #[test]
    fn recovers_from_transient_exhaustion() {
        let mut spawner = ScriptedSpawner::eagain(4);
        let report = Harness::<8, _>::new(Config::quick(8), io::sink())
            .run(&mut spawner)
            .unwrap();

        assert_eq!(report, Report { executed: 8, tried: 12 });
        assert_eq!(spawner.calls, 12);
    }

    #[test]
    fn aborts_when_exhaustion_persists() {
        let mut spawner = ScriptedSpawner::new(
            [None, None]
                .into_iter()
                .chain(std::iter::repeat(Some(libc::EAGAIN)).take(5)),
        );
        let err = Harness::<8, _>::new(Config::quick(8), io::sink())
            .run(&mut spawner)
            .unwrap_err();

        assert!(matches!(err, StressError::RetriesExhausted { slot: 2, attempts: 5 }));
        assert_eq!(spawner.calls, 7);
    }

    #[test]
    fn fatal_creation_error() {
        let mut spawner = ScriptedSpawner::new([Some(libc::EINVAL)]);
        let err = Harness::<8, _>::new(Config::quick(8), io::sink())
            .run(&mut spawner)
            .unwrap_err();

        assert!(matches!(err, StressError::SpawnFailed { slot: 0, attempt: 1, .. }));
    }

    #[test]
    fn join_failure_on_reuse() {
        let err = Harness::<2, _>::new(Config::quick(3), io::sink())
            .run(&mut PanickingSpawner)
            .unwrap_err();
        assert!(matches!(err, StressError::JoinFailed { slot: 0 }));
    }

    #[test]
    fn join_failure_on_drain() {
        let err = Harness::<8, _>::new(Config::quick(1), io::sink())
            .run(&mut PanickingSpawner)
            .unwrap_err();
        assert!(matches!(err, StressError::JoinFailed { slot: 0 }));
    }

    #[test]
    fn retry_ratio_bound() {
        // Two spawns, each succeeding on the fifth attempt.
        let mut script = Vec::new();
        for _ in 0..2 {
            script.extend([Some(libc::EAGAIN); 4]);
            script.push(None);
        }
        let mut spawner = ScriptedSpawner::new(script);
        let err = Harness::<8, _>::new(Config::quick(2), io::sink())
            .run(&mut spawner)
            .unwrap_err();

        match err {
            StressError::RetryRatio { ratio, limit } => {
                assert_eq!(ratio, 5.0);
                assert_eq!(limit, 2.5);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn validation() {
        assert!(matches!(
            Report { executed: 3, tried: 2 }.validate(2.5),
            Err(StressError::ExecutedExceedsTried { executed: 3, tried: 2 })
        ));
        assert!(matches!(
            Report { executed: 2, tried: 5 }.validate(2.5),
            Err(StressError::RetryRatio { .. })
        ));
        assert!(Report { executed: 2, tried: 4 }.validate(2.5).is_ok());
        assert!(Report { executed: 0, tried: 0 }.validate(2.5).is_ok());
    }
}

/// Tracks which tenth of the run was last reported.
#[derive(Debug)]
pub struct Progress {
    total: usize,
    reported: usize,
}

impl Progress {
    pub fn new(total: usize) -> Self {
        Self { total, reported: 0 }
    }

    /// Percentage to report when `iter` has entered a decile not reported yet.
    pub fn advance(&mut self, iter: usize) -> Option<usize> {
        if self.total == 0 {
            return None;
        }
        let decile = iter.saturating_mul(10) / self.total;
        if decile > self.reported {
            self.reported = decile;
            Some(decile * 10)
        } else {
            None
        }
    }
}

/// Running mean of every nonzero slot size measured so far.
///
/// The average projects sizes for the part of the list that has never been
/// rendered, which is what the estimated content height and random scroll
/// jumps are computed from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct SizeEstimator {
    average: u32,
    measured_count: u64,
}

impl SizeEstimator {
    pub(crate) fn average(&self) -> u32 {
        self.average
    }

    pub(crate) fn measured_count(&self) -> u64 {
        self.measured_count
    }

    /// Folds a batch of new measurements into the average.
    ///
    /// `sum` is the total of the batch and `nonzero` the number of measurements in it that were
    /// larger than zero; zero-sized (hidden/unrendered) slots never move the average.
    pub(crate) fn fold(&mut self, sum: u64, nonzero: u64) {
        if nonzero == 0 {
            return;
        }
        let prev = self.average as u128 * self.measured_count as u128;
        let count = self.measured_count.saturating_add(nonzero);
        let total = prev.saturating_add(sum as u128);
        let rounded = (total * 2 + count as u128) / (count as u128 * 2);
        self.average = rounded.min(u32::MAX as u128) as u32;
        self.measured_count = count;
    }

    pub(crate) fn reset(&mut self) {
        self.average = 0;
        self.measured_count = 0;
    }
}

/// `Math.round(a / b)` for integers (ties round toward positive infinity).
pub(crate) fn div_round(a: i64, b: i64) -> i64 {
    debug_assert!(b > 0);
    (a.saturating_mul(2).saturating_add(b)).div_euclid(b.saturating_mul(2))
}

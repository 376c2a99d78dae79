use core::fmt;
use std::num::NonZeroUsize;

use num_traits::Float;

use crate::{Error, Kbn, Window};

/// One validated input row: the step echoed in the output and the value fed to the window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation<T = f64> {
    /// Step column value, truncated to an integer.
    pub step: i64,
    /// Value column value.
    pub value: T,
}

/// Statistics of a full window, tagged with the step of the newest observation.
///
/// Displays as `<step> <mean> <stddev>` with five decimals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Record<T = f64> {
    /// Step of the observation that completed this window.
    pub step: i64,
    /// Arithmetic mean of the window.
    pub mean: T,
    /// Population standard deviation of the window.
    pub stddev: T,
}

impl<T: fmt::Display> fmt::Display for Record<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:.5} {:.5}", self.step, self.mean, self.stddev)
    }
}

/// Moving mean and standard deviation over the last `period` values.
///
/// The window is FILLING until it holds `period` values and FULL afterwards.
/// Each push adds the new value's contribution to the running sum and sum of
/// squares and, once full, subtracts the evicted value's contribution, so an
/// update is O(1) regardless of the period.
///
/// The running sums use Kahan-Babuska-Neumaier summation, which keeps the
/// incrementally maintained sums in line with a fresh recomputation over long
/// streams.
#[derive(Debug, Clone)]
pub struct MovingStatistics<T> {
    /// Statistics period
    period: usize,
    /// Most recent values
    window: Window<T>,
    /// Most recent value evicted from the window (if full).
    popped: Option<T>,
    /// Sum of inputs
    sum: Kbn<T>,
    /// Sum of squares
    sum_sq: Kbn<T>,
}

impl<T: Float + Default> MovingStatistics<T> {
    /// Creates an empty instance with the specified period.
    pub fn new(period: NonZeroUsize) -> Self {
        Self::with_window(Window::new(period))
    }

    /// Creates an empty instance, failing instead of aborting when the window
    /// cannot be allocated.
    ///
    /// # Errors
    ///
    /// * [`Error::Allocation`] - The window buffer could not be reserved
    pub fn try_new(period: NonZeroUsize) -> Result<Self, Error> {
        let window = Window::try_new(period).map_err(|source| Error::Allocation {
            period: period.get(),
            source,
        })?;
        Ok(Self::with_window(window))
    }

    fn with_window(window: Window<T>) -> Self {
        Self {
            period: window.capacity(),
            window,
            popped: None,
            sum: Kbn::default(),
            sum_sq: Kbn::default(),
        }
    }

    /// Resets the sums
    #[inline]
    fn reset_sums(&mut self) {
        self.sum = Kbn::default();
        self.sum_sq = Kbn::default();
    }

    /// Returns to the initial FILLING state
    ///
    /// # Returns
    ///
    /// * `&mut Self` - The statistics object
    pub fn reset(&mut self) -> &mut Self {
        self.window.clear();
        self.popped = None;
        self.reset_sums();
        self
    }

    /// Pushes a value into the window and updates the running sums
    ///
    /// # Arguments
    ///
    /// * `value` - The newest value of the series
    ///
    /// # Returns
    ///
    /// * `&mut Self` - The statistics object
    #[inline]
    pub fn next(&mut self, value: T) -> &mut Self {
        self.popped = self.window.push(value);
        if let Some(popped) = self.popped {
            self.sum -= popped;
            self.sum_sq -= popped * popped;
        }

        self.sum += value;
        self.sum_sq += value * value;
        self
    }

    /// Feeds one observation and returns a record once the window is full.
    ///
    /// The record carries the step of `observation`, not a position.
    pub fn ingest(&mut self, observation: Observation<T>) -> Option<Record<T>> {
        self.next(observation.value);
        Some(Record {
            step: observation.step,
            mean: self.mean()?,
            stddev: self.stddev()?,
        })
    }

    /// Rebuilds the running sums from the window contents, discarding any
    /// accumulated rounding error
    ///
    /// # Returns
    ///
    /// * `&mut Self` - The statistics object
    pub fn recompute(&mut self) -> &mut Self {
        self.reset_sums();

        for &v in self.window.iter() {
            self.sum += v;
            self.sum_sq += v * v;
        }
        self
    }

    /// Returns the value that was evicted by the last push
    pub const fn popped(&self) -> Option<T> {
        self.popped
    }

    /// Returns the value that was pushed last
    pub fn value(&self) -> Option<T> {
        self.window.back()
    }

    /// Returns the window period
    #[inline]
    pub const fn period(&self) -> usize {
        self.period
    }

    /// Returns true once the window is full
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.window.is_full()
    }

    /// Returns the number of values in the window
    #[inline]
    pub fn count(&self) -> usize {
        self.window.len()
    }

    /// Iterates the window from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.window.iter()
    }

    /// Returns the sum of all values in the window
    ///
    /// # Returns
    ///
    /// * `Option<T>` - The sum if the window is full, `None` otherwise
    #[inline]
    pub fn sum(&self) -> Option<T> {
        self.is_ready().then(|| self.sum.total())
    }

    /// Returns the sum of squares of all values in the window
    ///
    /// # Returns
    ///
    /// * `Option<T>` - The sum of squares if the window is full, `None` otherwise
    #[inline]
    pub fn sum_sq(&self) -> Option<T> {
        self.is_ready().then(|| self.sum_sq.total())
    }

    /// Returns the arithmetic mean of the window
    ///
    /// # Returns
    ///
    /// * `Option<T>` - `sum / period` if the window is full, `None` otherwise
    #[inline]
    pub fn mean(&self) -> Option<T> {
        self.sum().zip(T::from(self.period)).map(|(s, n)| s / n)
    }

    /// Returns the mean of squared values in the window
    ///
    /// # Returns
    ///
    /// * `Option<T>` - `sum_sq / period` if the window is full, `None` otherwise
    #[inline]
    pub fn mean_sq(&self) -> Option<T> {
        self.sum_sq().zip(T::from(self.period)).map(|(ss, n)| ss / n)
    }

    /// Returns the population variance of the window
    ///
    /// Computed as the mean of squares minus the squared mean, dividing by the
    /// period rather than `period - 1`. Cancellation can push that difference
    /// slightly below zero for near-constant windows; it is clamped to zero.
    ///
    /// # Returns
    ///
    /// * `Option<T>` - The variance, or `None` if the window is not full
    #[inline]
    pub fn variance(&self) -> Option<T> {
        let mean = self.mean()?;
        let mean_sq = self.mean_sq()?;
        Some((mean_sq - mean * mean).max(T::zero()))
    }

    /// Returns the population standard deviation of the window
    ///
    /// # Returns
    ///
    /// * `Option<T>` - The square root of [`variance`](Self::variance), or `None` if the window is not full
    #[inline]
    pub fn stddev(&self) -> Option<T> {
        self.variance().map(T::sqrt)
    }
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;

    use super::*;

    fn period(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap_or(NonZeroUsize::MIN)
    }

    fn observations(values: &[f64]) -> Vec<Observation> {
        values
            .iter()
            .enumerate()
            .map(|(i, &value)| Observation {
                step: i as i64 + 1,
                value,
            })
            .collect()
    }

    #[test]
    fn filling_emits_nothing() {
        let mut stats = MovingStatistics::new(period(3));
        assert!(stats.next(1.0).mean().is_none());
        assert!(stats.next(2.0).stddev().is_none());
        assert!(!stats.is_ready());
        assert_eq!(stats.count(), 2);
        assert!(stats.next(3.0).is_ready());
    }

    #[test]
    fn sum_works() {
        let mut stats = MovingStatistics::new(period(3));
        let inputs = [
            1_000_000.1,
            1_000_000.2,
            1_000_000.3,
            1_000_000.4,
            1_000_000.5,
            1_000_000.6,
            1_000_000.7,
        ];
        let mut results = vec![];

        inputs.iter().for_each(|i| {
            if let Some(v) = stats.next(*i).sum() {
                results.push(v)
            }
        });

        let expected = [3000000.6, 3000000.9, 3000001.2, 3000001.5, 3000001.8];
        assert_eq!(&results, &expected);
    }

    #[test]
    fn mean_works() {
        let mut stats = MovingStatistics::new(period(3));
        let inputs = [25.4, 26.2, 26.0, 26.1, 25.8, 25.9, 26.3, 26.2, 26.5];
        let mut results = vec![];

        inputs.iter().for_each(|i| {
            if let Some(v) = stats.next(*i).mean() {
                results.push(v)
            }
        });

        let expected: [f64; 7] = [25.8667, 26.1, 25.9667, 25.9333, 26.0, 26.1333, 26.3333];
        assert_eq!(results.len(), expected.len());
        for (i, e) in expected.iter().enumerate() {
            assert_approx_eq!(e, results[i], 0.0001);
        }
    }

    #[test]
    fn stddev_works() {
        let mut stats = MovingStatistics::new(period(3));
        let mut results = vec![];
        let inputs = [25.4, 26.2, 26.0, 26.1, 25.8, 25.9, 26.3, 26.2, 26.5];
        inputs.iter().for_each(|i| {
            if let Some(v) = stats.next(*i).stddev() {
                results.push(v)
            }
        });

        let expected: [f64; 7] = [0.3399, 0.0816, 0.1247, 0.1247, 0.216, 0.17, 0.1247];
        for (i, e) in expected.iter().enumerate() {
            assert_approx_eq!(e, results[i], 0.0001);
        }
    }

    #[test]
    fn variance_is_population_normalized() {
        let mut stats = MovingStatistics::new(period(2));
        stats.next(10.0).next(20.0);
        assert_approx_eq!(stats.variance().unwrap_or(f64::NAN), 25.0, 1e-12);
        assert_approx_eq!(stats.stddev().unwrap_or(f64::NAN), 5.0, 1e-12);
    }

    #[test]
    fn ingest_echoes_step_of_latest_observation() {
        let mut stats = MovingStatistics::new(period(2));
        let records: Vec<_> = observations(&[10.0, 20.0, 30.0])
            .into_iter()
            .filter_map(|obs| stats.ingest(obs))
            .collect();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].to_string(), "2 15.00000 5.00000");
        assert_eq!(records[1].to_string(), "3 25.00000 5.00000");
    }

    #[test]
    fn ingest_keeps_non_sequential_steps() {
        let mut stats = MovingStatistics::new(period(1));
        let record = stats.ingest(Observation {
            step: -42,
            value: 1.5,
        });
        assert_eq!(
            record,
            Some(Record {
                step: -42,
                mean: 1.5,
                stddev: 0.0
            })
        );
    }

    #[test]
    fn period_one_mirrors_each_value() {
        let mut stats = MovingStatistics::new(period(1));
        for obs in observations(&[3.25, -7.0, 1e6, 0.0, 12.5]) {
            let record = stats.ingest(obs);
            assert_eq!(record.map(|r| r.mean), Some(obs.value));
            assert_eq!(record.map(|r| r.stddev), Some(0.0));
        }
    }

    #[test]
    fn record_count_is_length_minus_period_plus_one() {
        let values: Vec<f64> = (0..50).map(|i| (i as f64 * 0.37).sin() * 10.0).collect();
        for n in 1..=50 {
            let mut stats = MovingStatistics::new(period(n));
            let emitted = observations(&values)
                .into_iter()
                .filter_map(|obs| stats.ingest(obs))
                .count();
            assert_eq!(emitted, values.len() - n + 1, "period {n}");
        }
    }

    #[test]
    fn mean_matches_latest_values() {
        let values: Vec<f64> = (0..200).map(|i| (i as f64).cos() * 3.0 + i as f64).collect();
        let n = 7;
        let mut stats = MovingStatistics::new(period(n));
        for (i, &v) in values.iter().enumerate() {
            if let Some(mean) = stats.next(v).mean() {
                let expected = values[i + 1 - n..=i].iter().sum::<f64>() / n as f64;
                assert_approx_eq!(mean, expected, 1e-9);
                assert!(stats.stddev().is_some_and(|s| s >= 0.0));
            }
        }
    }

    #[test]
    fn constant_window_clamps_negative_variance() {
        let mut stats = MovingStatistics::new(period(3));
        for _ in 0..100 {
            stats.next(0.1);
        }
        let variance = stats.variance().unwrap_or(f64::NAN);
        assert!(variance >= 0.0);
        assert_eq!(stats.stddev().map(f64::is_nan), Some(false));
    }

    #[test]
    fn incremental_sums_do_not_drift() {
        let n = 64;
        let mut stats = MovingStatistics::new(period(n));
        for i in 0..20_000u32 {
            let v = 1_000.0 + (f64::from(i) * 0.731).sin() * 250.0 + f64::from(i % 17) * 1e-3;
            stats.next(v);

            let Some(sum) = stats.sum() else { continue };
            let Some(sum_sq) = stats.sum_sq() else { continue };
            let fresh: f64 = stats.iter().sum();
            let fresh_sq: f64 = stats.iter().map(|x| x * x).sum();

            assert!((sum - fresh).abs() <= 1e-9 * fresh.abs().max(1.0), "sum drift at {i}");
            assert!(
                (sum_sq - fresh_sq).abs() <= 1e-9 * fresh_sq.abs().max(1.0),
                "sum_sq drift at {i}"
            );
        }
    }

    #[test]
    fn recompute_agrees_with_incremental_sums() {
        let mut stats = MovingStatistics::new(period(5));
        for i in 0..1_000 {
            stats.next(f64::from(i) * 0.1 + 1e8);
        }
        let before = (stats.sum(), stats.sum_sq());
        stats.recompute();
        let after = (stats.sum(), stats.sum_sq());

        assert_approx_eq!(before.0.unwrap_or(0.0), after.0.unwrap_or(f64::NAN), 1e-6);
        let rel = (before.1.unwrap_or(0.0) - after.1.unwrap_or(f64::NAN)).abs()
            / after.1.unwrap_or(1.0);
        assert!(rel <= 1e-12);
    }

    #[test]
    fn popped_and_value_track_last_push() {
        let mut stats = MovingStatistics::new(period(2));
        stats.next(1.0).next(2.0);
        assert_eq!(stats.popped(), None);
        assert_eq!(stats.value(), Some(2.0));

        stats.next(3.0);
        assert_eq!(stats.popped(), Some(1.0));
        assert_eq!(stats.value(), Some(3.0));
        assert_eq!(stats.iter().copied().collect::<Vec<_>>(), vec![2.0, 3.0]);
    }

    #[test]
    fn reset_returns_to_filling() {
        let mut stats = MovingStatistics::new(period(2));
        stats.next(1.0).next(2.0);
        assert!(stats.is_ready());

        stats.reset();
        assert!(!stats.is_ready());
        assert_eq!(stats.count(), 0);
        assert_eq!(stats.value(), None);

        stats.next(5.0).next(7.0);
        assert_eq!(stats.mean(), Some(6.0));
        assert_eq!(stats.period(), 2);
    }

    #[test]
    fn try_new_reports_allocation_failure() {
        let result = MovingStatistics::<f64>::try_new(period(usize::MAX));
        assert!(matches!(result, Err(Error::Allocation { .. })));
    }

    #[test]
    fn works_with_f32() {
        let mut stats = MovingStatistics::<f32>::new(period(2));
        stats.next(1.0).next(3.0);
        assert_eq!(stats.mean(), Some(2.0));
        assert_eq!(stats.stddev(), Some(1.0));
    }
}

//! Turn clock timestamps into a stable tempo.

#[allow(unused_imports)]
use micromath::F32Ext;

use crate::log;
use crate::queue::IntervalQueue;
use crate::time::{self, Instant};

/// Default number of intervals collected before the tempo is re-evaluated.
pub const QUEUE_SIZE: usize = 2;

/// Published tempo.
///
/// This only changes when the measured tempo moves by more than the
/// configured threshold, so outputs are not disturbed by jitter of the
/// incoming clock.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StableClock {
    pub period: u32,
    pub bpm: f32,
    /// Time of the edge that completed the measurement.
    pub updated_at: Instant,
    /// Sequence number of that edge, see `PeriodEstimator::last_edge`.
    pub edge: u32,
}

/// Outcome of a single evaluated queue window.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Estimate {
    Published(StableClock),
    Held,
}

/// Clock edge together with its sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Edge {
    pub at: Instant,
    pub number: u32,
}

/// Measure clock period over a rolling window of `N` intervals.
///
/// Feed it with timestamps of clock edges through `feed`. Every `N`
/// intervals the mean of the window is compared with the published tempo.
/// Uneven intervals, such as of a swung clock, average out.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PeriodEstimator<const N: usize = QUEUE_SIZE> {
    queue: IntervalQueue<N>,
    previous_edge: Option<Instant>,
    edges: u32,
    stable: Option<StableClock>,
    last_bpm: f32,
    threshold: f32,
}

impl<const N: usize> PeriodEstimator<N> {
    #[must_use]
    pub fn new(threshold: f32) -> Self {
        Self {
            queue: IntervalQueue::new(),
            previous_edge: None,
            edges: 0,
            stable: None,
            last_bpm: 0.0,
            threshold,
        }
    }

    /// Record a clock edge.
    ///
    /// Returns `None` until a full window of fresh intervals was collected.
    pub fn feed(&mut self, edge: Instant) -> Option<Estimate> {
        self.edges = self.edges.wrapping_add(1);
        let previous_edge = self.previous_edge.replace(edge)?;
        self.queue.write(time::elapsed(edge, previous_edge));
        if !self.queue.take_fill() {
            return None;
        }
        Some(self.evaluate(edge))
    }

    fn evaluate(&mut self, now: Instant) -> Estimate {
        let period = match self.queue.mean() {
            Some(period) if period > 0 => period,
            _ => return Estimate::Held,
        };

        let bpm = time::period_to_bpm(period);
        if (bpm - self.last_bpm).abs() < self.threshold {
            return Estimate::Held;
        }

        let stable = StableClock {
            period,
            bpm,
            updated_at: now,
            edge: self.edges,
        };
        self.stable = Some(stable);
        self.last_bpm = bpm;
        log::info!("Stable clock set to {=f32} BPM", bpm);
        Estimate::Published(stable)
    }

    pub fn stable(&self) -> Option<StableClock> {
        self.stable
    }

    /// The most recent edge of the current interval chain.
    ///
    /// Edges are numbered in the order they were fed, across restarts.
    pub fn last_edge(&self) -> Option<Edge> {
        self.previous_edge.map(|at| Edge {
            at,
            number: self.edges,
        })
    }

    /// Drop the current interval chain, keeping the published clock.
    ///
    /// Used when the source of timestamps changes, so that no interval is
    /// measured between edges of two different sources.
    pub fn restart(&mut self) {
        self.queue.reset();
        self.previous_edge = None;
    }

    /// Forget everything, including the published clock.
    pub fn reset(&mut self) {
        self.restart();
        self.stable = None;
        self.last_bpm = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_intervals<const N: usize>(
        estimator: &mut PeriodEstimator<N>,
        start: Instant,
        intervals: &[u32],
    ) -> (Instant, Option<Estimate>) {
        let mut now = start;
        let mut last = None;
        for interval in intervals {
            now = now.wrapping_add(*interval);
            if let Some(estimate) = estimator.feed(now) {
                last = Some(estimate);
            }
        }
        (now, last)
    }

    #[test]
    fn before_first_full_window_there_is_no_clock() {
        let mut estimator: PeriodEstimator = PeriodEstimator::new(1.0);
        assert_eq!(estimator.feed(0), None);
        assert_eq!(estimator.feed(500_000), None);
        assert_eq!(estimator.stable(), None);
    }

    #[test]
    fn when_window_fills_it_publishes_mean_period() {
        let mut estimator: PeriodEstimator = PeriodEstimator::new(1.0);
        estimator.feed(0);
        let (_, estimate) = feed_intervals(&mut estimator, 0, &[500_000, 500_000]);
        let Some(Estimate::Published(stable)) = estimate else {
            panic!("Clock was not published: {estimate:?}");
        };
        assert_eq!(stable.period, 500_000);
        assert_relative_eq!(stable.bpm, 120.0);
        assert_eq!(stable.updated_at, 1_000_000);
    }

    #[test]
    fn when_tempo_moves_below_threshold_it_holds() {
        let mut estimator: PeriodEstimator = PeriodEstimator::new(1.0);
        estimator.feed(0);
        let (now, _) = feed_intervals(&mut estimator, 0, &[500_000; 2]);
        // 120.5 BPM
        let (_, estimate) = feed_intervals(&mut estimator, now, &[497_925; 4]);
        assert_eq!(estimate, Some(Estimate::Held));
        assert_relative_eq!(estimator.stable().unwrap().bpm, 120.0);
    }

    #[test]
    fn when_tempo_moves_above_threshold_it_publishes() {
        let mut estimator: PeriodEstimator = PeriodEstimator::new(1.0);
        estimator.feed(0);
        let (now, _) = feed_intervals(&mut estimator, 0, &[500_000; 2]);
        // 122 BPM
        feed_intervals(&mut estimator, now, &[491_803; 2]);
        assert_relative_eq!(estimator.stable().unwrap().bpm, 122.0, epsilon = 0.01);
    }

    #[test]
    fn swung_clock_locks_onto_its_mean() {
        let mut estimator: PeriodEstimator = PeriodEstimator::new(1.0);
        estimator.feed(0);
        let mut intervals = [0; 40];
        for (i, interval) in intervals.iter_mut().enumerate() {
            *interval = if i % 2 == 0 { 600_000 } else { 400_000 };
        }
        feed_intervals(&mut estimator, 0, &intervals);
        let stable = estimator.stable().unwrap();
        assert_eq!(stable.period, 500_000);
        assert_relative_eq!(stable.bpm, 120.0);
    }

    #[test]
    fn published_clock_carries_number_of_its_edge() {
        let mut estimator: PeriodEstimator = PeriodEstimator::new(1.0);
        estimator.feed(0);
        feed_intervals(&mut estimator, 0, &[500_000; 3]);
        assert_eq!(estimator.stable().unwrap().edge, 3);
        assert_eq!(
            estimator.last_edge(),
            Some(Edge {
                at: 1_500_000,
                number: 4
            })
        );
    }

    #[test]
    fn edges_of_identical_time_do_not_publish() {
        let mut estimator: PeriodEstimator = PeriodEstimator::new(1.0);
        estimator.feed(1_000);
        estimator.feed(1_000);
        assert_eq!(estimator.feed(1_000), Some(Estimate::Held));
        assert_eq!(estimator.stable(), None);
    }

    #[test]
    fn when_reset_it_forgets_published_clock() {
        let mut estimator: PeriodEstimator = PeriodEstimator::new(1.0);
        estimator.feed(0);
        feed_intervals(&mut estimator, 0, &[500_000; 2]);
        estimator.reset();
        assert_eq!(estimator.stable(), None);
        assert_eq!(estimator.feed(5_000_000), None);
    }

    #[test]
    fn when_restarted_it_keeps_published_clock_but_needs_new_window() {
        let mut estimator: PeriodEstimator = PeriodEstimator::new(1.0);
        estimator.feed(0);
        let (now, _) = feed_intervals(&mut estimator, 0, &[500_000; 2]);
        estimator.restart();
        assert!(estimator.stable().is_some());
        assert_eq!(estimator.feed(now + 10_000_000), None);
        assert_eq!(estimator.feed(now + 10_500_000), None);
    }

    #[test]
    fn with_longer_queue_it_evaluates_once_per_fill() {
        let mut estimator: PeriodEstimator<4> = PeriodEstimator::new(1.0);
        estimator.feed(0);
        let mut now = 0;
        for i in 0..8 {
            now += 500_000;
            let estimate = estimator.feed(now);
            if i == 3 || i == 7 {
                assert!(estimate.is_some());
            } else {
                assert_eq!(estimate, None);
            }
        }
    }
}

//! Properties of timing that must hold for any tempo and loop jitter.

use proptest::prelude::*;

use polyclock_control::channel::Channel;
use polyclock_control::estimator::{Estimate, PeriodEstimator};
use polyclock_control::ratio::Ratio;
use polyclock_control::time::{self, bpm_to_period};
use polyclock_control::GateMode;

const THRESHOLD: f32 = 1.0;
const WIDTH: u32 = 10_000;

proptest! {
    #[test]
    fn jitter_below_threshold_never_moves_stable_clock(
        bpm in 60.0f32..240.0,
        jitter in prop::collection::vec(-200i32..=200, 64),
    ) {
        let period = bpm_to_period(bpm);
        let mut estimator: PeriodEstimator = PeriodEstimator::new(THRESHOLD);
        let mut publications = 0;
        for (i, offset) in jitter.iter().enumerate() {
            let edge = (1_000_000 + i as u32 * period).wrapping_add_signed(*offset);
            if let Some(Estimate::Published(_)) = estimator.feed(edge) {
                publications += 1;
            }
        }
        prop_assert_eq!(publications, 1);
    }

    #[test]
    fn persistent_tempo_change_is_eventually_followed(
        from in 60.0f32..240.0,
        to in 60.0f32..240.0,
        edges_before in 3usize..12,
    ) {
        prop_assume!((from - to).abs() >= 2.0);
        let mut estimator: PeriodEstimator = PeriodEstimator::new(THRESHOLD);
        let mut now: u32 = 0;
        estimator.feed(now);
        for _ in 0..edges_before {
            now += bpm_to_period(from);
            estimator.feed(now);
        }
        for _ in 0..8 {
            now += bpm_to_period(to);
            estimator.feed(now);
        }
        let stable = estimator.stable().unwrap();
        let measured = time::period_to_bpm(bpm_to_period(to));
        prop_assert!((stable.bpm - measured).abs() < THRESHOLD);
    }

    #[test]
    fn loop_jitter_does_not_cause_drift(
        multiplier in 1u8..=8,
        divisor in 1u8..=8,
        bpm in 60.0f32..240.0,
        steps in prop::collection::vec(1u32..=3_000, 2_000),
    ) {
        let ratio = Ratio::new(multiplier, divisor).unwrap();
        let base_period = bpm_to_period(bpm);
        let mut channel = Channel::new(ratio, GateMode::Trigger);
        channel.align(0, base_period, 0);

        let mut now = 0;
        for step in &steps {
            channel.tick(now, WIDTH);
            now += step;
        }
        channel.tick(now, WIDTH);

        let cycle = ratio.cycle(base_period);
        let mut expected_fires = 0;
        let mut expected_last = 0;
        for fire in 0u32.. {
            let m = multiplier as u32;
            let deadline = cycle * (fire / m) + ratio.offset(base_period, fire % m);
            if deadline > now {
                break;
            }
            expected_fires += 1;
            expected_last = deadline;
        }
        prop_assert_eq!(channel.fires, expected_fires);
        prop_assert_eq!(channel.last_fire(), Some(expected_last));
    }
}

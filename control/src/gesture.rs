//! Interpret the reset input as short and long presses.

use crate::capture::ResetLine;
use crate::time::{self, Instant};

/// Action requested by a press of the reset input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Gesture {
    /// Short press, passed through as a phase reset of all outputs. Carries
    /// the time the press started.
    Reset(Instant),
    /// Long press, switching between the external and internal clock.
    Toggle,
}

/// Track a single physical press over multiple control loop ticks.
///
/// Each press results in exactly one action. Long press toggles as soon as
/// it crosses `long_press`, even before release. Short press resets on
/// release. The release counts only after the line stays released for the
/// whole `debounce` window, so bouncing contacts never start a new press.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ResetGesture {
    state: State,
    seen_presses: u32,
    long_press: u32,
    debounce: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum State {
    Idle,
    Held {
        since: Instant,
        reset_processed: bool,
    },
}

impl ResetGesture {
    #[must_use]
    pub fn new(long_press: u32, debounce: u32) -> Self {
        Self {
            state: State::Idle,
            seen_presses: 0,
            long_press,
            debounce,
        }
    }

    pub fn update(&mut self, line: ResetLine, now: Instant) -> Option<Gesture> {
        match self.state {
            State::Idle => {
                if line.presses == self.seen_presses {
                    return None;
                }
                self.seen_presses = line.presses;
                self.state = State::Held {
                    since: line.pressed_at,
                    reset_processed: false,
                };
                // The whole press may have happened between two ticks.
                self.update(line, now)
            }
            State::Held {
                since,
                reset_processed,
            } => {
                self.seen_presses = line.presses;

                let released = !line.pressed && time::elapsed(now, line.changed_at) >= self.debounce;
                if released {
                    self.state = State::Idle;
                    return if reset_processed {
                        None
                    } else {
                        Some(Gesture::Reset(since))
                    };
                }

                if !reset_processed && time::elapsed(now, since) >= self.long_press {
                    self.state = State::Held {
                        since,
                        reset_processed: true,
                    };
                    return Some(Gesture::Toggle);
                }

                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG: u32 = 1_000_000;
    const DEBOUNCE: u32 = 20_000;
    const TICK: u32 = 1_000;

    struct Harness {
        line: ResetLine,
        gesture: ResetGesture,
        now: Instant,
        actions: [u32; 2],
    }

    impl Harness {
        fn new() -> Self {
            Self {
                line: ResetLine::default(),
                gesture: ResetGesture::new(LONG, DEBOUNCE),
                now: 0,
                actions: [0; 2],
            }
        }

        fn edge(&mut self, pressed: bool) {
            if self.line.pressed != pressed {
                self.line.pressed = pressed;
                self.line.changed_at = self.now;
                if pressed {
                    self.line.pressed_at = self.now;
                    self.line.presses += 1;
                }
            }
        }

        fn run(&mut self, duration: u32) {
            for _ in 0..duration / TICK {
                self.now += TICK;
                match self.gesture.update(self.line, self.now) {
                    Some(Gesture::Reset(_)) => self.actions[0] += 1,
                    Some(Gesture::Toggle) => self.actions[1] += 1,
                    None => (),
                }
            }
        }

        fn resets(&self) -> u32 {
            self.actions[0]
        }

        fn toggles(&self) -> u32 {
            self.actions[1]
        }
    }

    #[test]
    fn when_pressed_shortly_it_resets_once() {
        let mut harness = Harness::new();
        harness.edge(true);
        harness.run(100_000);
        assert_eq!(harness.resets(), 0);
        harness.edge(false);
        harness.run(100_000);
        assert_eq!(harness.resets(), 1);
        assert_eq!(harness.toggles(), 0);
    }

    #[test]
    fn when_held_long_it_toggles_before_release_and_only_once() {
        let mut harness = Harness::new();
        harness.edge(true);
        harness.run(LONG + TICK);
        assert_eq!(harness.toggles(), 1);
        harness.run(3 * LONG);
        assert_eq!(harness.toggles(), 1);
        harness.edge(false);
        harness.run(100_000);
        assert_eq!(harness.toggles(), 1);
        assert_eq!(harness.resets(), 0);
    }

    #[test]
    fn when_bouncing_on_press_and_release_it_reports_one_action() {
        let mut harness = Harness::new();
        for _ in 0..5 {
            harness.edge(true);
            harness.run(TICK);
            harness.edge(false);
            harness.run(TICK);
        }
        harness.edge(true);
        harness.run(200_000);
        for _ in 0..5 {
            harness.edge(false);
            harness.run(TICK);
            harness.edge(true);
            harness.run(TICK);
        }
        harness.edge(false);
        harness.run(100_000);
        assert_eq!(harness.resets(), 1);
        assert_eq!(harness.toggles(), 0);
    }

    #[test]
    fn when_bouncing_through_long_press_it_toggles_once() {
        let mut harness = Harness::new();
        for _ in 0..3 {
            harness.edge(true);
            harness.run(TICK);
            harness.edge(false);
            harness.run(TICK);
        }
        harness.edge(true);
        harness.run(2 * LONG);
        harness.edge(false);
        harness.run(TICK);
        harness.edge(true);
        harness.run(TICK);
        harness.edge(false);
        harness.run(100_000);
        assert_eq!(harness.toggles(), 1);
        assert_eq!(harness.resets(), 0);
    }

    #[test]
    fn when_long_pressed_twice_it_toggles_twice() {
        let mut harness = Harness::new();
        harness.edge(true);
        harness.run(LONG + TICK);
        harness.edge(false);
        harness.run(100_000);
        harness.edge(true);
        harness.run(LONG + TICK);
        harness.edge(false);
        harness.run(100_000);
        assert_eq!(harness.toggles(), 2);
        assert_eq!(harness.resets(), 0);
    }

    #[test]
    fn when_press_is_shorter_than_a_tick_it_is_not_lost() {
        let mut gesture = ResetGesture::new(LONG, DEBOUNCE);
        let line = ResetLine {
            pressed: false,
            changed_at: 500,
            pressed_at: 100,
            presses: 1,
        };
        assert_eq!(gesture.update(line, 30_000), Some(Gesture::Reset(100)));
        assert_eq!(gesture.update(line, 31_000), None);
    }

    #[test]
    fn when_nothing_is_pressed_it_stays_idle() {
        let mut gesture = ResetGesture::new(LONG, DEBOUNCE);
        for now in 0..100 {
            assert_eq!(gesture.update(ResetLine::default(), now * TICK), None);
        }
    }

    #[test]
    fn reset_is_anchored_at_start_of_press() {
        let mut gesture = ResetGesture::new(LONG, DEBOUNCE);
        let mut line = ResetLine {
            pressed: true,
            changed_at: 10_500,
            pressed_at: 10_500,
            presses: 1,
        };
        assert_eq!(gesture.update(line, 11_000), None);
        line.pressed = false;
        line.changed_at = 90_000;
        assert_eq!(gesture.update(line, 100_000), None);
        assert_eq!(gesture.update(line, 110_000), Some(Gesture::Reset(10_500)));
    }
}

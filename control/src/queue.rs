//! Rolling window of the most recent clock intervals.

/// Ring buffer of inter-arrival intervals with a compile-time capacity.
///
/// Once full, every write evicts the oldest interval. Besides the window
/// itself, the queue counts intervals written since the last `take_fill`,
/// which lets the estimator evaluate exactly once per queue fill.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IntervalQueue<const N: usize> {
    buffer: [u32; N],
    pointer: usize,
    len: usize,
    fresh: usize,
}

impl<const N: usize> Default for IntervalQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> IntervalQueue<N> {
    /// # Panics
    ///
    /// The queue must be able to hold at least one interval.
    #[must_use]
    pub fn new() -> Self {
        assert!(N > 0);
        Self {
            buffer: [0; N],
            pointer: 0,
            len: 0,
            fresh: 0,
        }
    }

    pub fn write(&mut self, interval: u32) {
        self.buffer[self.pointer] = interval;
        self.pointer = (self.pointer + 1) % N;
        self.len = (self.len + 1).min(N);
        self.fresh = (self.fresh + 1).min(N);
    }

    /// Returns true once per `N` written intervals, consuming the fill.
    pub fn take_fill(&mut self) -> bool {
        if self.fresh == N {
            self.fresh = 0;
            true
        } else {
            false
        }
    }

    pub fn mean(&self) -> Option<u32> {
        if self.len == 0 {
            return None;
        }
        let sum: u64 = self.iter().map(u64::from).sum();
        Some((sum / self.len as u64) as u32)
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.buffer[..self.len].iter().copied()
    }

    pub fn reset(&mut self) {
        self.buffer = [0; N];
        self.pointer = 0;
        self.len = 0;
        self.fresh = 0;
    }
}

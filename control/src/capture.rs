//! Recording of clock and reset edges from interrupt context.
//!
//! `Edges` is the only state shared between interrupt handlers and the
//! control loop. Handlers call `on_clock_edge` and `on_reset_edge`, which do
//! a constant amount of work inside a short critical section and never
//! allocate. The control loop calls `take` once per tick to copy everything
//! out in one consistent read, then interprets it outside of the critical
//! section.
//!
//! ```ignore
//! static EDGES: Edges = Edges::new();
//!
//! #[interrupt]
//! fn EXTI2() {
//!     EDGES.on_clock_edge(micros());
//! }
//! ```

use core::cell::RefCell;
use core::fmt;

use critical_section::Mutex;
use heapless::Vec;

use crate::time::Instant;

/// How many clock edges may arrive between two control loop ticks.
pub const PENDING_CAPACITY: usize = 8;

/// Pending clock edges, oldest first.
pub type Pending = Vec<Instant, PENDING_CAPACITY>;

/// Interrupt-shared record of incoming edges.
pub struct Edges {
    capture: Mutex<RefCell<Capture>>,
}

/// Consistent copy of the shared state, taken by the control loop.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Capture {
    pub pending: Pending,
    pub last_clock_edge: Option<Instant>,
    pub waiting_for_clock_input: bool,
    pub reset: ResetLine,
    pub clock_edges: u32,
    pub reset_edges: u32,
    pub overruns: u32,
}

/// Raw state of the reset input as seen by the interrupt handler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ResetLine {
    pub pressed: bool,
    pub changed_at: Instant,
    pub pressed_at: Instant,
    pub presses: u32,
}

impl Default for Edges {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Edges {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let capture = self.peek();
        write!(
            fmt,
            "Edges(clock_edges: {}, reset_edges: {}, pending: {})",
            capture.clock_edges,
            capture.reset_edges,
            capture.pending.len()
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Edges {
    fn format(&self, fmt: defmt::Formatter) {
        let capture = self.peek();
        defmt::write!(
            fmt,
            "Edges(clock_edges: {}, reset_edges: {}, pending: {})",
            capture.clock_edges,
            capture.reset_edges,
            capture.pending.len()
        );
    }
}

impl Edges {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            capture: Mutex::new(RefCell::new(Capture {
                pending: Vec::new(),
                last_clock_edge: None,
                waiting_for_clock_input: true,
                reset: ResetLine {
                    pressed: false,
                    changed_at: 0,
                    pressed_at: 0,
                    presses: 0,
                },
                clock_edges: 0,
                reset_edges: 0,
                overruns: 0,
            })),
        }
    }

    /// Record a rising edge of the clock input.
    pub fn on_clock_edge(&self, now: Instant) {
        critical_section::with(|cs| {
            let mut capture = self.capture.borrow_ref_mut(cs);
            capture.clock_edges = capture.clock_edges.wrapping_add(1);
            capture.last_clock_edge = Some(now);
            capture.waiting_for_clock_input = false;
            if capture.pending.push(now).is_err() {
                capture.overruns = capture.overruns.wrapping_add(1);
            }
        });
    }

    /// Record a transition of the reset input.
    ///
    /// The handler may be bound to both edges. Repeated reports of an
    /// unchanged level are ignored.
    pub fn on_reset_edge(&self, now: Instant, pressed: bool) {
        critical_section::with(|cs| {
            let mut capture = self.capture.borrow_ref_mut(cs);
            capture.reset_edges = capture.reset_edges.wrapping_add(1);
            let line = &mut capture.reset;
            if line.pressed == pressed {
                return;
            }
            line.pressed = pressed;
            line.changed_at = now;
            if pressed {
                line.pressed_at = now;
                line.presses = line.presses.wrapping_add(1);
            }
        });
    }

    /// Copy the shared state out and clear pending clock edges.
    pub fn take(&self) -> Capture {
        critical_section::with(|cs| {
            let mut capture = self.capture.borrow_ref_mut(cs);
            let copy = capture.clone();
            capture.pending.clear();
            copy
        })
    }

    /// Copy the shared state out without consuming pending edges.
    pub fn peek(&self) -> Capture {
        critical_section::with(|cs| self.capture.borrow_ref(cs).clone())
    }

    /// Start waiting for the external clock again.
    ///
    /// Edges recorded so far are discarded, so a stale timestamp never forms
    /// an interval with the next real edge.
    pub fn rearm(&self) {
        critical_section::with(|cs| {
            let mut capture = self.capture.borrow_ref_mut(cs);
            capture.waiting_for_clock_input = true;
            capture.last_clock_edge = None;
            capture.pending.clear();
        });
    }
}

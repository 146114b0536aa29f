//! Timestamps and tempo conversions.
//!
//! All timestamps are taken from a free running microsecond counter. The
//! counter is 32 bits wide and wraps roughly every 71 minutes, so instants
//! must never be compared directly. Use `elapsed` instead, which stays
//! correct across the wrap as long as the two instants are less than half
//! of the counter range apart.

/// Microsecond timestamp of a monotonic, wrapping counter.
pub type Instant = u32;

/// Microseconds in a minute, used to convert between periods and BPM.
pub const MICROS_PER_MINUTE: f32 = 60_000_000.0;

/// Time passed from `since` to `now`.
#[must_use]
pub fn elapsed(now: Instant, since: Instant) -> u32 {
    now.wrapping_sub(since)
}

/// Whether `now` is at or past `deadline`, tolerating counter wrap.
#[must_use]
pub fn reached(now: Instant, deadline: Instant) -> bool {
    elapsed(now, deadline) < u32::MAX / 2
}

#[must_use]
pub fn period_to_bpm(period: u32) -> f32 {
    MICROS_PER_MINUTE / period as f32
}

#[must_use]
pub fn bpm_to_period(bpm: f32) -> u32 {
    libm::roundf(MICROS_PER_MINUTE / bpm) as u32
}

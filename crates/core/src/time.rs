use chrono::{DateTime, Duration, Utc};

/// A simple clock abstraction for deterministic time in services and tests.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    Default,
    Fixed(DateTime<Utc>),
}

impl Clock {
    /// Returns a clock fixed at the given timestamp.
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    /// Returns the current time according to the clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::Default => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// If this is a fixed clock, advance it by the given duration.
    ///
    /// Has no effect on `Clock::Default`.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }

    /// Returns true if this clock is fixed.
    #[must_use]
    pub fn is_fixed(&self) -> bool {
        matches!(self, Clock::Fixed(_))
    }
}

/// Whole seconds between `started_at` and `now`, floored.
///
/// Clock skew can make `now` earlier than `started_at`; the result is
/// clamped to zero so per-question timings never go negative.
#[must_use]
pub fn elapsed_whole_secs(started_at: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    let secs = now.signed_duration_since(started_at).num_seconds();
    u32::try_from(secs.max(0)).unwrap_or(u32::MAX)
}

/// Deterministic timestamp for tests and examples (2025-06-15T15:06:40Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_750_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests and doc examples.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Returns a `Clock` fixed at the deterministic test timestamp.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_advances() {
        let mut clock = fixed_clock();
        let before = clock.now();
        clock.advance(Duration::seconds(42));
        assert_eq!(clock.now() - before, Duration::seconds(42));
    }

    #[test]
    fn advance_leaves_system_clock_alone() {
        let mut clock = Clock::default();
        clock.advance(Duration::seconds(9000));
        assert!(!clock.is_fixed());
    }

    #[test]
    fn elapsed_floors_partial_seconds() {
        let start = fixed_now();
        let now = start + Duration::milliseconds(4_900);
        assert_eq!(elapsed_whole_secs(start, now), 4);
    }

    #[test]
    fn elapsed_clamps_backwards_clock_to_zero() {
        let start = fixed_now();
        let now = start - Duration::seconds(30);
        assert_eq!(elapsed_whole_secs(start, now), 0);
    }
}

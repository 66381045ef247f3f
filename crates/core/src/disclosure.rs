//! The disclosure gate: may a capsule's content be shown yet?
//!
//! A capsule is [`Disclosure::Sealed`] while `now < open_time` and
//! [`Disclosure::Unsealed`] from `open_time` onwards (the boundary itself
//! unseals). The state is never stored; callers re-evaluate on every
//! observation, typically once per second while sealed.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clock::Clock;

const MILLIS_PER_DAY: u64 = 86_400_000;
const MILLIS_PER_HOUR: u64 = 3_600_000;
const MILLIS_PER_MINUTE: u64 = 60_000;
const MILLIS_PER_SECOND: u64 = 1_000;

/// Naive layouts the backend has been seen to emit, interpreted as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Errors produced by the disclosure gate.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DisclosureError {
    /// The open time could not be parsed. The capsule must be treated as
    /// inaccessible, never as unsealed.
    #[error("invalid open time: {value:?}")]
    InvalidTimestamp {
        /// The rejected input.
        value: String,
    },
}

/// Remaining time until a capsule opens, broken down for display.
///
/// Each unit is floored and is the remainder after the larger units are
/// removed; only `days` is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Countdown {
    pub days: u64,
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
    /// Total remaining milliseconds the breakdown was computed from.
    pub total_millis: u64,
}

impl Countdown {
    /// Decompose a non-negative millisecond difference.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_millis(total_millis: u64) -> Self {
        let ms = total_millis;
        Self {
            days: ms / MILLIS_PER_DAY,
            // Remainders are bounded by 24, 60 and 60 respectively.
            hours: ((ms % MILLIS_PER_DAY) / MILLIS_PER_HOUR) as u8,
            minutes: ((ms % MILLIS_PER_HOUR) / MILLIS_PER_MINUTE) as u8,
            seconds: ((ms % MILLIS_PER_MINUTE) / MILLIS_PER_SECOND) as u8,
            total_millis,
        }
    }
}

/// The disclosure state of a capsule at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Disclosure {
    /// Content must stay hidden; show the countdown instead.
    Sealed {
        /// Time left until the capsule opens.
        remaining: Countdown,
    },
    /// Content may be shown.
    Unsealed,
}

impl Disclosure {
    /// Returns `true` for [`Disclosure::Sealed`].
    #[must_use]
    pub const fn is_sealed(&self) -> bool {
        matches!(self, Self::Sealed { .. })
    }

    /// The countdown, when sealed.
    #[must_use]
    pub const fn remaining(&self) -> Option<Countdown> {
        match self {
            Self::Sealed { remaining } => Some(*remaining),
            Self::Unsealed => None,
        }
    }
}

/// Parse an open time as sent by the backend.
///
/// Accepts RFC 3339 (with `Z` or an offset) and the naive
/// `YYYY-MM-DDTHH:MM:SS` / `YYYY-MM-DD HH:MM:SS` layouts, which are taken as
/// UTC.
///
/// # Errors
///
/// Returns [`DisclosureError::InvalidTimestamp`] for anything else.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, DisclosureError> {
    let trimmed = value.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }

    // "2030-01-01 00:00:00Z" is not RFC 3339 but shows up in the wild
    if let Some(spaced) = trimmed.get(10..11).filter(|sep| *sep == " ")
        && let Ok(parsed) = DateTime::parse_from_rfc3339(&trimmed.replacen(spaced, "T", 1))
    {
        return Ok(parsed.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| DisclosureError::InvalidTimestamp {
            value: value.to_owned(),
        })
}

/// Decide the disclosure state for an already-parsed open time.
#[must_use]
pub fn evaluate_at(open_time: DateTime<Utc>, now: DateTime<Utc>) -> Disclosure {
    if now >= open_time {
        return Disclosure::Unsealed;
    }

    let diff = (open_time - now).num_milliseconds();
    Disclosure::Sealed {
        remaining: Countdown::from_millis(diff.unsigned_abs()),
    }
}

/// Decide the disclosure state for an open time in wire form.
///
/// # Errors
///
/// Returns [`DisclosureError::InvalidTimestamp`] if `open_time` does not
/// parse.
pub fn evaluate(open_time: &str, now: DateTime<Utc>) -> Result<Disclosure, DisclosureError> {
    parse_timestamp(open_time).map(|open_time| evaluate_at(open_time, now))
}

/// A gate bound to a clock, for callers that do not want to thread `now`
/// through by hand.
#[derive(Debug, Clone)]
pub struct DisclosureGate<C> {
    clock: C,
}

impl<C: Clock> DisclosureGate<C> {
    /// Create a gate reading time from `clock`.
    pub const fn new(clock: C) -> Self {
        Self { clock }
    }

    /// Evaluate against the clock's current time.
    ///
    /// # Errors
    ///
    /// Returns [`DisclosureError::InvalidTimestamp`] if `open_time` does not
    /// parse.
    pub fn evaluate(&self, open_time: &str) -> Result<Disclosure, DisclosureError> {
        evaluate(open_time, self.clock.now())
    }

    /// Evaluate a parsed open time against the clock's current time.
    pub fn evaluate_at(&self, open_time: DateTime<Utc>) -> Disclosure {
        evaluate_at(open_time, self.clock.now())
    }

    /// The clock this gate reads from.
    pub const fn clock(&self) -> &C {
        &self.clock
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeDelta;

    use super::*;
    use crate::clock::ManualClock;

    fn base() -> DateTime<Utc> {
        parse_timestamp("2030-06-01T12:00:00Z").unwrap()
    }

    #[test]
    fn test_sealed_before_open_time() {
        let now = base();
        let open = now + TimeDelta::milliseconds(1);
        assert!(evaluate_at(open, now).is_sealed());
    }

    #[test]
    fn test_boundary_unseals() {
        let now = base();
        assert_eq!(evaluate_at(now, now), Disclosure::Unsealed);
    }

    #[test]
    fn test_unsealed_after_open_time() {
        let now = base();
        let open = now - TimeDelta::days(3);
        let state = evaluate_at(open, now);
        assert_eq!(state, Disclosure::Unsealed);
        assert!(state.remaining().is_none());
    }

    #[test]
    fn test_countdown_one_of_each() {
        let now = base();
        let open = now + TimeDelta::milliseconds(90_061_000);
        let remaining = evaluate_at(open, now).remaining().unwrap();
        assert_eq!(
            (
                remaining.days,
                remaining.hours,
                remaining.minutes,
                remaining.seconds
            ),
            (1, 1, 1, 1)
        );
    }

    #[test]
    fn test_countdown_floors_each_unit() {
        // 2 days, 23:59:59.999
        let c = Countdown::from_millis(2 * 86_400_000 + 86_399_999);
        assert_eq!((c.days, c.hours, c.minutes, c.seconds), (2, 23, 59, 59));

        // under one second still counts as sealed, with all zeros
        let c = Countdown::from_millis(999);
        assert_eq!((c.days, c.hours, c.minutes, c.seconds), (0, 0, 0, 0));
    }

    #[test]
    fn test_days_unbounded() {
        let c = Countdown::from_millis(400 * 86_400_000);
        assert_eq!(c.days, 400);
        assert_eq!(c.hours, 0);
    }

    #[test]
    fn test_evaluate_wire_formats() {
        let now = parse_timestamp("2030-01-01T00:00:00Z").unwrap();
        for raw in [
            "2030-01-01T01:00:00Z",
            "2030-01-01T01:00:00",
            "2030-01-01 01:00:00",
            "2030-01-01T02:00:00+01:00",
            "2030-01-01T01:00:00.000Z",
        ] {
            let remaining = evaluate(raw, now).unwrap().remaining().unwrap();
            assert_eq!(remaining.hours, 1, "format {raw}");
            assert_eq!(remaining.minutes, 0, "format {raw}");
        }
    }

    #[test]
    fn test_invalid_timestamp_is_an_error_not_unsealed() {
        let now = base();
        for raw in ["", "not a date", "2030-13-45T00:00:00Z", "NaN"] {
            assert_eq!(
                evaluate(raw, now),
                Err(DisclosureError::InvalidTimestamp {
                    value: raw.to_owned()
                })
            );
        }
    }

    #[test]
    fn test_monotonic_once_unsealed() {
        let clock = ManualClock::new(base());
        let gate = DisclosureGate::new(clock.clone());
        let open = base() + TimeDelta::seconds(2);

        assert!(gate.evaluate_at(open).is_sealed());
        clock.advance(std::time::Duration::from_secs(2));
        assert_eq!(gate.evaluate_at(open), Disclosure::Unsealed);
        clock.advance(std::time::Duration::from_secs(60));
        assert_eq!(gate.evaluate_at(open), Disclosure::Unsealed);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(Disclosure::Unsealed).unwrap();
        assert_eq!(json, serde_json::json!({"state": "unsealed"}));
    }
}

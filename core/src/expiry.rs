#![deny(missing_docs)]

//! # Expiry Urgency
//!
//! Single shared classifier for how close an expiry date is. Every rendering
//! surface must go through [`classify`] so rounding and band boundaries agree.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Width of the expiring-soon window, inclusive on both ends.
pub const SOON_WINDOW_DAYS: i64 = 7;

/// Milliseconds per day; day counts are ceilings in this unit.
pub const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Smallest day count reported while the date has not passed.
pub const MIN_DAYS_REMAINING: i64 = 1;

/// Urgency band of an expiry date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExpiryBand {
    /// No expiry date recorded.
    Undefined,
    /// The expiry date is strictly in the past.
    Expired,
    /// Expires within the next seven days (now included).
    ExpiringSoon,
    /// Expires later than that.
    Valid,
}

impl ExpiryBand {
    /// Stable lower-case label.
    pub fn label(self) -> &'static str {
        match self {
            ExpiryBand::Undefined => "undefined",
            ExpiryBand::Expired => "expired",
            ExpiryBand::ExpiringSoon => "expiring-soon",
            ExpiryBand::Valid => "valid",
        }
    }
}

impl Display for ExpiryBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Derived expiry state. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryStatus {
    /// Whole days until expiry, rounded up; `None` when there is no date.
    pub days_remaining: Option<i64>,
    /// Urgency band.
    pub band: ExpiryBand,
}

impl ExpiryStatus {
    /// True when the band calls for attention (expired or expiring soon).
    pub fn is_actionable(&self) -> bool {
        matches!(self.band, ExpiryBand::Expired | ExpiryBand::ExpiringSoon)
    }
}

/// Classifies `expiry` relative to `now`.
///
/// - no date: `Undefined`
/// - `expiry < now`: `Expired`, with zero or negative days
/// - `now <= expiry <= now + 7 days`: `ExpiringSoon`
/// - otherwise `Valid`
///
/// Days are the ceiling of the real-valued difference, and never drop below one
/// while the date has not passed, so a date a few hours away reads as one day.
pub fn classify(expiry: Option<DateTime<Utc>>, now: DateTime<Utc>) -> ExpiryStatus {
    let Some(expiry) = expiry else {
        return ExpiryStatus {
            days_remaining: None,
            band: ExpiryBand::Undefined,
        };
    };

    let days = ceil_days(expiry - now);

    if expiry < now {
        return ExpiryStatus {
            days_remaining: Some(days),
            band: ExpiryBand::Expired,
        };
    }

    let band = if expiry - now <= TimeDelta::milliseconds(SOON_WINDOW_DAYS * MILLIS_PER_DAY) {
        ExpiryBand::ExpiringSoon
    } else {
        ExpiryBand::Valid
    };

    ExpiryStatus {
        days_remaining: Some(days.max(MIN_DAYS_REMAINING)),
        band,
    }
}

/// The classifier's constants as template values.
///
/// Generated code that re-derives a band (e.g. client-side markup) must read the
/// window, day unit, rounding floor and band names from here.
pub fn template_values() -> Vec<(&'static str, String)> {
    vec![
        ("millis_per_day", MILLIS_PER_DAY.to_string()),
        ("soon_window_days", SOON_WINDOW_DAYS.to_string()),
        ("soon_window_ms", (SOON_WINDOW_DAYS * MILLIS_PER_DAY).to_string()),
        ("min_days_remaining", MIN_DAYS_REMAINING.to_string()),
        ("band_undefined", ExpiryBand::Undefined.label().to_string()),
        ("band_expired", ExpiryBand::Expired.label().to_string()),
        ("band_expiring_soon", ExpiryBand::ExpiringSoon.label().to_string()),
        ("band_valid", ExpiryBand::Valid.label().to_string()),
    ]
}

fn ceil_days(delta: TimeDelta) -> i64 {
    let ms = delta.num_milliseconds();
    let whole = ms.div_euclid(MILLIS_PER_DAY);
    if ms.rem_euclid(MILLIS_PER_DAY) == 0 {
        whole
    } else {
        whole + 1
    }
}

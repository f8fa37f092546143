//! Locale rendering for expiry output (es-DO conventions).

use chrono::{DateTime, Datelike, Utc};
use ncf_patch_core::{ExpiryBand, ExpiryStatus};

/// Day/month/year without padding, as `toLocaleDateString('es-DO')` prints it.
pub fn es_do_date(date: &DateTime<Utc>) -> String {
    format!("{}/{}/{}", date.day(), date.month(), date.year())
}

/// `1 día`, `3 días`, `-2 días`.
pub fn days_label(days: i64) -> String {
    if days.abs() == 1 {
        format!("{} día", days)
    } else {
        format!("{} días", days)
    }
}

/// Spanish label of a band.
pub fn band_label(band: ExpiryBand) -> &'static str {
    match band {
        ExpiryBand::Undefined => "No definida",
        ExpiryBand::Expired => "Vencida",
        ExpiryBand::ExpiringSoon => "Por vencer",
        ExpiryBand::Valid => "Vigente",
    }
}

/// One line of `expiry` output.
pub fn expiry_line(input: &str, date: Option<&DateTime<Utc>>, status: &ExpiryStatus) -> String {
    let shown = date.map_or_else(|| "-".to_string(), es_do_date);
    let days = status
        .days_remaining
        .map_or_else(String::new, |d| format!(" ({})", days_label(d)));
    format!(
        "{:<12} {:<10} {:<13} {}{}",
        input,
        shown,
        status.band.label(),
        band_label(status.band),
        days
    )
}

#![deny(missing_docs)]

//! # Expiry Command
//!
//! Classifies expiry dates with the shared core classifier and prints them the way
//! the point-of-sale screens show them.

use crate::display::expiry_line;
use crate::error::CliResult;
use chrono::{DateTime, NaiveDate, Utc};
use ncf_patch_core::{classify, ExpiryStatus};
use serde::Serialize;

/// Arguments for the expiry command.
#[derive(clap::Args, Debug, Clone)]
pub struct ExpiryArgs {
    /// Reference instant (RFC 3339). Defaults to the current time.
    #[clap(long, value_parser = parse_instant)]
    pub now: Option<DateTime<Utc>>,

    /// Print JSON instead of a table.
    #[clap(long)]
    pub json: bool,

    /// Expiry dates as `YYYY-MM-DD` or RFC 3339; `-` stands for a missing date.
    #[clap(required = true, value_parser = parse_expiry)]
    pub dates: Vec<Expiry>,
}

/// A parsed command-line expiry date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expiry {
    /// The argument as given.
    pub input: String,
    /// The instant, if one was given.
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct Row<'a> {
    input: &'a str,
    date: Option<DateTime<Utc>>,
    #[serde(flatten)]
    status: ExpiryStatus,
}

fn parse_instant(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| format!("invalid RFC 3339 instant `{}`: {}", s, e))
}

/// Parses `-`, a calendar date (midnight UTC, as browsers read `<input type="date">`)
/// or an RFC 3339 instant.
fn parse_expiry(s: &str) -> Result<Expiry, String> {
    let date = if s == "-" {
        None
    } else if let Ok(day) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        day.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc())
    } else {
        Some(parse_instant(s)?)
    };
    Ok(Expiry {
        input: s.to_string(),
        date,
    })
}

/// Classifies every date and prints the result.
pub fn execute(args: &ExpiryArgs) -> CliResult<Vec<ExpiryStatus>> {
    let now = args.now.unwrap_or_else(Utc::now);
    let statuses: Vec<ExpiryStatus> = args.dates.iter().map(|e| classify(e.date, now)).collect();

    if args.json {
        let rows: Vec<Row<'_>> = args
            .dates
            .iter()
            .zip(&statuses)
            .map(|(e, s)| Row {
                input: &e.input,
                date: e.date,
                status: *s,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        for (e, s) in args.dates.iter().zip(&statuses) {
            println!("{}", expiry_line(&e.input, e.date.as_ref(), s));
        }
    }

    Ok(statuses)
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

/// Garmin reports `startTimeGMT` as a naive "YYYY-MM-DD HH:MM:SS" string.
const GARMIN_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse a Garmin GMT timestamp into UTC.
pub fn parse_garmin_gmt(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, GARMIN_TIME_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

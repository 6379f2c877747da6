// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Creation-time filter parsing.
//!
//! Filters are given as a prefix of `YYYYMMDDhhmmss`. Missing month and day default to `01`,
//! missing time-of-day fields default to `0`. The result is interpreted in the local timezone.

use chrono::{Local, NaiveDateTime, TimeZone};

use crate::error::ConfigError;

/// Timestamp returned for an empty filter: no bound on that side of the window.
pub const UNBOUNDED: i64 = 0;

const FULL_LAYOUT: &str = "%Y%m%d%H%M%S";
const FULL_LEN: usize = 14;
const MIN_LEN: usize = 4;
const DISPLAY_LAYOUT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Parses a partial `YYYYMMDDhhmmss` date string into milliseconds since the epoch.
///
/// # Returns
///
/// * `Ok(0)` - for an empty string
/// * `Ok(millis)` - the local-time instant the padded string denotes
/// * `Err(ConfigError::InvalidTimeFormat)` - for fewer than 4 characters, non-digits, more than
///   14 digits, out-of-range fields, or a local time that does not exist
///
/// # Examples
///
/// ```
/// use cwlogs_core::time_filter::parse_time;
///
/// assert_eq!(parse_time("").unwrap(), 0);
/// assert!(parse_time("202").is_err());
/// assert!(parse_time("2023").unwrap() > 0);
/// ```
pub fn parse_time(input: &str) -> Result<i64, ConfigError> {
    if input.is_empty() {
        return Ok(UNBOUNDED);
    }

    let invalid = || ConfigError::InvalidTimeFormat(input.to_string());

    if input.len() < MIN_LEN || !input.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let mut digits = input.to_string();
    if digits.len() == 4 {
        digits.push_str("01");
    }
    if digits.len() == 6 {
        digits.push_str("01");
    }
    if digits.len() < FULL_LEN {
        digits = format!("{digits:0<width$}", width = FULL_LEN);
    }

    let naive = NaiveDateTime::parse_from_str(&digits, FULL_LAYOUT).map_err(|_| invalid())?;
    // A wall-clock time repeated by a DST fold resolves to its first occurrence.
    let local = Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(invalid)?;

    Ok(local.timestamp_millis())
}

/// Formats epoch milliseconds as `YYYY-MM-DD hh:mm:ss.mmm` in the local timezone.
pub fn format_millis(millis: i64) -> String {
    match Local.timestamp_millis_opt(millis).earliest() {
        Some(t) => t.format(DISPLAY_LAYOUT).to_string(),
        None => millis.to_string(),
    }
}

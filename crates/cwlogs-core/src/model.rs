// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::time_filter::{parse_time, UNBOUNDED};

/// Characters that would split a stream name into directories.
const PATH_SEPARATORS: [char; 2] = ['/', '\\'];

/// One log stream selected for processing.
///
/// Built by the lister and handed, by value, to exactly one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamDescriptor {
    pub group_name: String,
    pub stream_name: String,
    pub file_path: PathBuf,
    /// Milliseconds since the epoch.
    pub creation_time: i64,
    /// Milliseconds since the epoch, 0 when the stream has no events.
    pub last_event_time: i64,
    pub stored_bytes: u64,
}

/// Inclusive creation-time bounds in epoch milliseconds. A bound of 0 is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeWindow {
    pub from: i64,
    pub to: i64,
}

impl TimeWindow {
    /// Builds a window, refusing one whose lower bound is after its upper bound.
    pub fn new(from: i64, to: i64) -> Result<Self, ConfigError> {
        if from > UNBOUNDED && to > UNBOUNDED && from > to {
            return Err(ConfigError::InvertedTimeWindow { from, to });
        }
        Ok(Self { from, to })
    }

    /// Parses both bounds with [`parse_time`] and validates their order.
    pub fn parse(from: &str, to: &str) -> Result<Self, ConfigError> {
        Self::new(parse_time(from)?, parse_time(to)?)
    }

    pub fn contains(&self, creation_time: i64) -> bool {
        if self.from > UNBOUNDED && creation_time < self.from {
            return false;
        }
        if self.to > UNBOUNDED && creation_time > self.to {
            return false;
        }
        true
    }
}

/// Local file name for a stream: separators become underscores.
///
/// Names that would resolve to the output directory or its parent (empty, `.` and `..`)
/// become the same number of underscores, at least one.
pub fn output_file_name(stream_name: &str) -> String {
    match stream_name {
        "" | "." => "_".to_string(),
        ".." => "__".to_string(),
        _ => stream_name.replace(&PATH_SEPARATORS[..], "_"),
    }
}

pub fn output_file_path(output_dir: &Path, stream_name: &str) -> PathBuf {
    output_dir.join(output_file_name(stream_name))
}

/// A stream as reported by `DescribeLogStreams`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogStream {
    pub log_stream_name: String,
    #[serde(default)]
    pub creation_time: i64,
    #[serde(default)]
    pub first_event_timestamp: Option<i64>,
    #[serde(default)]
    pub last_event_timestamp: Option<i64>,
    #[serde(default)]
    pub last_ingestion_time: Option<i64>,
    #[serde(default)]
    pub stored_bytes: u64,
    #[serde(default)]
    pub arn: Option<String>,
}

/// One page of `DescribeLogStreams`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogStreamPage {
    #[serde(default)]
    pub log_streams: Vec<LogStream>,
    #[serde(default)]
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub ingestion_time: i64,
}

/// One page of `GetLogEvents`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEventPage {
    #[serde(default)]
    pub events: Vec<LogEvent>,
    #[serde(default)]
    pub next_forward_token: Option<String>,
    #[serde(default)]
    pub next_backward_token: Option<String>,
}

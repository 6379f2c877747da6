// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::model::TimeWindow;

pub const DEFAULT_GROUP_NAME: &str = "/aws/batch/job";
pub const DEFAULT_WORKERS: usize = 3;
/// Streams discovered ahead of the workers before the lister has to wait.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;
pub const DEFAULT_LOG_LEVEL: &str = "info";

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Configuration for one listing/download run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Where stream files are written. Required unless `list_only`.
    pub output_dir: Option<PathBuf>,
    pub group_name: String,
    /// Stream name prefix passed to `DescribeLogStreams`.
    pub prefix: String,
    pub window: TimeWindow,
    /// Only list matching streams and tally their sizes.
    pub list_only: bool,
    pub workers: usize,
    pub queue_capacity: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            group_name: DEFAULT_GROUP_NAME.to_string(),
            prefix: String::new(),
            window: TimeWindow::default(),
            list_only: false,
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl FetchConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.group_name.trim().is_empty() {
            return Err(ConfigError::MissingGroup);
        }

        if self.prefix.is_empty() {
            return Err(ConfigError::MissingPrefix);
        }

        if !self.list_only && self.output_dir().is_none() {
            return Err(ConfigError::MissingOutputDir);
        }

        // Re-check in case the window was built field by field.
        TimeWindow::new(self.window.from, self.window.to)?;

        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }

        if self.queue_capacity == 0 {
            return Err(ConfigError::NoQueueCapacity);
        }

        Ok(())
    }

    /// The output directory, ignoring an empty path.
    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir
            .as_deref()
            .filter(|dir| !dir.as_os_str().is_empty())
    }
}

/// Normalizes and checks a log level name.
pub fn parse_log_level(level: &str) -> Result<String, ConfigError> {
    let level = level.trim().to_lowercase();
    if VALID_LOG_LEVELS.contains(&level.as_str()) {
        Ok(level)
    } else {
        Err(ConfigError::InvalidLogLevel(level))
    }
}

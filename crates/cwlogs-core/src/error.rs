// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

/// Errors detected before any remote call is made. All of them abort the run.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Please specify a log stream name prefix with --prefix")]
    MissingPrefix,

    #[error("Please specify a Log Group Name with --group")]
    MissingGroup,

    #[error("Please specify a output directory with --dir")]
    MissingOutputDir,

    #[error("Invalid date format: '{0}'")]
    InvalidTimeFormat(String),

    #[error("From time can't be greater than to time ({from} > {to})")]
    InvertedTimeWindow { from: i64, to: i64 },

    #[error("Worker count must be greater than 0")]
    NoWorkers,

    #[error("Queue capacity must be greater than 0")]
    NoQueueCapacity,

    #[error("No valid credential information in the environment")]
    CredentialsNotFound,

    #[error("Invalid proxy URL '{url}': {reason}")]
    InvalidProxy { url: String, reason: String },

    #[error("Invalid endpoint URL '{0}'")]
    InvalidEndpoint(String),

    #[error("Invalid log level '{0}'. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),
}

/// Failure of a single CloudWatch Logs request.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{code} (HTTP {status}): {message}")]
    Service {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Failed to sign request: {0}")]
    Signing(String),
}

/// Why a single page of a pagination sequence could not be completed.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Failed to write to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Work queue closed before all streams were handed out")]
    QueueClosed,
}

/// Errors that stop a whole run.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Statistics service unavailable: {0}")]
    Stats(String),
}

// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! # cwlogs-core
//!
//! Concurrent listing and download of CloudWatch Logs streams.
//!
//! ## Pipeline
//!
//! ```text
//!   Orchestrator
//!       │
//!       v
//!   StreamLister ──(DescribeLogStreams pages)──┐
//!       │                                      │
//!       v                                      │
//!   bounded queue of StreamDescriptor          │
//!       │                                      │
//!       v                                      │
//!   WorkerPool (N tasks) ──> StreamDownloader ─┴─(GetLogEvents pages)──> files
//!       │
//!       v
//!   StatsService (RunStatistics)
//! ```
//!
//! - [`time_filter`]: partial date strings to millisecond bounds
//! - [`lister`]: paginates `DescribeLogStreams` and feeds the queue
//! - [`downloader`]: drains one stream through `GetLogEvents`
//! - [`worker_pool`]: fixed set of workers consuming the queue
//! - [`stats`]: message-driven owner of the run counters
//! - [`orchestrator`]: wires everything together for one run
//! - [`client`] / [`cloudwatch`] / [`sigv4`]: the remote API seam and its HTTP implementation

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod client;
pub mod cloudwatch;
pub mod config;
pub mod credentials;
pub mod downloader;
pub mod error;
pub mod http;
pub mod humanize;
pub mod lister;
pub mod model;
pub mod orchestrator;
pub mod pagination;
pub mod sigv4;
pub mod stats;
pub mod time_filter;
pub mod worker_pool;

pub use config::FetchConfig;
pub use error::{ApiError, ConfigError, FetchError, PageError};
pub use model::{StreamDescriptor, TimeWindow};
pub use orchestrator::Orchestrator;
pub use stats::RunStatistics;

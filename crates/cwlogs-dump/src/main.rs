// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! List or download the CloudWatch Logs streams of a log group.
//!
//! ```bash
//! # Download every stream under job/default created in March 2023
//! cwlogs-dump --dir ./logs --prefix job/default --from 202303 --to 202304
//!
//! # Only list them, with eight workers tallying sizes
//! cwlogs-dump --list --prefix job/default -p 8
//! ```

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use cwlogs_core::{
    cloudwatch::CloudWatchLogsClient,
    config::{
        parse_log_level, DEFAULT_GROUP_NAME, DEFAULT_LOG_LEVEL, DEFAULT_QUEUE_CAPACITY,
        DEFAULT_WORKERS,
    },
    credentials, http, humanize, ConfigError, FetchConfig, Orchestrator, RunStatistics,
    TimeWindow,
};

/// List and download CloudWatch Logs streams
#[derive(Parser, Debug)]
#[command(name = "cwlogs-dump")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Output directory, created if missing (required unless --list)
    #[arg(long, value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Log group name
    #[arg(long, default_value = DEFAULT_GROUP_NAME)]
    group: String,

    /// Log stream name prefix
    #[arg(long)]
    prefix: String,

    /// HTTP(S) proxy URL
    #[arg(long, env = "HTTPS_PROXY", value_name = "URL")]
    proxy: Option<String>,

    /// Earliest stream creation time, YYYY[MM[DD[hh[mm[ss]]]]] local time
    #[arg(long, value_name = "TIME")]
    from: Option<String>,

    /// Latest stream creation time, YYYY[MM[DD[hh[mm[ss]]]]] local time
    #[arg(long, value_name = "TIME")]
    to: Option<String>,

    /// Only list matching streams and their total size
    #[arg(long)]
    list: bool,

    /// Number of concurrent workers
    #[arg(short = 'p', long, default_value_t = DEFAULT_WORKERS)]
    process: usize,

    /// Streams discovered ahead of the workers before listing waits
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    queue_capacity: usize,

    /// AWS region (defaults to the profile or environment region)
    #[arg(long)]
    region: Option<String>,

    /// Override the CloudWatch Logs endpoint URL
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "CWLOGS_LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    log_level: String,

    /// HTTP request timeout in seconds
    #[arg(long, default_value_t = 30, value_name = "SECONDS")]
    timeout: u64,
}

impl Args {
    fn fetch_config(&self) -> Result<FetchConfig, ConfigError> {
        let window = TimeWindow::parse(
            self.from.as_deref().unwrap_or_default(),
            self.to.as_deref().unwrap_or_default(),
        )?;

        let config = FetchConfig {
            output_dir: self.dir.clone(),
            group_name: self.group.clone(),
            prefix: self.prefix.clone(),
            window,
            list_only: self.list,
            workers: self.process,
            queue_capacity: self.queue_capacity,
        };
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
pub async fn main() -> ExitCode {
    let args = Args::parse();

    let log_level = match parse_log_level(&args.log_level) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let env_filter = format!("h2=off,hyper=off,rustls=off,{}", log_level);

    #[allow(clippy::expect_used)]
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(env_filter).expect("could not parse log level in configuration"),
        )
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .without_time()
        .finish();

    #[allow(clippy::expect_used)]
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    debug!("Logging subsystem enabled");
    println!("AWS CloudWatch log {}", env!("CARGO_PKG_VERSION"));

    match run(&args).await {
        Ok(stats) => {
            println!();
            println!("{}", humanize::summary_line(&stats));
            println!("Finished.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> Result<RunStatistics> {
    let config = args.fetch_config()?;
    let client = logs_client(args, |key| std::env::var(key).ok())?;
    info!(
        "Reading {} from {} with {} workers",
        config.group_name,
        client.endpoint(),
        config.workers
    );

    Ok(Orchestrator::new(config, Arc::new(client)).run().await?)
}

/// Resolves credentials and region through `env` and builds the CloudWatch Logs client.
fn logs_client<F>(args: &Args, env: F) -> Result<CloudWatchLogsClient>
where
    F: Fn(&str) -> Option<String>,
{
    let credentials = credentials::resolve_with(&env)?;
    let region = credentials::resolve_region(args.region.as_deref(), &credentials, &env);

    let http_client = http::build_client(args.proxy.as_deref(), Duration::from_secs(args.timeout))?;
    Ok(CloudWatchLogsClient::new(
        http_client,
        credentials,
        &region,
        args.endpoint.as_deref(),
    )?)
}

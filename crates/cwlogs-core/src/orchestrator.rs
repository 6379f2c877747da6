// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::client::LogsApi;
use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::lister::StreamLister;
use crate::stats::{RunStatistics, StatsService};
use crate::worker_pool::WorkerPool;

/// Runs one listing/download pass.
///
/// Listing happens on the calling task while the worker pool drains the queue in the
/// background. The run only fails for configuration problems detected before the first
/// API call; page and stream failures are logged and counted instead.
pub struct Orchestrator {
    config: Arc<FetchConfig>,
    client: Arc<dyn LogsApi>,
}

impl Orchestrator {
    pub fn new(config: FetchConfig, client: Arc<dyn LogsApi>) -> Self {
        Self {
            config: Arc::new(config),
            client,
        }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    pub async fn run(self) -> Result<RunStatistics, FetchError> {
        self.config.validate()?;

        if !self.config.list_only {
            if let Some(dir) = self.config.output_dir() {
                tokio::fs::create_dir_all(dir)
                    .await
                    .map_err(|source| FetchError::OutputDir {
                        path: dir.to_path_buf(),
                        source,
                    })?;
            }
        }

        let (service, stats) = StatsService::new();
        let stats_task = tokio::spawn(service.run());

        let (tx, rx) = mpsc::channel(self.config.queue_capacity);
        let pool = WorkerPool::spawn(
            self.config.workers,
            rx,
            Arc::clone(&self.client),
            self.config.list_only,
            stats.clone(),
        );

        let mut lister = StreamLister::new(Arc::clone(&self.client), Arc::clone(&self.config));
        let listing = lister.list_all(&tx).await;
        if listing.failed {
            warn!(
                "Listing of {} stopped early; processing the {} streams found so far",
                self.config.group_name, listing.streams_queued
            );
        }

        // Closing the queue lets the workers exit once it is drained.
        drop(tx);
        let pool_report = pool.join().await;
        debug!(
            "Workers finished: {} processed, {} failed, {} panicked",
            pool_report.processed, pool_report.failed, pool_report.panicked
        );

        let snapshot = stats.snapshot().await.map_err(FetchError::Stats);
        if stats.shutdown().is_err() {
            debug!("Stats service already stopped");
        }
        if let Err(e) = stats_task.await {
            error!("Stats service task failed: {:?}", e);
        }

        let snapshot = snapshot?;
        if snapshot.failed_streams > 0 {
            warn!("{} streams failed to download", snapshot.failed_streams);
        }
        info!(
            "Processed {} streams, {} events written",
            snapshot.file_count, snapshot.events_written
        );
        Ok(snapshot)
    }
}

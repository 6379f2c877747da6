// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Fixed set of long-lived workers draining the descriptor queue.
//!
//! Every worker owns the file of the descriptor it is processing; the queue and the stats
//! service are the only things the workers share. A worker exits once the queue is closed
//! and empty.

use std::fs::FileTimes;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::fs::OpenOptions;
use tokio::io::BufWriter;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use crate::client::LogsApi;
use crate::downloader::{DownloadReport, StreamDownloader};
use crate::error::PageError;
use crate::model::StreamDescriptor;
use crate::stats::StatsHandle;

type SharedQueue = Arc<Mutex<mpsc::Receiver<StreamDescriptor>>>;

/// Totals across all workers.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PoolReport {
    pub processed: u64,
    pub failed: u64,
    /// Workers that panicked instead of returning.
    pub panicked: u64,
}

pub struct WorkerPool {
    workers: JoinSet<PoolReport>,
}

impl WorkerPool {
    /// Spawns `size` workers sharing `queue`.
    pub fn spawn(
        size: usize,
        queue: mpsc::Receiver<StreamDescriptor>,
        client: Arc<dyn LogsApi>,
        list_only: bool,
        stats: StatsHandle,
    ) -> Self {
        let queue: SharedQueue = Arc::new(Mutex::new(queue));
        let mut workers = JoinSet::new();

        for id in 0..size {
            let worker = Worker {
                id,
                queue: Arc::clone(&queue),
                downloader: StreamDownloader::new(Arc::clone(&client)),
                list_only,
                stats: stats.clone(),
            };
            workers.spawn(worker.run());
        }
        debug!("Started {} workers", size);

        Self { workers }
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Waits for every worker to drain the queue and exit.
    pub async fn join(mut self) -> PoolReport {
        let mut total = PoolReport::default();

        while let Some(finished) = self.workers.join_next().await {
            match finished {
                Ok(report) => {
                    total.processed += report.processed;
                    total.failed += report.failed;
                }
                Err(e) if e.is_panic() => {
                    error!("Worker panicked: {:?}", e);
                    total.panicked += 1;
                }
                Err(e) => error!("Worker task failed: {:?}", e),
            }
        }

        total
    }
}

struct Worker {
    id: usize,
    queue: SharedQueue,
    downloader: StreamDownloader,
    list_only: bool,
    stats: StatsHandle,
}

impl Worker {
    async fn run(self) -> PoolReport {
        let mut report = PoolReport::default();

        loop {
            let next = self.queue.lock().await.recv().await;
            let Some(descriptor) = next else {
                break;
            };

            report.processed += 1;
            if !self.process(descriptor).await {
                report.failed += 1;
            }
        }

        debug!(
            "Worker {} done: {} streams, {} failed",
            self.id, report.processed, report.failed
        );
        report
    }

    /// Returns false when the stream could not be fully downloaded.
    async fn process(&self, descriptor: StreamDescriptor) -> bool {
        if self.stats.stream_started(descriptor.stored_bytes).is_err() {
            warn!("Stats service stopped; {} is not counted", descriptor.stream_name);
        }

        if self.list_only {
            return true;
        }

        let (events, failed) = match self.download(&descriptor).await {
            Ok(report) => (report.events, report.failed),
            Err(e) => {
                error!("Failed to download {}: {}", descriptor.stream_name, e);
                (0, true)
            }
        };

        if self.stats.stream_finished(events, failed).is_err() {
            warn!("Stats service stopped; {} is not counted", descriptor.stream_name);
        }
        !failed
    }

    async fn download(&self, descriptor: &StreamDescriptor) -> Result<DownloadReport, PageError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&descriptor.file_path)
            .await
            .map_err(|source| PageError::Write {
                path: descriptor.file_path.clone(),
                source,
            })?;

        let mut out = BufWriter::new(file);
        let report = self.downloader.download(descriptor, &mut out).await;

        let file = out.into_inner().into_std().await;
        if let Err(e) = file.set_times(file_times(descriptor)) {
            warn!(
                "Failed to set times on {}: {}",
                descriptor.file_path.display(),
                e
            );
        }

        Ok(report)
    }
}

/// Access time is the stream's last event, modification time its creation.
fn file_times(descriptor: &StreamDescriptor) -> FileTimes {
    let last_event = if descriptor.last_event_time > 0 {
        descriptor.last_event_time
    } else {
        descriptor.creation_time
    };
    FileTimes::new()
        .set_accessed(system_time(last_event))
        .set_modified(system_time(descriptor.creation_time))
}

fn system_time(millis: i64) -> SystemTime {
    let offset = Duration::from_millis(millis.unsigned_abs());
    if millis >= 0 {
        UNIX_EPOCH + offset
    } else {
        UNIX_EPOCH - offset
    }
}

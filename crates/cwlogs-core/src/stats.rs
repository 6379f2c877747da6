// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error};

/// Totals for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStatistics {
    /// Streams handed to a worker.
    pub file_count: u64,
    /// Sum of the streams' stored bytes as reported by the service.
    pub total_bytes: u64,
    /// Streams whose download ended with an error.
    pub failed_streams: u64,
    /// Events appended to output files.
    pub events_written: u64,
}

#[derive(Debug)]
pub enum StatsCommand {
    /// A worker picked up a stream.
    StreamStarted { stored_bytes: u64 },
    /// A worker finished downloading a stream.
    StreamFinished { events_written: u64, failed: bool },
    Snapshot(oneshot::Sender<RunStatistics>),
    Shutdown,
}

/// Cheap to clone; every worker holds one.
#[derive(Clone, Debug)]
pub struct StatsHandle {
    tx: mpsc::UnboundedSender<StatsCommand>,
}

impl StatsHandle {
    pub fn stream_started(
        &self,
        stored_bytes: u64,
    ) -> Result<(), mpsc::error::SendError<StatsCommand>> {
        self.tx.send(StatsCommand::StreamStarted { stored_bytes })
    }

    pub fn stream_finished(
        &self,
        events_written: u64,
        failed: bool,
    ) -> Result<(), mpsc::error::SendError<StatsCommand>> {
        self.tx.send(StatsCommand::StreamFinished {
            events_written,
            failed,
        })
    }

    pub async fn snapshot(&self) -> Result<RunStatistics, String> {
        let (response_tx, response_rx) = oneshot::channel();
        self.tx
            .send(StatsCommand::Snapshot(response_tx))
            .map_err(|e| format!("Failed to send snapshot command: {}", e))?;

        response_rx
            .await
            .map_err(|e| format!("Failed to receive snapshot response: {}", e))
    }

    pub fn shutdown(&self) -> Result<(), mpsc::error::SendError<StatsCommand>> {
        self.tx.send(StatsCommand::Shutdown)
    }
}

/// Sole owner of [`RunStatistics`]; updates arrive as commands.
pub struct StatsService {
    stats: RunStatistics,
    rx: mpsc::UnboundedReceiver<StatsCommand>,
}

impl StatsService {
    pub fn new() -> (Self, StatsHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let service = Self {
            stats: RunStatistics::default(),
            rx,
        };
        (service, StatsHandle { tx })
    }

    pub async fn run(mut self) {
        debug!("Stats service started");

        while let Some(command) = self.rx.recv().await {
            match command {
                StatsCommand::StreamStarted { stored_bytes } => {
                    self.stats.file_count += 1;
                    self.stats.total_bytes = self.stats.total_bytes.saturating_add(stored_bytes);
                }

                StatsCommand::StreamFinished {
                    events_written,
                    failed,
                } => {
                    self.stats.events_written += events_written;
                    if failed {
                        self.stats.failed_streams += 1;
                    }
                }

                StatsCommand::Snapshot(response_tx) => {
                    if response_tx.send(self.stats).is_err() {
                        error!("Failed to send stats snapshot - receiver dropped");
                    }
                }

                StatsCommand::Shutdown => {
                    debug!("Stats service shutting down");
                    break;
                }
            }
        }

        debug!("Stats service stopped");
    }
}

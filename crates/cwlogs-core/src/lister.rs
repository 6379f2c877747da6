// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Stream discovery.
//!
//! Pages through `DescribeLogStreams`, keeps the streams created inside the configured
//! window and hands one [`StreamDescriptor`] per stream to the work queue. Sending waits
//! while the queue is full, so discovery never runs unboundedly ahead of the workers.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::client::{DescribeLogStreamsRequest, LogsApi};
use crate::config::FetchConfig;
use crate::error::PageError;
use crate::model::{output_file_name, output_file_path, LogStream, StreamDescriptor};
use crate::pagination::PageOutcome;
use crate::time_filter::format_millis;

/// What a complete listing pass did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ListingReport {
    pub pages: u64,
    pub streams_seen: u64,
    pub streams_queued: u64,
    /// Listing stopped on an error instead of running out of pages.
    pub failed: bool,
}

pub struct StreamLister {
    client: Arc<dyn LogsApi>,
    config: Arc<FetchConfig>,
    /// Output paths already handed out this run; each belongs to exactly one stream.
    issued: HashSet<PathBuf>,
}

impl StreamLister {
    pub fn new(client: Arc<dyn LogsApi>, config: Arc<FetchConfig>) -> Self {
        Self {
            client,
            config,
            issued: HashSet::new(),
        }
    }

    /// Fetches one page of streams starting at `cursor` and queues the matching ones.
    pub async fn list_page(
        &mut self,
        cursor: Option<String>,
        queue: &mpsc::Sender<StreamDescriptor>,
        report: &mut ListingReport,
    ) -> PageOutcome {
        let request = DescribeLogStreamsRequest {
            log_group_name: self.config.group_name.clone(),
            log_stream_name_prefix: Some(self.config.prefix.clone()),
            descending: true,
            next_token: cursor,
        };

        let page = match self.client.describe_log_streams(&request).await {
            Ok(page) => page,
            Err(e) => {
                error!(
                    "Failed to list log streams in {}: {}",
                    self.config.group_name, e
                );
                return PageOutcome::Failed(e.into());
            }
        };
        report.pages += 1;

        for stream in page.log_streams {
            report.streams_seen += 1;
            debug!("{:?}", stream);

            if !self.config.window.contains(stream.creation_time) {
                continue;
            }

            let descriptor = self.descriptor_for(stream);
            self.announce(&descriptor).await;

            if queue.send(descriptor).await.is_err() {
                error!("Work queue closed, stopping stream listing");
                return PageOutcome::Failed(PageError::QueueClosed);
            }
            report.streams_queued += 1;
        }

        match page.next_token {
            Some(token) => PageOutcome::HasMore(token),
            None => PageOutcome::Exhausted,
        }
    }

    /// Pages through every matching stream.
    pub async fn list_all(&mut self, queue: &mpsc::Sender<StreamDescriptor>) -> ListingReport {
        let mut report = ListingReport::default();
        let mut cursor = None;

        loop {
            match self.list_page(cursor, queue, &mut report).await {
                PageOutcome::HasMore(next) => cursor = Some(next),
                PageOutcome::Exhausted => break,
                PageOutcome::Failed(_) => {
                    report.failed = true;
                    break;
                }
            }
        }

        debug!(
            "Listing finished: {} pages, {} streams seen, {} queued",
            report.pages, report.streams_seen, report.streams_queued
        );
        report
    }

    fn descriptor_for(&mut self, stream: LogStream) -> StreamDescriptor {
        let file_path = self.claim_path(&stream.log_stream_name);
        StreamDescriptor {
            group_name: self.config.group_name.clone(),
            file_path,
            creation_time: stream.creation_time,
            last_event_time: stream.last_event_timestamp.unwrap_or_default(),
            stored_bytes: stream.stored_bytes,
            stream_name: stream.log_stream_name,
        }
    }

    /// Derives the stream's output path. Names that map onto a path another stream already
    /// holds get a numeric suffix: `job_a`, `job_a.1`, `job_a.2`.
    fn claim_path(&mut self, stream_name: &str) -> PathBuf {
        let dir = self.config.output_dir().unwrap_or_else(|| Path::new(""));
        let mut path = output_file_path(dir, stream_name);

        if self.issued.contains(&path) {
            let base = output_file_name(stream_name);
            let mut n = 1u32;
            while self.issued.contains(&path) {
                path = dir.join(format!("{base}.{n}"));
                n += 1;
            }
            warn!(
                "{} maps onto the file of another stream, writing {} instead",
                stream_name,
                path.display()
            );
        }

        self.issued.insert(path.clone());
        path
    }

    /// Prints the stream in list mode; otherwise clears any previous download of it.
    async fn announce(&self, descriptor: &StreamDescriptor) {
        let name = descriptor
            .file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| output_file_name(&descriptor.stream_name));
        let created = format_millis(descriptor.creation_time);

        if self.config.list_only {
            println!("{} {}", name, created);
            return;
        }

        info!("get {} {}", name, created);
        match tokio::fs::remove_file(&descriptor.file_path).await {
            Ok(()) => debug!("Removed previous {}", descriptor.file_path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                "Failed to remove previous {}: {}",
                descriptor.file_path.display(),
                e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::{stream, ScriptedLogsApi};
    use crate::error::ApiError;
    use crate::model::{LogStreamPage, TimeWindow};
    use std::path::PathBuf;
    use std::time::Duration;
    use tracing_test::traced_test;

    fn page(streams: Vec<LogStream>, next_token: Option<&str>) -> LogStreamPage {
        LogStreamPage {
            log_streams: streams,
            next_token: next_token.map(str::to_string),
        }
    }

    fn list_config(window: TimeWindow) -> Arc<FetchConfig> {
        Arc::new(FetchConfig {
            prefix: "job".to_string(),
            list_only: true,
            window,
            ..Default::default()
        })
    }

    fn download_config(dir: &Path) -> Arc<FetchConfig> {
        Arc::new(FetchConfig {
            prefix: "job".to_string(),
            output_dir: Some(dir.to_path_buf()),
            ..Default::default()
        })
    }

    fn drain(rx: &mut mpsc::Receiver<StreamDescriptor>) -> Vec<StreamDescriptor> {
        let mut out = Vec::new();
        while let Ok(descriptor) = rx.try_recv() {
            out.push(descriptor);
        }
        out
    }

    #[tokio::test]
    async fn test_request_shape() {
        let api = Arc::new(ScriptedLogsApi::new());
        let mut lister = StreamLister::new(api.clone(), list_config(TimeWindow::default()));
        let (tx, _rx) = mpsc::channel(10);

        let outcome = lister
            .list_page(None, &tx, &mut ListingReport::default())
            .await;

        assert!(matches!(outcome, PageOutcome::Exhausted));
        let requests = api.describe_requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].log_group_name, "/aws/batch/job");
        assert_eq!(requests[0].log_stream_name_prefix.as_deref(), Some("job"));
        assert!(requests[0].descending);
        assert_eq!(requests[0].next_token, None);
    }

    #[tokio::test]
    async fn test_filters_by_creation_window() {
        let api = Arc::new(ScriptedLogsApi::new().with_stream_page(Ok(page(
            vec![
                stream("job/early", 99, 1),
                stream("job/from", 100, 2),
                stream("job/mid", 150, 3),
                stream("job/to", 200, 4),
                stream("job/late", 201, 5),
            ],
            None,
        ))));
        let mut lister = StreamLister::new(api, list_config(TimeWindow::new(100, 200).unwrap()));
        let (tx, mut rx) = mpsc::channel(10);

        let report = lister.list_all(&tx).await;

        let names: Vec<String> = drain(&mut rx).into_iter().map(|d| d.stream_name).collect();
        assert_eq!(names, vec!["job/from", "job/mid", "job/to"]);
        assert_eq!(report.streams_seen, 5);
        assert_eq!(report.streams_queued, 3);
        assert!(!report.failed);
    }

    #[tokio::test]
    async fn test_follows_continuation_tokens() {
        let api = Arc::new(
            ScriptedLogsApi::new()
                .with_stream_page(Ok(page(vec![stream("job/1", 1, 1)], Some("t1"))))
                .with_stream_page(Ok(page(vec![stream("job/2", 2, 1)], Some("t2"))))
                .with_stream_page(Ok(page(vec![stream("job/3", 3, 1)], None))),
        );
        let mut lister = StreamLister::new(api.clone(), list_config(TimeWindow::default()));
        let (tx, mut rx) = mpsc::channel(10);

        let report = lister.list_all(&tx).await;

        assert_eq!(report.pages, 3);
        assert_eq!(drain(&mut rx).len(), 3);
        let tokens: Vec<Option<String>> = api
            .describe_requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.next_token.clone())
            .collect();
        assert_eq!(
            tokens,
            vec![None, Some("t1".to_string()), Some("t2".to_string())]
        );
    }

    #[tokio::test]
    #[traced_test]
    async fn test_request_failure_stops_listing() {
        let api = Arc::new(
            ScriptedLogsApi::new()
                .with_stream_page(Ok(page(vec![stream("job/1", 1, 1)], Some("t1"))))
                .with_stream_page(Err(ApiError::Service {
                    status: 400,
                    code: "ThrottlingException".to_string(),
                    message: "Rate exceeded".to_string(),
                }))
                .with_stream_page(Ok(page(vec![stream("job/never", 1, 1)], None))),
        );
        let mut lister = StreamLister::new(api.clone(), list_config(TimeWindow::default()));
        let (tx, mut rx) = mpsc::channel(10);

        let report = lister.list_all(&tx).await;

        assert!(report.failed);
        assert_eq!(api.describe_calls(), 2);
        let names: Vec<String> = drain(&mut rx).into_iter().map(|d| d.stream_name).collect();
        assert_eq!(names, vec!["job/1"]);
        assert!(logs_contain("Failed to list log streams"));
    }

    #[tokio::test]
    async fn test_descriptor_fields() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = stream("job/default/abc", 1_000, 42);
        s.last_event_timestamp = Some(2_000);
        let api = Arc::new(ScriptedLogsApi::new().with_stream_page(Ok(page(vec![s], None))));
        let mut lister = StreamLister::new(api, download_config(dir.path()));
        let (tx, mut rx) = mpsc::channel(10);

        lister.list_all(&tx).await;

        let descriptors = drain(&mut rx);
        assert_eq!(
            descriptors,
            vec![StreamDescriptor {
                group_name: "/aws/batch/job".to_string(),
                stream_name: "job/default/abc".to_string(),
                file_path: dir.path().join("job_default_abc"),
                creation_time: 1_000,
                last_event_time: 2_000,
                stored_bytes: 42,
            }]
        );
    }

    #[tokio::test]
    #[traced_test]
    async fn test_colliding_names_get_distinct_paths() {
        let dir = tempfile::tempdir().unwrap();
        let api = Arc::new(ScriptedLogsApi::new().with_stream_page(Ok(page(
            vec![
                stream("job/a", 3, 1),
                stream("job_a", 2, 1),
                stream("job\\a", 1, 1),
            ],
            None,
        ))));
        let mut lister = StreamLister::new(api, download_config(dir.path()));
        let (tx, mut rx) = mpsc::channel(10);

        lister.list_all(&tx).await;

        let paths: Vec<PathBuf> = drain(&mut rx).into_iter().map(|d| d.file_path).collect();
        assert_eq!(
            paths,
            vec![
                dir.path().join("job_a"),
                dir.path().join("job_a.1"),
                dir.path().join("job_a.2"),
            ]
        );
        assert!(logs_contain("maps onto the file of another stream"));
    }

    #[tokio::test]
    async fn test_download_mode_removes_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let stale = dir.path().join("job_a");
        std::fs::write(&stale, "stale content\n").unwrap();
        let api = Arc::new(
            ScriptedLogsApi::new().with_stream_page(Ok(page(vec![stream("job/a", 1, 1)], None))),
        );
        let mut lister = StreamLister::new(api, download_config(dir.path()));
        let (tx, _rx) = mpsc::channel(10);

        lister.list_all(&tx).await;

        assert!(!stale.exists());
    }

    #[tokio::test]
    async fn test_list_mode_leaves_files_alone() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("job_a");
        std::fs::write(&existing, "keep\n").unwrap();
        let api = Arc::new(
            ScriptedLogsApi::new().with_stream_page(Ok(page(vec![stream("job/a", 1, 1)], None))),
        );
        let config = Arc::new(FetchConfig {
            prefix: "job".to_string(),
            output_dir: Some(PathBuf::from(dir.path())),
            list_only: true,
            ..Default::default()
        });
        let mut lister = StreamLister::new(api, config);
        let (tx, _rx) = mpsc::channel(10);

        lister.list_all(&tx).await;

        assert_eq!(std::fs::read_to_string(&existing).unwrap(), "keep\n");
    }

    #[tokio::test]
    async fn test_closed_queue_fails_listing() {
        let api = Arc::new(ScriptedLogsApi::new().with_stream_page(Ok(page(
            vec![stream("job/1", 1, 1)],
            Some("t1"),
        ))));
        let mut lister = StreamLister::new(api.clone(), list_config(TimeWindow::default()));
        let (tx, rx) = mpsc::channel(10);
        drop(rx);

        let report = lister.list_all(&tx).await;

        assert!(report.failed);
        assert_eq!(api.describe_calls(), 1);
    }

    #[tokio::test]
    async fn test_waits_for_room_in_full_queue() {
        let streams = (0..20).map(|i| stream(&format!("job/{i}"), 1, 1)).collect();
        let api = Arc::new(ScriptedLogsApi::new().with_stream_page(Ok(page(streams, None))));
        let mut lister = StreamLister::new(api, list_config(TimeWindow::default()));
        let (tx, mut rx) = mpsc::channel(1);

        let consumer = tokio::spawn(async move {
            let mut received = 0;
            while rx.recv().await.is_some() {
                received += 1;
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
            received
        });

        let report = lister.list_all(&tx).await;
        drop(tx);

        assert_eq!(report.streams_queued, 20);
        assert_eq!(consumer.await.unwrap(), 20);
    }
}

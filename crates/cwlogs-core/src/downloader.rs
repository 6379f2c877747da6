// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Drains one stream through `GetLogEvents` into its output file.
//!
//! Reading starts at the head of the stream. The service never omits the forward token,
//! even at the end of a stream: it hands back the token it was given. A page whose forward
//! token equals the request cursor is therefore the end of the stream.

use std::sync::Arc;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, error};

use crate::client::{GetLogEventsRequest, LogsApi};
use crate::error::PageError;
use crate::model::StreamDescriptor;
use crate::pagination::PageOutcome;

/// Written after every event message.
pub const LINE_TERMINATOR: &[u8] = b"\r\n";

/// What downloading one stream did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DownloadReport {
    /// Successful `GetLogEvents` responses, including the final one.
    pub pages: u64,
    pub events: u64,
    pub bytes: u64,
    pub failed: bool,
}

pub struct StreamDownloader {
    client: Arc<dyn LogsApi>,
}

impl StreamDownloader {
    pub fn new(client: Arc<dyn LogsApi>) -> Self {
        Self { client }
    }

    /// Fetches the page after `cursor` and appends its events to `out`.
    pub async fn fetch_page<W>(
        &self,
        descriptor: &StreamDescriptor,
        out: &mut W,
        cursor: Option<&str>,
        report: &mut DownloadReport,
    ) -> PageOutcome
    where
        W: AsyncWrite + Unpin + Send,
    {
        let request = GetLogEventsRequest {
            log_group_name: descriptor.group_name.clone(),
            log_stream_name: descriptor.stream_name.clone(),
            start_from_head: true,
            next_token: cursor.map(str::to_string),
        };

        let page = match self.client.get_log_events(&request).await {
            Ok(page) => page,
            Err(e) => {
                error!(
                    "Failed to get log events for {}: {}",
                    descriptor.stream_name, e
                );
                return PageOutcome::Failed(e.into());
            }
        };
        report.pages += 1;

        if cursor.is_some() && page.next_forward_token.as_deref() == cursor {
            return PageOutcome::Exhausted;
        }

        debug!(
            "{}: {} events on page {}",
            descriptor.stream_name,
            page.events.len(),
            report.pages
        );

        for event in &page.events {
            let written = async {
                out.write_all(event.message.as_bytes()).await?;
                out.write_all(LINE_TERMINATOR).await
            }
            .await;

            if let Err(source) = written {
                error!(
                    "Failed to write {}: {}",
                    descriptor.file_path.display(),
                    source
                );
                return PageOutcome::Failed(PageError::Write {
                    path: descriptor.file_path.clone(),
                    source,
                });
            }

            report.events += 1;
            report.bytes += (event.message.len() + LINE_TERMINATOR.len()) as u64;
        }

        match page.next_forward_token {
            Some(token) => PageOutcome::HasMore(token),
            None => PageOutcome::Exhausted,
        }
    }

    /// Reads the whole stream into `out` and flushes it.
    pub async fn download<W>(&self, descriptor: &StreamDescriptor, out: &mut W) -> DownloadReport
    where
        W: AsyncWrite + Unpin + Send,
    {
        let mut report = DownloadReport::default();
        let mut cursor: Option<String> = None;

        loop {
            match self
                .fetch_page(descriptor, out, cursor.as_deref(), &mut report)
                .await
            {
                PageOutcome::HasMore(next) => cursor = Some(next),
                PageOutcome::Exhausted => break,
                PageOutcome::Failed(_) => {
                    report.failed = true;
                    break;
                }
            }
        }

        if let Err(e) = out.flush().await {
            error!(
                "Failed to flush {}: {}",
                descriptor.file_path.display(),
                e
            );
            report.failed = true;
        }

        debug!(
            "{}: {} events, {} bytes in {} pages",
            descriptor.stream_name, report.events, report.bytes, report.pages
        );
        report
    }
}

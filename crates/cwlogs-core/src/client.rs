// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use serde::Serialize;

use crate::error::ApiError;
use crate::model::{LogEventPage, LogStreamPage};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeLogStreamsRequest {
    pub log_group_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_stream_name_prefix: Option<String>,
    pub descending: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetLogEventsRequest {
    pub log_group_name: String,
    pub log_stream_name: String,
    pub start_from_head: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

/// The two CloudWatch Logs operations the pipeline depends on.
#[async_trait]
pub trait LogsApi: Send + Sync {
    /// Returns one page of streams; `next_token` is `None` once the listing is exhausted.
    async fn describe_log_streams(
        &self,
        request: &DescribeLogStreamsRequest,
    ) -> Result<LogStreamPage, ApiError>;

    /// Returns one page of events. At the end of a stream the service keeps handing back the
    /// token it was given instead of omitting it.
    async fn get_log_events(&self, request: &GetLogEventsRequest) -> Result<LogEventPage, ApiError>;
}

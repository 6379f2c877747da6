// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! CloudWatch Logs over the AWS JSON 1.1 protocol.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::{DescribeLogStreamsRequest, GetLogEventsRequest, LogsApi};
use crate::credentials::Credentials;
use crate::error::{ApiError, ConfigError};
use crate::model::{LogEventPage, LogStreamPage};
use crate::sigv4::{SignableRequest, Signer, AMZ_DATE_FORMAT};

const SERVICE: &str = "logs";
const TARGET_PREFIX: &str = "Logs_20140328";
pub const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// Default regional endpoint.
pub fn endpoint_for_region(region: &str) -> String {
    format!("https://logs.{region}.amazonaws.com/")
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(rename = "__type", default)]
    error_type: Option<String>,
    #[serde(default, alias = "Message")]
    message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CloudWatchLogsClient {
    client: reqwest::Client,
    endpoint: Url,
    signer: Signer,
}

impl CloudWatchLogsClient {
    /// Creates a client for `region`. `endpoint` replaces the regional endpoint, e.g. for a
    /// VPC endpoint or a local emulator.
    pub fn new(
        client: reqwest::Client,
        credentials: Credentials,
        region: &str,
        endpoint: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let endpoint = endpoint
            .map(str::to_string)
            .unwrap_or_else(|| endpoint_for_region(region));
        let endpoint =
            Url::parse(&endpoint).map_err(|_| ConfigError::InvalidEndpoint(endpoint.clone()))?;
        if endpoint.host_str().is_none() {
            return Err(ConfigError::InvalidEndpoint(endpoint.to_string()));
        }

        Ok(Self {
            client,
            endpoint,
            signer: Signer::new(credentials, region, SERVICE),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn host_header(&self) -> String {
        let host = self.endpoint.host_str().unwrap_or_default();
        match self.endpoint.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        }
    }

    async fn call<Req, Resp>(&self, operation: &str, request: &Req) -> Result<Resp, ApiError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let body = serde_json::to_vec(request)?;
        let now = Utc::now();

        let mut headers = vec![
            ("content-type".to_string(), CONTENT_TYPE.to_string()),
            ("host".to_string(), self.host_header()),
            (
                "x-amz-date".to_string(),
                now.format(AMZ_DATE_FORMAT).to_string(),
            ),
            (
                "x-amz-target".to_string(),
                format!("{TARGET_PREFIX}.{operation}"),
            ),
        ];
        if let Some(token) = &self.signer.credentials().session_token {
            headers.push(("x-amz-security-token".to_string(), token.clone()));
        }

        let authorization = self.signer.authorization(
            &SignableRequest {
                method: "POST",
                path: self.endpoint.path(),
                query: "",
                headers: headers.clone(),
                payload: &body,
            },
            now,
        )?;

        let mut builder = self.client.post(self.endpoint.clone());
        // reqwest derives Host from the URL; the signed value matches it.
        for (name, value) in headers.into_iter().filter(|(name, _)| name != "host") {
            builder = builder.header(name, value);
        }
        let response = builder
            .header("authorization", authorization)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        if !status.is_success() {
            let error = service_error(status.as_u16(), &bytes);
            debug!("{} failed: {}", operation, error);
            return Err(error);
        }

        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Maps an error response body to [`ApiError::Service`].
fn service_error(status: u16, body: &[u8]) -> ApiError {
    let parsed: Option<ErrorBody> = serde_json::from_slice(body).ok();
    let (code, message) = match parsed {
        Some(ErrorBody {
            error_type,
            message,
        }) => (
            error_type
                .as_deref()
                .and_then(|t| t.rsplit('#').next())
                .unwrap_or("UnknownError")
                .to_string(),
            message.unwrap_or_default(),
        ),
        None => (
            "UnknownError".to_string(),
            String::from_utf8_lossy(body).trim().to_string(),
        ),
    };
    ApiError::Service {
        status,
        code,
        message,
    }
}

#[async_trait]
impl LogsApi for CloudWatchLogsClient {
    async fn describe_log_streams(
        &self,
        request: &DescribeLogStreamsRequest,
    ) -> Result<LogStreamPage, ApiError> {
        self.call("DescribeLogStreams", request).await
    }

    async fn get_log_events(&self, request: &GetLogEventsRequest) -> Result<LogEventPage, ApiError> {
        self.call("GetLogEvents", request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{build_client, DEFAULT_TIMEOUT};
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn credentials(session_token: Option<&str>) -> Credentials {
        Credentials {
            access_key_id: "AKIDTEST".to_string(),
            secret_access_key: "secret".to_string(),
            session_token: session_token.map(str::to_string),
            region: None,
        }
    }

    fn client_for(server: &Server, session_token: Option<&str>) -> CloudWatchLogsClient {
        CloudWatchLogsClient::new(
            build_client(None, DEFAULT_TIMEOUT).unwrap(),
            credentials(session_token),
            "us-east-1",
            Some(&server.url()),
        )
        .unwrap()
    }

    #[test]
    fn test_default_endpoint() {
        let client = CloudWatchLogsClient::new(
            reqwest::Client::new(),
            credentials(None),
            "ap-northeast-1",
            None,
        )
        .unwrap();
        assert_eq!(
            client.endpoint().as_str(),
            "https://logs.ap-northeast-1.amazonaws.com/"
        );
    }

    #[test]
    fn test_invalid_endpoint() {
        let result = CloudWatchLogsClient::new(
            reqwest::Client::new(),
            credentials(None),
            "us-east-1",
            Some("not a url"),
        );
        assert!(matches!(result, Err(ConfigError::InvalidEndpoint(_))));
    }

    #[tokio::test]
    async fn test_describe_log_streams_request_and_response() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_header("x-amz-target", "Logs_20140328.DescribeLogStreams")
            .match_header("content-type", CONTENT_TYPE)
            .match_header(
                "authorization",
                Matcher::Regex(
                    r"^AWS4-HMAC-SHA256 Credential=AKIDTEST/\d{8}/us-east-1/logs/aws4_request, SignedHeaders=content-type;host;x-amz-date;x-amz-target, Signature=[0-9a-f]{64}$"
                        .to_string(),
                ),
            )
            .match_header("x-amz-date", Matcher::Regex(r"^\d{8}T\d{6}Z$".to_string()))
            .match_body(Matcher::Json(json!({
                "logGroupName": "/aws/batch/job",
                "logStreamNamePrefix": "job",
                "descending": true
            })))
            .with_status(200)
            .with_body(
                json!({
                    "logStreams": [
                        {"logStreamName": "job/a", "creationTime": 10, "storedBytes": 5},
                        {"logStreamName": "job/b", "creationTime": 20, "storedBytes": 7}
                    ],
                    "nextToken": "page-2"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = client_for(&server, None);
        let page = client
            .describe_log_streams(&DescribeLogStreamsRequest {
                log_group_name: "/aws/batch/job".to_string(),
                log_stream_name_prefix: Some("job".to_string()),
                descending: true,
                next_token: None,
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(page.log_streams.len(), 2);
        assert_eq!(page.log_streams[1].log_stream_name, "job/b");
        assert_eq!(page.next_token.as_deref(), Some("page-2"));
    }

    #[tokio::test]
    async fn test_get_log_events_sends_session_token() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_header("x-amz-target", "Logs_20140328.GetLogEvents")
            .match_header("x-amz-security-token", "session")
            .match_header(
                "authorization",
                Matcher::Regex("x-amz-security-token;x-amz-target".to_string()),
            )
            .match_body(Matcher::PartialJson(json!({
                "logStreamName": "job/a",
                "startFromHead": true,
                "nextToken": "f/1"
            })))
            .with_status(200)
            .with_body(
                json!({
                    "events": [{"timestamp": 1, "message": "hello", "ingestionTime": 2}],
                    "nextForwardToken": "f/2",
                    "nextBackwardToken": "b/1"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = client_for(&server, Some("session"));
        let page = client
            .get_log_events(&GetLogEventsRequest {
                log_group_name: "/aws/batch/job".to_string(),
                log_stream_name: "job/a".to_string(),
                start_from_head: true,
                next_token: Some("f/1".to_string()),
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(page.events[0].message, "hello");
        assert_eq!(page.next_forward_token.as_deref(), Some("f/2"));
    }

    #[tokio::test]
    async fn test_service_error_is_decoded() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(400)
            .with_body(
                json!({
                    "__type": "com.amazonaws.logs#ResourceNotFoundException",
                    "message": "The specified log group does not exist."
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = client_for(&server, None);
        let result = client
            .describe_log_streams(&DescribeLogStreamsRequest {
                log_group_name: "/missing".to_string(),
                log_stream_name_prefix: None,
                descending: true,
                next_token: None,
            })
            .await;

        match result {
            Err(ApiError::Service {
                status,
                code,
                message,
            }) => {
                assert_eq!(status, 400);
                assert_eq!(code, "ResourceNotFoundException");
                assert_eq!(message, "The specified log group does not exist.");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_service_error_with_plain_body() {
        match service_error(503, b"Service Unavailable\n") {
            ApiError::Service { code, message, .. } => {
                assert_eq!(code, "UnknownError");
                assert_eq!(message, "Service Unavailable");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_service_error_with_capitalized_message() {
        match service_error(400, br#"{"__type":"ThrottlingException","Message":"Rate exceeded"}"#) {
            ApiError::Service { code, message, .. } => {
                assert_eq!(code, "ThrottlingException");
                assert_eq!(message, "Rate exceeded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

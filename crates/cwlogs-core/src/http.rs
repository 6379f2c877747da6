// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! HTTP client construction.
//!
//! The client carries the request timeout, connection pooling, TCP keep-alive and the
//! optional proxy. An unusable proxy URL is a configuration error rather than a silent
//! fallback to a direct connection: the proxy is usually the only way out of the network.

use core::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(270);
const TCP_KEEPALIVE: Duration = Duration::from_secs(120);

/// Creates a reqwest client builder with rustls TLS.
fn create_reqwest_client_builder() -> reqwest::ClientBuilder {
    reqwest::Client::builder().use_rustls_tls()
}

/// Builds the client used for every CloudWatch Logs request.
///
/// # Arguments
///
/// * `proxy` - Proxy URL applied to all schemes, if any
/// * `timeout` - Whole-request timeout
pub fn build_client(proxy: Option<&str>, timeout: Duration) -> Result<reqwest::Client, ConfigError> {
    let mut client = create_reqwest_client_builder()
        .timeout(timeout)
        .pool_idle_timeout(Some(POOL_IDLE_TIMEOUT))
        .tcp_keepalive(Some(TCP_KEEPALIVE));

    if let Some(url) = proxy.filter(|p| !p.trim().is_empty()) {
        let proxy = reqwest::Proxy::all(url).map_err(|e| ConfigError::InvalidProxy {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        client = client.proxy(proxy);
    }

    client.build().map_err(|e| ConfigError::InvalidProxy {
        url: proxy.unwrap_or_default().to_string(),
        reason: e.to_string(),
    })
}

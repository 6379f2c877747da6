// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Static AWS credential resolution.
//!
//! Lookup order: the shared credentials file (`AWS_SHARED_CREDENTIALS_FILE` or
//! `~/.aws/credentials`, profile `AWS_PROFILE` or `default`), then environment variables.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::ConfigError;

pub const DEFAULT_PROFILE: &str = "default";
pub const DEFAULT_REGION: &str = "ap-northeast-1";

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
    /// Region found next to the keys, if any.
    pub region: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .field("region", &self.region)
            .finish()
    }
}

impl Credentials {
    fn from_map(values: &HashMap<String, String>) -> Option<Self> {
        let access_key_id = non_empty(values.get("aws_access_key_id").cloned())?;
        let secret_access_key = non_empty(values.get("aws_secret_access_key").cloned())?;
        Some(Self {
            access_key_id,
            secret_access_key,
            session_token: non_empty(values.get("aws_session_token").cloned()),
            region: non_empty(values.get("region").cloned()),
        })
    }
}

/// Resolves credentials from the process environment.
pub fn resolve() -> Result<Credentials, ConfigError> {
    resolve_with(|key| std::env::var(key).ok())
}

/// Same as [`resolve`] with an injectable environment lookup.
pub fn resolve_with<F>(env: F) -> Result<Credentials, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let profile = non_empty(env("AWS_PROFILE")).unwrap_or_else(|| DEFAULT_PROFILE.to_string());

    match shared_credentials_path(&env) {
        Some(path) => match from_shared_file(&path, &profile) {
            Some(credentials) => {
                debug!("Using credentials from {} [{}]", path.display(), profile);
                return Ok(credentials);
            }
            None => debug!(
                "No usable credentials for profile '{}' in {}",
                profile,
                path.display()
            ),
        },
        None => debug!("Unable to locate the home directory"),
    }

    from_env(&env).ok_or(ConfigError::CredentialsNotFound)
}

/// Picks the region: explicit value, then the credentials' region, then environment, then
/// [`DEFAULT_REGION`].
pub fn resolve_region<F>(explicit: Option<&str>, credentials: &Credentials, env: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    explicit
        .map(str::to_string)
        .and_then(|r| non_empty(Some(r)))
        .or_else(|| credentials.region.clone())
        .or_else(|| non_empty(env("AWS_REGION")))
        .or_else(|| non_empty(env("AWS_DEFAULT_REGION")))
        .unwrap_or_else(|| DEFAULT_REGION.to_string())
}

fn shared_credentials_path<F>(env: &F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = non_empty(env("AWS_SHARED_CREDENTIALS_FILE")) {
        return Some(PathBuf::from(path));
    }
    dirs::home_dir().map(|home| home.join(".aws").join("credentials"))
}

/// Reads one profile from a shared credentials file. A missing file, a missing profile and
/// incomplete keys all yield `None`.
pub fn from_shared_file(path: &Path, profile: &str) -> Option<Credentials> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!("Failed to read credentials file {}: {}", path.display(), e);
            return None;
        }
    };
    parse_profile(&contents, profile).and_then(|values| Credentials::from_map(&values))
}

fn from_env<F>(env: &F) -> Option<Credentials>
where
    F: Fn(&str) -> Option<String>,
{
    let access_key_id =
        non_empty(env("AWS_ACCESS_KEY_ID")).or_else(|| non_empty(env("AWS_ACCESS_KEY")))?;
    let secret_access_key = non_empty(env("AWS_SECRET_ACCESS_KEY"))?;
    Some(Credentials {
        access_key_id,
        secret_access_key,
        session_token: non_empty(env("AWS_SESSION_TOKEN")),
        // Environment regions are left to `resolve_region`.
        region: None,
    })
}

/// Extracts the key/value pairs of `[profile]` from INI-style contents.
pub fn parse_profile(contents: &str, profile: &str) -> Option<HashMap<String, String>> {
    let mut current: Option<String> = None;
    let mut found: Option<HashMap<String, String>> = None;

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(section) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let section = section.trim();
            let name = section.strip_prefix("profile ").unwrap_or(section).trim();
            current = Some(name.to_string());
            if name == profile && found.is_none() {
                found = Some(HashMap::new());
            }
            continue;
        }

        if current.as_deref() != Some(profile) {
            continue;
        }
        if let (Some((key, value)), Some(values)) = (line.split_once('='), found.as_mut()) {
            values.insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
        }
    }

    found
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

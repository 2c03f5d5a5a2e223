//! Remote repository over HTTP
//!
//! Reads `<base>/<namespace path>/<name>/maven-metadata.xml` and picks the
//! highest listed version inside the requested range.

use super::{ArtifactRegistry, Credentials, namespace_path};
use crate::core::error::{RegistryError, TrainResult};
use crate::graph::ModuleKey;
use crate::release::version::{VersionRange, highest_in_range};
use regex::Regex;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;

const METADATA_FILE: &str = "maven-metadata.xml";
const USER_AGENT_STRING: &str = concat!("modtrain/", env!("CARGO_PKG_VERSION"));
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// HTTP repository with optional basic-auth credentials
#[derive(Debug)]
pub struct HttpRepository {
  base_url: String,
  credentials: Option<Credentials>,
  client: Client,
}

impl HttpRepository {
  pub fn new(base_url: &str, credentials: Option<Credentials>, timeout: Duration) -> TrainResult<Self> {
    let base_url = base_url.trim_end_matches('/').to_string();

    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_STRING));
    headers.insert(ACCEPT, HeaderValue::from_static("application/xml, text/xml, */*"));

    let client = Client::builder()
      .timeout(timeout)
      .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS).min(timeout))
      .default_headers(headers)
      .build()
      .map_err(|e| RegistryError::Unreachable {
        location: base_url.clone(),
        reason: format!("failed to build HTTP client: {}", e),
      })?;

    Ok(Self {
      base_url,
      credentials,
      client,
    })
  }

  /// Metadata URL for one module
  pub fn metadata_url(&self, key: &ModuleKey) -> String {
    format!("{}/{}/{}/{}", self.base_url, namespace_path(key), key.name(), METADATA_FILE)
  }

  fn fetch_metadata(&self, url: &str) -> Result<Option<String>, RegistryError> {
    let mut request = self.client.get(url);
    if let Some(creds) = &self.credentials {
      request = request.basic_auth(&creds.username, creds.password.as_deref());
    }

    let response = request.send().map_err(|e| RegistryError::Unreachable {
      location: url.to_string(),
      reason: e.to_string(),
    })?;

    let status = response.status();
    debug!(%url, %status, "registry response");

    match status {
      StatusCode::NOT_FOUND => Ok(None),
      StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(RegistryError::Unauthorized {
        location: url.to_string(),
      }),
      s if !s.is_success() => Err(RegistryError::Status {
        location: url.to_string(),
        status: s.as_u16(),
      }),
      _ => response.text().map(Some).map_err(|e| RegistryError::InvalidResponse {
        location: url.to_string(),
        reason: e.to_string(),
      }),
    }
  }
}

impl ArtifactRegistry for HttpRepository {
  fn highest_version(&self, key: &ModuleKey, range: &VersionRange) -> Result<Option<String>, RegistryError> {
    let url = self.metadata_url(key);
    let Some(body) = self.fetch_metadata(&url)? else {
      debug!(module = %key, "no metadata published");
      return Ok(None);
    };

    let versions = metadata_versions(&body);
    let highest = highest_in_range(versions.iter().map(String::as_str), range);
    debug!(module = %key, %range, listed = versions.len(), found = ?highest, "http registry lookup");
    Ok(highest)
  }

  fn location(&self) -> String {
    self.base_url.clone()
  }
}

static VERSION_TAG: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"<version>\s*([^<\s]+)\s*</version>").expect("version tag pattern is valid"));

/// Every `<version>` entry of a metadata document, in document order
pub fn metadata_versions(xml: &str) -> Vec<String> {
  VERSION_TAG
    .captures_iter(xml)
    .filter_map(|c| c.get(1))
    .map(|m| m.as_str().to_string())
    .collect()
}

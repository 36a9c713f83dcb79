//! npm registry client
//!
//! Fetches a package's registry document and normalizes it into a
//! [`RegistryDocument`]: releases in the document's own key order, publish
//! timestamps from the `time` map, per-release peer dependencies, dist-tags,
//! and a browsable repository URL.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Deserialize;
use tracing::warn;

use crate::config::NPM_REGISTRY_BASE_URL;
use crate::version::error::RegistryError;
use crate::version::registry::PackageRegistry;
use crate::version::types::{RegistryDocument, VersionRelease};

/// Response from the npm registry API.
///
/// `versions` is deserialized into an IndexMap so the document's key order
/// survives; the resolver's positional "next version" depends on it.
#[derive(Debug, Deserialize)]
struct NpmPackageResponse {
    #[serde(default)]
    versions: IndexMap<String, NpmVersionMetadata>,
    /// Publish timestamp per version; also carries "created"/"modified"
    /// pseudo-keys which are not used here
    #[serde(default)]
    time: HashMap<String, String>,
    #[serde(default, rename = "dist-tags")]
    dist_tags: HashMap<String, String>,
    #[serde(default)]
    repository: Option<NpmRepository>,
}

#[derive(Debug, Deserialize)]
struct NpmVersionMetadata {
    #[serde(default, rename = "peerDependencies")]
    peer_dependencies: IndexMap<String, String>,
}

/// The `repository` field appears both as a bare URL string and as an
/// object with a `url` member
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NpmRepository {
    Url(String),
    Detailed {
        #[serde(default)]
        url: Option<String>,
    },
}

impl NpmRepository {
    fn url(&self) -> Option<&str> {
        match self {
            NpmRepository::Url(url) => Some(url),
            NpmRepository::Detailed { url } => url.as_deref(),
        }
    }
}

/// Registry client for the npm registry API
pub struct NpmRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl NpmRegistry {
    /// Creates a new NpmRegistry with a custom base URL
    pub fn new(base_url: &str) -> Result<Self, RegistryError> {
        Ok(Self {
            client: reqwest::Client::builder()
                .user_agent("depscope")
                .build()?,
            base_url: base_url.to_string(),
        })
    }

    /// Creates a client against the public npm registry
    pub fn public() -> Result<Self, RegistryError> {
        Self::new(NPM_REGISTRY_BASE_URL)
    }

    /// Encode package name for URL (handles scoped packages)
    fn encode_package_name(package_name: &str) -> String {
        if package_name.starts_with('@') {
            // Scoped package: @scope/name -> @scope%2Fname
            package_name.replace('/', "%2F")
        } else {
            package_name.to_string()
        }
    }

    fn parse_publish_time(package_name: &str, raw: Option<&String>) -> Option<DateTime<Utc>> {
        let raw = raw?;
        match DateTime::parse_from_rfc3339(raw) {
            Ok(timestamp) => Some(timestamp.with_timezone(&Utc)),
            Err(e) => {
                warn!("Unparseable publish time {:?} for {}: {}", raw, package_name, e);
                None
            }
        }
    }
}

/// Strip the `git+` prefix and a trailing `.git` suffix to yield a
/// browsable repository link
pub fn normalize_repository_url(raw: &str) -> String {
    let url = raw.strip_prefix("git+").unwrap_or(raw);
    let url = url.strip_suffix(".git").unwrap_or(url);
    url.to_string()
}

#[async_trait::async_trait]
impl PackageRegistry for NpmRegistry {
    async fn fetch_document(
        &self,
        package_name: &str,
    ) -> Result<RegistryDocument, RegistryError> {
        let encoded_name = Self::encode_package_name(package_name);
        let url = format!("{}/{}", self.base_url, encoded_name);

        let response = self.client.get(&url).send().await?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RegistryError::NotFound(package_name.to_string()));
        }

        if !status.is_success() {
            warn!("npm registry returned status {}: {}", status, url);
            return Err(RegistryError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        let package_info: NpmPackageResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse npm registry response: {}", e);
            RegistryError::InvalidResponse(e.to_string())
        })?;

        let releases = package_info
            .versions
            .into_iter()
            .map(|(version, metadata)| {
                let published =
                    Self::parse_publish_time(package_name, package_info.time.get(&version));
                VersionRelease {
                    version,
                    published,
                    peer_dependencies: metadata.peer_dependencies,
                }
            })
            .collect();

        let repository_url = package_info
            .repository
            .as_ref()
            .and_then(|r| r.url())
            .map(normalize_repository_url);

        Ok(RegistryDocument {
            releases,
            dist_tags: package_info.dist_tags,
            repository_url,
        })
    }
}

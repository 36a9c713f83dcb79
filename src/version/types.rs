//! Common types for the version layer

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;

/// A single published release of a package
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionRelease {
    /// Version string exactly as published (e.g., "4.17.21")
    pub version: String,
    /// Publish timestamp from the registry's `time` map, if known
    pub published: Option<DateTime<Utc>>,
    /// Peer dependencies declared by this release
    pub peer_dependencies: IndexMap<String, String>,
}

/// Normalized registry document for one package.
///
/// `releases` preserves the registry document's own key order, which is
/// historically chronological by publish time but not guaranteed to be
/// semver-sorted. That ordering is load-bearing: the resolver's "next
/// version" is the positional successor within this sequence.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RegistryDocument {
    /// All releases in registry key order
    pub releases: Vec<VersionRelease>,
    /// Dist-tags mapping tag name to version string (e.g., "latest")
    pub dist_tags: HashMap<String, String>,
    /// Browsable repository URL, normalized from `repository.url`
    pub repository_url: Option<String>,
}

impl RegistryDocument {
    /// Find a release by its exact version string
    pub fn release(&self, version: &str) -> Option<&VersionRelease> {
        self.releases.iter().find(|r| r.version == version)
    }

    /// Positional index of a version within the release sequence
    pub fn position(&self, version: &str) -> Option<usize> {
        self.releases.iter().position(|r| r.version == version)
    }
}

/// Resolved version metadata for one manifest dependency.
///
/// Produced once per successful resolution and replaced wholesale on every
/// re-fetch; there is no partial update. Every derived field is optional and
/// simply absent when the registry document does not provide it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageSnapshot {
    /// Package name from the manifest
    pub name: String,
    /// Literal current version, with the range prefix stripped
    pub version: String,
    /// Publish timestamp of the current version (absent if unlisted)
    pub version_published: Option<DateTime<Utc>>,
    /// Peer dependencies of the current version
    pub peer_dependencies: IndexMap<String, String>,
    /// Latest published version (dist-tag "latest", or last release)
    pub latest_version: Option<String>,
    pub latest_version_published: Option<DateTime<Utc>>,
    pub latest_version_peer_dependencies: IndexMap<String, String>,
    /// Positional successor of the current version in the release sequence
    pub next_version: Option<String>,
    pub next_version_published: Option<DateTime<Utc>>,
    pub next_version_peer_dependencies: IndexMap<String, String>,
    /// npm package page URL
    pub link: String,
    /// Normalized repository URL, if the registry document declares one
    pub repository_link: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn release(version: &str) -> VersionRelease {
        VersionRelease {
            version: version.to_string(),
            published: None,
            peer_dependencies: IndexMap::new(),
        }
    }

    #[test]
    fn release_lookup_finds_exact_version() {
        let document = RegistryDocument {
            releases: vec![release("1.0.0"), release("1.1.0")],
            ..Default::default()
        };

        assert_eq!(document.release("1.1.0"), Some(&release("1.1.0")));
        assert_eq!(document.release("9.9.9"), None);
    }

    #[test]
    fn position_reflects_registry_order_not_semver_order() {
        // A hotfix published after a newer minor: registry order is not
        // monotonically increasing by semver
        let document = RegistryDocument {
            releases: vec![release("1.0.0"), release("2.0.0"), release("1.0.1")],
            ..Default::default()
        };

        assert_eq!(document.position("2.0.0"), Some(1));
        assert_eq!(document.position("1.0.1"), Some(2));
    }
}

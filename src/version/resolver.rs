//! Version snapshot resolution
//!
//! Computes the three version snapshots (current, next, latest) for one
//! manifest dependency from its normalized registry document. Resolution is
//! pure and never fails: every derived field is optional and is simply
//! absent when the document does not provide it.

use indexmap::IndexMap;

use crate::config::{LATEST_DIST_TAG, NPM_PACKAGE_PAGE_BASE_URL};
use crate::manifest::Dependency;
use crate::version::types::{PackageSnapshot, RegistryDocument, VersionRelease};

/// Strip a leading range prefix (`^`, `~`, `=`, `<`, `>`) from a declared
/// range to obtain the literal version string
pub fn strip_range_prefix(range: &str) -> &str {
    range.trim_start_matches(['^', '~', '=', '<', '>', ' '])
}

fn published_of(release: Option<&VersionRelease>) -> Option<chrono::DateTime<chrono::Utc>> {
    release.and_then(|r| r.published)
}

fn peers_of(release: Option<&VersionRelease>) -> IndexMap<String, String> {
    release.map(|r| r.peer_dependencies.clone()).unwrap_or_default()
}

/// Resolve a dependency against its registry document.
///
/// - **Current**: the literal version from the manifest range; publish time
///   and peers are looked up in the document and are absent when the version
///   is not listed (e.g., already unpublished).
/// - **Next**: the positional successor of the current version within the
///   document's release sequence. The registry returns versions in its own
///   key order (historically publish-chronological), so this is a
///   publish-order successor, not a semver successor; if the ordering is not
///   monotonically increasing by semver, "next" may not be the smallest
///   version greater than current. This is a documented limitation.
/// - **Latest**: the version named by the `latest` dist-tag, falling back to
///   the last entry of the release sequence.
pub fn resolve(dependency: &Dependency, document: &RegistryDocument) -> PackageSnapshot {
    let current = strip_range_prefix(&dependency.range).to_string();
    let current_release = document.release(&current);

    let next_release = document
        .position(&current)
        .and_then(|index| document.releases.get(index + 1));

    let latest_version = document
        .dist_tags
        .get(LATEST_DIST_TAG)
        .cloned()
        .or_else(|| document.releases.last().map(|r| r.version.clone()));
    let latest_release = latest_version.as_deref().and_then(|v| document.release(v));

    PackageSnapshot {
        name: dependency.name.clone(),
        version: current,
        version_published: published_of(current_release),
        peer_dependencies: peers_of(current_release),
        latest_version,
        latest_version_published: published_of(latest_release),
        latest_version_peer_dependencies: peers_of(latest_release),
        next_version: next_release.map(|r| r.version.clone()),
        next_version_published: published_of(next_release),
        next_version_peer_dependencies: peers_of(next_release),
        link: format!("{}/{}", NPM_PACKAGE_PAGE_BASE_URL, dependency.name),
        repository_link: document.repository_url.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use rstest::rstest;
    use std::collections::HashMap;

    fn release(version: &str) -> VersionRelease {
        VersionRelease {
            version: version.to_string(),
            published: Some("2020-01-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap()),
            peer_dependencies: IndexMap::new(),
        }
    }

    fn document(versions: &[&str], latest_tag: Option<&str>) -> RegistryDocument {
        let mut dist_tags = HashMap::new();
        if let Some(latest) = latest_tag {
            dist_tags.insert(LATEST_DIST_TAG.to_string(), latest.to_string());
        }
        RegistryDocument {
            releases: versions.iter().map(|v| release(v)).collect(),
            dist_tags,
            repository_url: None,
        }
    }

    fn dependency(name: &str, range: &str) -> Dependency {
        Dependency {
            name: name.to_string(),
            range: range.to_string(),
        }
    }

    #[rstest]
    #[case("^1.2.3", "1.2.3")]
    #[case("~4.18.0", "4.18.0")]
    #[case(">=9.0.0", "9.0.0")]
    #[case("=2.0.0", "2.0.0")]
    #[case("5.0.0", "5.0.0")]
    fn strip_range_prefix_yields_literal_version(#[case] range: &str, #[case] expected: &str) {
        assert_eq!(strip_range_prefix(range), expected);
    }

    #[test]
    fn resolve_computes_current_next_and_latest() {
        let document = document(&["1.0.0", "1.1.0", "2.0.0"], Some("2.0.0"));
        let snapshot = resolve(&dependency("lodash", "^1.0.0"), &document);

        assert_eq!(snapshot.version, "1.0.0");
        assert_eq!(snapshot.next_version, Some("1.1.0".to_string()));
        assert_eq!(snapshot.latest_version, Some("2.0.0".to_string()));
        assert_eq!(snapshot.link, "https://www.npmjs.com/package/lodash");
    }

    #[test]
    fn resolve_next_is_absent_when_current_is_last_release() {
        let document = document(&["1.0.0", "2.0.0"], Some("2.0.0"));
        let snapshot = resolve(&dependency("lodash", "^2.0.0"), &document);

        assert_eq!(snapshot.next_version, None);
        assert_eq!(snapshot.next_version_published, None);
        assert!(snapshot.next_version_peer_dependencies.is_empty());
    }

    #[test]
    fn resolve_next_is_absent_when_current_is_unlisted() {
        // Current was unpublished from the registry
        let document = document(&["1.0.0", "2.0.0"], Some("2.0.0"));
        let snapshot = resolve(&dependency("lodash", "^1.5.0"), &document);

        assert_eq!(snapshot.version, "1.5.0");
        assert_eq!(snapshot.version_published, None);
        assert!(snapshot.peer_dependencies.is_empty());
        assert_eq!(snapshot.next_version, None);
    }

    #[test]
    fn resolve_next_follows_registry_order_not_semver_order() {
        // 1.0.1 is a hotfix published after 2.0.0: the positional successor
        // of 2.0.0 is 1.0.1, by design
        let document = document(&["1.0.0", "2.0.0", "1.0.1"], Some("2.0.0"));
        let snapshot = resolve(&dependency("lodash", "^2.0.0"), &document);

        assert_eq!(snapshot.next_version, Some("1.0.1".to_string()));
    }

    #[test]
    fn resolve_latest_falls_back_to_last_release_without_dist_tag() {
        let document = document(&["1.0.0", "1.1.0", "2.0.0"], None);
        let snapshot = resolve(&dependency("lodash", "^1.0.0"), &document);

        assert_eq!(snapshot.latest_version, Some("2.0.0".to_string()));
    }

    #[test]
    fn resolve_latest_metadata_is_absent_when_tagged_version_is_unlisted() {
        let mut document = document(&["1.0.0"], Some("2.0.0"));
        document.releases[0].peer_dependencies =
            IndexMap::from([("react".to_string(), "^18.0.0".to_string())]);

        let snapshot = resolve(&dependency("lodash", "^1.0.0"), &document);

        assert_eq!(snapshot.latest_version, Some("2.0.0".to_string()));
        assert_eq!(snapshot.latest_version_published, None);
        assert!(snapshot.latest_version_peer_dependencies.is_empty());
    }

    #[test]
    fn resolve_handles_empty_document_without_panicking() {
        let document = RegistryDocument::default();
        let snapshot = resolve(&dependency("ghost", "^1.0.0"), &document);

        assert_eq!(snapshot.version, "1.0.0");
        assert_eq!(snapshot.version_published, None);
        assert_eq!(snapshot.next_version, None);
        assert_eq!(snapshot.latest_version, None);
        assert_eq!(snapshot.repository_link, None);
    }

    #[test]
    fn resolve_carries_peer_dependencies_and_repository_link() {
        let mut document = document(&["1.0.0", "2.0.0"], Some("2.0.0"));
        document.releases[0].peer_dependencies =
            IndexMap::from([("react".to_string(), "^17.0.0".to_string())]);
        document.releases[1].peer_dependencies =
            IndexMap::from([("react".to_string(), "^18.0.0".to_string())]);
        document.repository_url = Some("https://github.com/example/pkg".to_string());

        let snapshot = resolve(&dependency("pkg", "^1.0.0"), &document);

        assert_eq!(
            snapshot.peer_dependencies.get("react"),
            Some(&"^17.0.0".to_string())
        );
        assert_eq!(
            snapshot.latest_version_peer_dependencies.get("react"),
            Some(&"^18.0.0".to_string())
        );
        assert_eq!(
            snapshot.repository_link,
            Some("https://github.com/example/pkg".to_string())
        );
    }
}

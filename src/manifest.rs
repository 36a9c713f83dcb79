//! Manifest parsing
//!
//! Turns raw manifest text (a package.json-style document) into an ordered
//! mapping of dependency name to version-range string. `dependencies` and
//! `devDependencies` are merged into one map, with devDependencies entries
//! overriding same-named production entries.

use indexmap::IndexMap;
use serde::Deserialize;

/// A single dependency declaration from the manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// Package name (e.g., "lodash", "@types/node")
    pub name: String,
    /// Declared version range (e.g., "^4.17.21"); may carry a range prefix
    pub range: String,
}

/// Ordered mapping of dependency name to version-range string
pub type DependencyMap = IndexMap<String, String>;

/// Error type for manifest parsing
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// The manifest text is not a valid JSON document of the expected shape
    #[error("Failed to parse manifest: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct RawManifest {
    #[serde(default)]
    dependencies: IndexMap<String, String>,
    #[serde(default, rename = "devDependencies")]
    dev_dependencies: IndexMap<String, String>,
}

/// Parse manifest text into a merged dependency map.
///
/// Returns an error on malformed input; validity is purely a function of the
/// latest input, there is no partial recovery.
pub fn parse_manifest(content: &str) -> Result<DependencyMap, ManifestError> {
    let manifest: RawManifest = serde_json::from_str(content)?;

    let mut dependencies = manifest.dependencies;
    for (name, range) in manifest.dev_dependencies {
        // IndexMap keeps the original position on override, so a package
        // declared in both sections stays where it first appeared
        dependencies.insert(name, range);
    }

    Ok(dependencies)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_manifest_extracts_dependencies_in_declaration_order() {
        let content = r#"{
  "name": "my-app",
  "dependencies": {
    "lodash": "^4.17.21",
    "express": "~4.18.0",
    "uuid": ">=9.0.0"
  }
}"#;
        let deps = parse_manifest(content).unwrap();
        assert_eq!(
            deps.into_iter().collect::<Vec<_>>(),
            vec![
                ("lodash".to_string(), "^4.17.21".to_string()),
                ("express".to_string(), "~4.18.0".to_string()),
                ("uuid".to_string(), ">=9.0.0".to_string()),
            ]
        );
    }

    #[test]
    fn parse_manifest_merges_dev_dependencies_after_dependencies() {
        let content = r#"{
  "dependencies": {
    "lodash": "^4.17.21"
  },
  "devDependencies": {
    "typescript": "^5.0.0"
  }
}"#;
        let deps = parse_manifest(content).unwrap();
        assert_eq!(
            deps.into_iter().collect::<Vec<_>>(),
            vec![
                ("lodash".to_string(), "^4.17.21".to_string()),
                ("typescript".to_string(), "^5.0.0".to_string()),
            ]
        );
    }

    #[test]
    fn parse_manifest_dev_dependency_overrides_same_named_production_entry() {
        let content = r#"{
  "dependencies": {
    "lodash": "^4.0.0",
    "express": "^4.18.0"
  },
  "devDependencies": {
    "lodash": "^4.17.21"
  }
}"#;
        let deps = parse_manifest(content).unwrap();
        assert_eq!(deps.len(), 2);
        assert_eq!(deps.get("lodash"), Some(&"^4.17.21".to_string()));
    }

    #[test]
    fn parse_manifest_handles_scoped_packages() {
        let content = r#"{
  "dependencies": {
    "@types/node": "20.0.0",
    "@babel/core": "7.22.0"
  }
}"#;
        let deps = parse_manifest(content).unwrap();
        assert_eq!(deps.get("@types/node"), Some(&"20.0.0".to_string()));
        assert_eq!(deps.get("@babel/core"), Some(&"7.22.0".to_string()));
    }

    #[test]
    fn parse_manifest_returns_empty_map_when_no_dependency_sections() {
        let content = r#"{
  "name": "my-app",
  "version": "1.0.0"
}"#;
        let deps = parse_manifest(content).unwrap();
        assert!(deps.is_empty());
    }

    #[test]
    fn parse_manifest_rejects_malformed_text() {
        let result = parse_manifest("{ not json");
        assert!(matches!(result, Err(ManifestError::Parse(_))));
    }

    #[test]
    fn parse_manifest_rejects_non_string_range() {
        let content = r#"{ "dependencies": { "lodash": { "version": "1.0.0" } } }"#;
        let result = parse_manifest(content);
        assert!(matches!(result, Err(ManifestError::Parse(_))));
    }
}

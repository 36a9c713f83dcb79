use std::path::PathBuf;

// =============================================================================
// Registry endpoints
// =============================================================================

/// Default base URL for the npm registry
pub const NPM_REGISTRY_BASE_URL: &str = "https://registry.npmjs.org";

/// Base URL for npm package pages
pub const NPM_PACKAGE_PAGE_BASE_URL: &str = "https://www.npmjs.com/package";

/// The dist-tag the registry uses for the current stable release
pub const LATEST_DIST_TAG: &str = "latest";

// =============================================================================
// Persisted state keys
// =============================================================================

/// Storage key for the classification-per-package mapping
pub const CLASSIFICATIONS_KEY: &str = "package-classifications";

/// Storage key for the note-per-package mapping
pub const NOTES_KEY: &str = "package-notes";

/// Storage key for the raw manifest text (stored unparsed)
pub const MANIFEST_TEXT_KEY: &str = "manifest-text";

/// Returns the path to the data directory for depscope.
/// Uses $XDG_DATA_HOME/depscope if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/depscope,
/// or ./depscope if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the annotation database file.
pub fn db_path() -> PathBuf {
    data_dir().join("annotations.db")
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("depscope.log")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("depscope")
}

//! Registry trait for fetching package documents from a remote source

#[cfg(test)]
use mockall::automock;

use crate::version::error::RegistryError;
use crate::version::types::RegistryDocument;

/// Trait for fetching a package's registry document
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait PackageRegistry: Send + Sync {
    /// Fetches the normalized registry document for a package
    ///
    /// # Arguments
    /// * `package_name` - The package name (e.g., "lodash", "@types/node")
    ///
    /// # Returns
    /// * `Ok(RegistryDocument)` - Releases in registry key order, dist-tags,
    ///   and the normalized repository URL
    /// * `Err(RegistryError)` - If the fetch fails; there is no retry
    async fn fetch_document(&self, package_name: &str) -> Result<RegistryDocument, RegistryError>;
}

//! Version layer: registry fetching and snapshot resolution
//!
//! # Modules
//!
//! - [`error`]: Error types for registry and storage operations
//! - [`npm`]: npm registry client and document normalization
//! - [`orchestrator`]: Concurrent batch resolution with stable output order
//! - [`registry`]: Registry trait for fetching package documents
//! - [`resolver`]: Pure current/next/latest snapshot computation
//! - [`types`]: Common types (`RegistryDocument`, `PackageSnapshot`)

pub mod error;
pub mod npm;
pub mod orchestrator;
pub mod registry;
pub mod resolver;
pub mod types;

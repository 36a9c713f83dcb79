//! Batch resolution orchestrator
//!
//! Fans one fetch-then-resolve pipeline out per manifest dependency, all
//! concurrently, and joins the results back in input order. A failing fetch
//! yields a per-package [`ResolutionOutcome::Failed`] in place rather than
//! aborting the batch, so one broken package never hides the others.

use std::sync::atomic::{AtomicU64, Ordering};

use futures::future::join_all;
use tracing::{debug, error};

use crate::manifest::{Dependency, DependencyMap};
use crate::version::error::RegistryError;
use crate::version::registry::PackageRegistry;
use crate::version::resolver::resolve;
use crate::version::types::PackageSnapshot;

/// Result of resolving one manifest dependency
#[derive(Debug)]
pub enum ResolutionOutcome {
    Resolved(PackageSnapshot),
    Failed { name: String, error: RegistryError },
}

impl ResolutionOutcome {
    /// Package name this outcome belongs to
    pub fn name(&self) -> &str {
        match self {
            ResolutionOutcome::Resolved(snapshot) => &snapshot.name,
            ResolutionOutcome::Failed { name, .. } => name,
        }
    }

    pub fn snapshot(&self) -> Option<&PackageSnapshot> {
        match self {
            ResolutionOutcome::Resolved(snapshot) => Some(snapshot),
            ResolutionOutcome::Failed { .. } => None,
        }
    }
}

/// One orchestration run's results, tagged with the generation that
/// produced them
#[derive(Debug)]
pub struct ReviewBatch {
    pub generation: u64,
    /// Outcomes in the same order as the input dependency map
    pub outcomes: Vec<ResolutionOutcome>,
}

/// Runs registry fetch + snapshot resolution concurrently across a
/// dependency map.
///
/// Each run is tagged with a monotonically increasing generation number.
/// A manifest edit while a batch is in flight starts a newer generation;
/// callers check [`Orchestrator::is_current`] before applying a batch so a
/// late-arriving stale result never overwrites a newer one.
pub struct Orchestrator<R: PackageRegistry> {
    registry: R,
    generation: AtomicU64,
}

impl<R: PackageRegistry> Orchestrator<R> {
    pub fn new(registry: R) -> Self {
        Self {
            registry,
            generation: AtomicU64::new(0),
        }
    }

    /// Resolve every dependency in the map, concurrently and without a
    /// concurrency cap. The output order equals the input key order
    /// regardless of completion order (indexed join).
    pub async fn resolve_all(&self, dependencies: &DependencyMap) -> ReviewBatch {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(
            "Starting resolution batch generation {} for {} dependencies",
            generation,
            dependencies.len()
        );

        let futures = dependencies.iter().map(|(name, range)| async move {
            match self.registry.fetch_document(name).await {
                Ok(document) => {
                    let dependency = Dependency {
                        name: name.clone(),
                        range: range.clone(),
                    };
                    ResolutionOutcome::Resolved(resolve(&dependency, &document))
                }
                Err(e) => {
                    error!("Failed to fetch registry document for {}: {}", name, e);
                    ResolutionOutcome::Failed {
                        name: name.clone(),
                        error: e,
                    }
                }
            }
        });

        let outcomes = join_all(futures).await;
        ReviewBatch {
            generation,
            outcomes,
        }
    }

    /// Whether a batch belongs to the most recently started generation.
    /// Stale batches must be discarded, not applied.
    pub fn is_current(&self, batch: &ReviewBatch) -> bool {
        batch.generation == self.generation.load(Ordering::SeqCst)
    }
}

//! The published specification.
//!
//! A scan builds a complete document off to the side and then swaps it in, so
//! readers always hold either the previous snapshot or the next one. Scans are
//! serialized; at most one runs at a time.

use crate::config::GeneratorConfig;
use crate::error::{Error, Result};
use crate::openapi_builder::OpenApiDocument;
use crate::pipeline;
use crate::source::SourceModel;
use log::info;
use std::sync::{Arc, Mutex, RwLock};
use std::time::SystemTime;

/// One generated document and when it was produced
#[derive(Debug)]
pub struct Snapshot {
    /// Increases by one with every completed scan, starting at 1
    pub generation: u64,
    pub generated_at: SystemTime,
    pub document: OpenApiDocument,
}

/// Holder of the current snapshot.
#[derive(Debug, Default)]
pub struct SpecificationStore {
    current: RwLock<Option<Arc<Snapshot>>>,
    /// Serializes scans and counts completed ones
    scan_lock: Mutex<u64>,
}

impl SpecificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the pipeline over `model` and publishes the result.
    pub fn scan(&self, model: &dyn SourceModel, config: &GeneratorConfig) -> Arc<Snapshot> {
        let mut generation = self
            .scan_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let document = pipeline::generate_document(model, config);
        *generation += 1;

        let snapshot = Arc::new(Snapshot {
            generation: *generation,
            generated_at: SystemTime::now(),
            document,
        });

        let mut current = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *current = Some(Arc::clone(&snapshot));

        info!(
            "Published specification generation {} ({} paths)",
            snapshot.generation,
            snapshot.document.paths.len()
        );
        snapshot
    }

    /// The latest published snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SpecNotGenerated`] before the first scan completes.
    pub fn current(&self) -> Result<Arc<Snapshot>> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
            .ok_or(Error::SpecNotGenerated)
    }
}

//! In-memory fingerprint store.

use super::{Fingerprint, MatchKind, MatchPolicy};
use crate::core::config::FingerprintConfig;
use crate::core::imaging::ImageEngine;
use crate::core::output::LineSink;
use crate::core::pipeline::Pipeline;
use crate::error::FingerprintError;
use crate::events::null_sender;
use image::RgbImage;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// A reference that a candidate matched
#[derive(Debug, Clone, Copy)]
pub struct StoreMatch<'a> {
    pub fingerprint: &'a Fingerprint,
    pub kind: MatchKind,
    pub distortion: f64,
}

/// Reference fingerprints plus the policy used to score candidates.
///
/// A store is immutable once built. Matching workers share it through an
/// `Arc`, so every reference is loaded before the first comparison runs.
pub struct FingerprintStore {
    engine: Arc<dyn ImageEngine>,
    policy: MatchPolicy,
    fingerprints: Vec<Fingerprint>,
}

impl FingerprintStore {
    /// Load every supported image under `directory` as a reference.
    ///
    /// Loading runs single-threaded, so references keep the walker's
    /// breadth-first enumeration order.
    pub fn load(
        directory: &Path,
        engine: Arc<dyn ImageEngine>,
        config: &FingerprintConfig,
    ) -> Result<Self, FingerprintError> {
        let pipeline = Pipeline::builder(directory)
            .engine(engine)
            .fingerprint_config(config.clone())
            .build()?;
        pipeline.load_fingerprints(&null_sender())
    }

    /// Build a store from fingerprints that are already in memory
    pub fn from_fingerprints(
        engine: Arc<dyn ImageEngine>,
        policy: MatchPolicy,
        fingerprints: Vec<Fingerprint>,
    ) -> Self {
        Self {
            engine,
            policy,
            fingerprints,
        }
    }

    /// Score `candidate` against every reference, in load order.
    ///
    /// Each qualifying pair is written to `sink` as
    /// `"<candidate_label> is identical to <label>"` (or `similar`) and
    /// returned. References above the similar threshold are skipped.
    pub fn find_matches(
        &self,
        candidate: &RgbImage,
        candidate_label: &str,
        fuzz: f64,
        sink: &dyn LineSink,
    ) -> Vec<StoreMatch<'_>> {
        let mut matches = Vec::new();

        for fingerprint in &self.fingerprints {
            let distortion = self.engine.distortion(candidate, &fingerprint.image, fuzz);
            debug!(
                candidate = candidate_label,
                reference = %fingerprint.label,
                distortion,
                "compared"
            );

            if let Some(kind) = self.policy.classify(distortion) {
                sink.write_line(&format!(
                    "{} is {} to {}",
                    candidate_label, kind, fingerprint.label
                ));
                matches.push(StoreMatch {
                    fingerprint,
                    kind,
                    distortion,
                });
            }
        }

        matches
    }

    pub fn len(&self) -> usize {
        self.fingerprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fingerprints.is_empty()
    }

    /// References in load order
    pub fn iter(&self) -> impl Iterator<Item = &Fingerprint> {
        self.fingerprints.iter()
    }

    pub fn policy(&self) -> &MatchPolicy {
        &self.policy
    }
}

impl std::fmt::Debug for FingerprintStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FingerprintStore")
            .field("policy", &self.policy)
            .field("fingerprints", &self.fingerprints.len())
            .finish()
    }
}

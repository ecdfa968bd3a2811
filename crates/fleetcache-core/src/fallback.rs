//! Deterministic synthetic data shown when the backend is unreachable.
//!
//! Data is generated from a seeded `StdRng` once per store and memoised, so
//! repeated failures within a session keep showing the same records.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::models::Resource;

/// Generate `len` synthetic records from `seed`, timestamped relative to `now`.
pub fn generate<T: Resource>(seed: u64, len: usize, now: DateTime<Utc>) -> Vec<T> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|i| T::synthesize(&mut rng, i, now)).collect()
}

/// Lazily generated, memoised fallback records for one store.
#[derive(Debug)]
pub struct FallbackData<T> {
    seed: u64,
    len: usize,
    generated: Option<Vec<T>>,
}

impl<T: Resource> FallbackData<T> {
    pub fn new(seed: u64, len: usize) -> Self {
        Self {
            seed,
            len,
            generated: None,
        }
    }

    /// The fallback records, generating them on first use
    pub fn items(&mut self) -> &[T] {
        let (seed, len) = (self.seed, self.len);
        self.generated.get_or_insert_with(|| {
            debug!(resource = T::RESOURCE, seed, len, "Generating fallback data");
            generate(seed, len, Utc::now())
        })
    }

    pub fn is_generated(&self) -> bool {
        self.generated.is_some()
    }
}

//! Scope-keyed cache of decoded location tallies.
//!
//! The assigner decodes every eligible location once per pass. The cache keeps
//! decoded [`TaxonTally`] values per comparison scope so later passes (and
//! later invocations on the same scope) skip decoding.
//!
//! # Invalidation
//!
//! Coarse and heuristic: each scope remembers one *sample location*. Before a
//! new entry is added, the sample is looked up in the backing store; if it no
//! longer resolves, the whole scope is cleared and the incoming location
//! becomes the new sample. Partial staleness (one location's effort changing
//! while the sample survives) is not detected.
//!
//! The cache never changes clustering results: cached values are pure
//! functions of the effort records.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use super::error::ClusterError;
use crate::error::StorageError;
use crate::taxonomy::{LocationEffort, LocationId, TaxonTally};
use crate::traits::EffortProvider;

#[derive(Debug, Default)]
struct ScopeEntries {
    sample_location: Option<LocationId>,
    tallies: HashMap<LocationId, Arc<TaxonTally>>,
}

/// Counters describing cache effectiveness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub invalidations: u64,
}

/// Shared decode cache, keyed by scope then location.
///
/// Share one instance across invocations with `Arc<EffortCache>`. Concurrent
/// writers may decode the same location twice; the last insert wins.
#[derive(Debug, Default)]
pub struct EffortCache {
    scopes: DashMap<String, ScopeEntries>,
    hits: AtomicU64,
    misses: AtomicU64,
    invalidations: AtomicU64,
}

impl EffortCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached tally for a location, counting the hit or miss.
    pub fn get(&self, scope: &str, location_id: LocationId) -> Option<Arc<TaxonTally>> {
        let found = self
            .scopes
            .get(scope)
            .and_then(|entries| entries.tallies.get(&location_id).cloned());
        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    /// Add a decoded tally, first checking the scope's sample location.
    ///
    /// # Errors
    ///
    /// Propagates the provider's error if the sample lookup fails; nothing is
    /// inserted in that case.
    pub async fn insert<P>(
        &self,
        provider: &P,
        scope: &str,
        location_id: LocationId,
        tally: Arc<TaxonTally>,
    ) -> Result<(), StorageError>
    where
        P: EffortProvider + ?Sized,
    {
        let sample = self
            .scopes
            .get(scope)
            .and_then(|entries| entries.sample_location);

        if let Some(sample) = sample {
            if !provider.contains_location(scope, sample).await? {
                debug!(
                    scope,
                    sample,
                    "Sample location no longer resolves; clearing scope cache"
                );
                self.clear_scope(scope);
                self.invalidations.fetch_add(1, Ordering::Relaxed);
            }
        }

        let mut entries = self.scopes.entry(scope.to_string()).or_default();
        if entries.sample_location.is_none() {
            entries.sample_location = Some(location_id);
        }
        entries.tallies.insert(location_id, tally);
        Ok(())
    }

    /// Drop every entry for a scope.
    pub fn clear_scope(&self, scope: &str) {
        self.scopes.remove(scope);
    }

    /// Number of cached tallies in a scope.
    pub fn len(&self, scope: &str) -> usize {
        self.scopes
            .get(scope)
            .map_or(0, |entries| entries.tallies.len())
    }

    /// True when the scope holds no tallies.
    pub fn is_empty(&self, scope: &str) -> bool {
        self.len(scope) == 0
    }

    /// The scope's current sample location.
    pub fn sample_location(&self, scope: &str) -> Option<LocationId> {
        self.scopes
            .get(scope)
            .and_then(|entries| entries.sample_location)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
        }
    }
}

// =============================================================================
// TallyLoader
// =============================================================================

/// Decodes effort records for one scope, through the cache when present.
pub(crate) struct TallyLoader<'a, P: ?Sized> {
    provider: &'a P,
    cache: Option<&'a EffortCache>,
    scope: &'a str,
}

impl<'a, P> TallyLoader<'a, P>
where
    P: EffortProvider + ?Sized,
{
    pub(crate) fn new(provider: &'a P, cache: Option<&'a EffortCache>, scope: &'a str) -> Self {
        Self {
            provider,
            cache,
            scope,
        }
    }

    pub(crate) async fn load(&self, effort: &LocationEffort) -> Result<Arc<TaxonTally>, ClusterError> {
        let Some(cache) = self.cache else {
            return Ok(Arc::new(TaxonTally::decode(effort)?));
        };

        if let Some(tally) = cache.get(self.scope, effort.location_id) {
            return Ok(tally);
        }

        let tally = Arc::new(TaxonTally::decode(effort)?);
        cache
            .insert(self.provider, self.scope, effort.location_id, Arc::clone(&tally))
            .await?;
        Ok(tally)
    }
}

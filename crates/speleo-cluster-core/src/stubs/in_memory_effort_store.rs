//! In-memory effort store for development and testing.
//!
//! Holds [`LocationEffort`] records per scope and serves them through the
//! [`EffortProvider`] trait with the ordering the engine requires.
//!
//! # Example
//!
//! ```
//! use speleo_cluster_core::stubs::InMemoryEffortStore;
//! use speleo_cluster_core::taxonomy::LocationEffort;
//!
//! let store = InMemoryEffortStore::new();
//! store.insert("caves", LocationEffort::new(1));
//! assert_eq!(store.len("caves"), 1);
//! ```

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use crate::error::StorageError;
use crate::taxonomy::{LocationEffort, LocationId, SpeciesFilter};
use crate::traits::EffortProvider;

/// Effort records keyed by scope, then location.
///
/// Request counters let tests observe how often the engine goes back to the
/// store; `set_available(false)` makes every trait call fail.
#[derive(Debug)]
pub struct InMemoryEffortStore {
    scopes: DashMap<String, BTreeMap<LocationId, LocationEffort>>,
    available: AtomicBool,
    page_requests: AtomicUsize,
    lookup_requests: AtomicUsize,
}

impl Default for InMemoryEffortStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryEffortStore {
    pub fn new() -> Self {
        Self {
            scopes: DashMap::new(),
            available: AtomicBool::new(true),
            page_requests: AtomicUsize::new(0),
            lookup_requests: AtomicUsize::new(0),
        }
    }

    /// Insert or replace a location's effort record.
    pub fn insert(&self, scope: &str, effort: LocationEffort) {
        debug!("Storing effort for location {} in scope {}", effort.location_id, scope);
        self.scopes
            .entry(scope.to_string())
            .or_default()
            .insert(effort.location_id, effort);
    }

    /// Insert several records.
    pub fn insert_all(&self, scope: &str, efforts: impl IntoIterator<Item = LocationEffort>) {
        for effort in efforts {
            self.insert(scope, effort);
        }
    }

    /// Remove a location, returning its record.
    pub fn remove(&self, scope: &str, id: LocationId) -> Option<LocationEffort> {
        self.scopes.get_mut(scope)?.remove(&id)
    }

    /// Direct record access, bypassing availability and counters.
    pub fn get(&self, scope: &str, id: LocationId) -> Option<LocationEffort> {
        self.scopes.get(scope)?.get(&id).cloned()
    }

    pub fn len(&self, scope: &str) -> usize {
        self.scopes.get(scope).map_or(0, |locations| locations.len())
    }

    pub fn is_empty(&self, scope: &str) -> bool {
        self.len(scope) == 0
    }

    /// Toggle whether trait calls succeed.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Relaxed);
    }

    /// Number of `fetch_page` calls served or refused.
    pub fn page_requests(&self) -> usize {
        self.page_requests.load(Ordering::Relaxed)
    }

    /// Number of `fetch_by_ids` calls served or refused.
    pub fn lookup_requests(&self) -> usize {
        self.lookup_requests.load(Ordering::Relaxed)
    }

    fn ensure_available(&self) -> Result<(), StorageError> {
        if self.available.load(Ordering::Relaxed) {
            Ok(())
        } else {
            Err(StorageError::Unavailable("in-memory store switched off".into()))
        }
    }
}

#[async_trait]
impl EffortProvider for InMemoryEffortStore {
    async fn fetch_page(
        &self,
        scope: &str,
        filter: SpeciesFilter,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<LocationEffort>, StorageError> {
        self.page_requests.fetch_add(1, Ordering::Relaxed);
        self.ensure_available()?;

        let Some(locations) = self.scopes.get(scope) else {
            return Ok(Vec::new());
        };
        let mut eligible: Vec<&LocationEffort> =
            locations.values().filter(|e| filter.accepts(e)).collect();
        eligible.sort_by_key(|e| (Reverse(e.total_species), e.location_id));

        let page: Vec<LocationEffort> = eligible
            .into_iter()
            .skip(skip)
            .take(limit)
            .cloned()
            .collect();
        debug!(
            "Served page skip={} limit={} -> {} records from scope {}",
            skip,
            limit,
            page.len(),
            scope
        );
        Ok(page)
    }

    async fn fetch_by_ids(
        &self,
        scope: &str,
        ids: &[LocationId],
    ) -> Result<Vec<Option<LocationEffort>>, StorageError> {
        self.lookup_requests.fetch_add(1, Ordering::Relaxed);
        self.ensure_available()?;

        let locations = self.scopes.get(scope);
        Ok(ids
            .iter()
            .map(|id| locations.as_ref().and_then(|l| l.get(id).cloned()))
            .collect())
    }
}

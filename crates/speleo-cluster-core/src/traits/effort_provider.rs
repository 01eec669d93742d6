//! Effort provider trait: the upstream source of location effort batches.

use async_trait::async_trait;

use crate::error::StorageError;
use crate::taxonomy::{LocationEffort, LocationId, SpeciesFilter};

/// Paginated, read-only access to per-location effort snapshots.
///
/// Implementations must return pages in a stable order within one clustering
/// invocation: descending `total_species`, then ascending `location_id`. Both
/// the seed selector's early-exit bound and the assigner's per-pass traversal
/// rely on that ordering.
///
/// # Example
///
/// ```rust,ignore
/// use speleo_cluster_core::traits::EffortProvider;
///
/// let page = provider.fetch_page("caves", SpeciesFilter::default(), 0, 100).await?;
/// let seeds = provider.fetch_by_ids("caves", &[2, 5]).await?;
/// ```
#[async_trait]
pub trait EffortProvider: Send + Sync {
    /// Fetch one page of eligible locations in `scope`.
    async fn fetch_page(
        &self,
        scope: &str,
        filter: SpeciesFilter,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<LocationEffort>, StorageError>;

    /// Look up locations by ID, one result per requested ID in request order.
    ///
    /// Unknown IDs yield `None`.
    async fn fetch_by_ids(
        &self,
        scope: &str,
        ids: &[LocationId],
    ) -> Result<Vec<Option<LocationEffort>>, StorageError>;

    /// Whether a location still resolves in `scope`.
    async fn contains_location(&self, scope: &str, id: LocationId) -> Result<bool, StorageError> {
        let found = self.fetch_by_ids(scope, &[id]).await?;
        Ok(matches!(found.as_slice(), [Some(_)]))
    }
}

/// Cursor walking every eligible location in `scope` one page at a time.
///
/// Stops after the first short page, so a provider never sees a request past
/// the end unless the final page is exactly full.
pub struct EffortPages<'a, P: ?Sized> {
    provider: &'a P,
    scope: &'a str,
    filter: SpeciesFilter,
    page_size: usize,
    skip: usize,
    exhausted: bool,
}

impl<'a, P> EffortPages<'a, P>
where
    P: EffortProvider + ?Sized,
{
    pub fn new(provider: &'a P, scope: &'a str, filter: SpeciesFilter, page_size: usize) -> Self {
        Self {
            provider,
            scope,
            filter,
            page_size,
            skip: 0,
            exhausted: page_size == 0,
        }
    }

    /// Next non-empty page, or `None` once the stream is exhausted.
    pub async fn next_page(&mut self) -> Result<Option<Vec<LocationEffort>>, StorageError> {
        if self.exhausted {
            return Ok(None);
        }

        let page = self
            .provider
            .fetch_page(self.scope, self.filter, self.skip, self.page_size)
            .await?;
        self.skip += page.len();
        if page.len() < self.page_size {
            self.exhausted = true;
        }

        if page.is_empty() {
            Ok(None)
        } else {
            Ok(Some(page))
        }
    }

    /// Records handed out so far.
    pub fn position(&self) -> usize {
        self.skip
    }
}

//! List-query composition: filter + sort + paginate over a remote collection,
//! minimizing round trips through the cache.
//!
//! The remote store cannot co-sort secondary keys (vote count, average
//! rating) with arbitrary filters in one pass, so a cache miss materializes
//! the entire structurally filtered set, applies the free-text term against
//! display fields client-side, sorts globally, caches the sorted set, and
//! slices locally. Subsequent pages for the same filters are served without
//! any network traffic. Sets larger than the materialization cap fall back to
//! one remote-ordered page and are not cached.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use time::OffsetDateTime;
use tracing::debug;

use crate::application::pagination::{PageRequest, PagedResult};
use crate::application::repos::{RemoteOrder, RepoError};
use crate::cache::{CacheKey, TtlStore};
use crate::domain::entities::{
    ClassifiedRecord, CompanyRecord, NewsArticleRecord, SellerRecord,
};
use crate::domain::types::SortMode;

const METRIC_LIST_FALLBACK: &str = "vitrina_list_fallback_total";

/// Sorting and searching hooks a record must expose to be listable.
pub trait Listed: Clone + Send + Sync + 'static {
    fn display_name(&self) -> &str;

    fn created_at(&self) -> OffsetDateTime;

    fn vote_count(&self) -> i64 {
        0
    }

    fn avg_rating(&self) -> f64 {
        0.0
    }

    /// Fields matched by the client-side substring filter, including joined
    /// display fields the remote store cannot search.
    fn search_haystacks(&self) -> Vec<&str>;
}

/// The remote queries a listing surface needs. Implemented by thin adapters
/// capturing a repository, scope, and filter.
#[async_trait]
pub trait ListSource<T>: Send + Sync {
    /// Count of the structurally filtered set (no free-text term).
    async fn count(&self) -> Result<u64, RepoError>;

    /// Entire structurally filtered set (no free-text term).
    async fn fetch_all(&self) -> Result<Vec<T>, RepoError>;

    /// One remote-ordered page, free-text term applied remotely.
    async fn fetch_page(
        &self,
        order: RemoteOrder,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<T>, RepoError>;
}

pub struct ListComposer {
    cache: Arc<TtlStore>,
    ttl: Duration,
    materialize_cap: u64,
}

impl ListComposer {
    pub fn new(cache: Arc<TtlStore>, ttl: Duration, materialize_cap: u64) -> Self {
        Self {
            cache,
            ttl,
            materialize_cap,
        }
    }

    pub fn cache(&self) -> &Arc<TtlStore> {
        &self.cache
    }

    /// Produce the requested page. Any remote error aborts the composition
    /// and propagates; nothing half-composed is cached, so the caller's
    /// previously rendered state stays valid.
    pub async fn compose<T, S>(
        &self,
        key: CacheKey,
        sort: SortMode,
        search: Option<&str>,
        request: PageRequest,
        source: &S,
    ) -> Result<PagedResult<T>, RepoError>
    where
        T: Listed,
        S: ListSource<T> + ?Sized,
    {
        if let Some(cached) = self.cache.get::<Vec<T>>(&key) {
            return Ok(PagedResult::from_sorted(&cached, request));
        }

        let total = source.count().await?;

        if self.materialize_cap > 0 && total > self.materialize_cap {
            // Beyond the cap the term is matched by the backend against the
            // entity's own columns; joined-field matches and rating
            // tie-breaks are unavailable on this path.
            counter!(METRIC_LIST_FALLBACK).increment(1);
            debug!(
                total,
                cap = self.materialize_cap,
                key = %key,
                "filtered set exceeds materialization cap; using remote ordering"
            );
            let items = source
                .fetch_page(
                    remote_order(sort),
                    request.offset() as u64,
                    u64::from(request.page_size()),
                )
                .await?;
            return Ok(PagedResult {
                items,
                total_count: total,
                page: request.page(),
                page_size: request.page_size(),
            });
        }

        let mut records = source.fetch_all().await?;

        if let Some(term) = search {
            let needle = term.to_lowercase();
            records.retain(|record| {
                record
                    .search_haystacks()
                    .iter()
                    .any(|haystack| haystack.to_lowercase().contains(&needle))
            });
        }

        sort_records(&mut records, sort);

        let result = PagedResult::from_sorted(&records, request);
        self.cache.set(&key, records, self.ttl);
        Ok(result)
    }
}

/// Sort the materialized set. `sort_by` is stable, so equal keys keep their
/// remote (`created_at` descending) order.
pub fn sort_records<T: Listed>(records: &mut [T], sort: SortMode) {
    match sort {
        SortMode::Newest => records.sort_by(|a, b| b.created_at().cmp(&a.created_at())),
        SortMode::Alphabetical => records.sort_by(|a, b| a.display_name().cmp(b.display_name())),
        SortMode::TopRated => records.sort_by(|a, b| {
            b.vote_count()
                .cmp(&a.vote_count())
                .then_with(|| b.avg_rating().total_cmp(&a.avg_rating()))
        }),
    }
}

fn remote_order(sort: SortMode) -> RemoteOrder {
    match sort {
        SortMode::Newest => RemoteOrder::CreatedDesc,
        SortMode::Alphabetical => RemoteOrder::NameAsc,
        SortMode::TopRated => RemoteOrder::VotesDesc,
    }
}

impl Listed for CompanyRecord {
    fn display_name(&self) -> &str {
        &self.name
    }

    fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    fn vote_count(&self) -> i64 {
        self.vote_count
    }

    fn avg_rating(&self) -> f64 {
        self.avg_rating.unwrap_or(0.0)
    }

    fn search_haystacks(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str(), self.description.as_str()];
        if let Some(category) = self.category_name.as_deref() {
            fields.push(category);
        }
        fields
    }
}

impl Listed for ClassifiedRecord {
    fn display_name(&self) -> &str {
        &self.title
    }

    fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    fn search_haystacks(&self) -> Vec<&str> {
        let mut fields = vec![self.title.as_str(), self.description.as_str()];
        if let Some(category) = self.category_name.as_deref() {
            fields.push(category);
        }
        fields
    }
}

impl Listed for NewsArticleRecord {
    fn display_name(&self) -> &str {
        &self.title
    }

    fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    fn search_haystacks(&self) -> Vec<&str> {
        vec![self.title.as_str(), self.excerpt.as_str()]
    }
}

impl Listed for SellerRecord {
    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    fn search_haystacks(&self) -> Vec<&str> {
        let mut fields = vec![self.display_name.as_str()];
        if let Some(bio) = self.bio.as_deref() {
            fields.push(bio);
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use time::macros::datetime;

    use crate::cache::CacheConfig;
    use crate::domain::types::ListScope;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        name: String,
        created_at: OffsetDateTime,
        votes: i64,
        rating: f64,
        tag: String,
    }

    impl Row {
        fn new(name: &str, votes: i64, rating: f64) -> Self {
            Self {
                name: name.to_string(),
                created_at: datetime!(2024-01-01 00:00 UTC),
                votes,
                rating,
                tag: String::new(),
            }
        }
    }

    impl Listed for Row {
        fn display_name(&self) -> &str {
            &self.name
        }

        fn created_at(&self) -> OffsetDateTime {
            self.created_at
        }

        fn vote_count(&self) -> i64 {
            self.votes
        }

        fn avg_rating(&self) -> f64 {
            self.rating
        }

        fn search_haystacks(&self) -> Vec<&str> {
            vec![self.name.as_str(), self.tag.as_str()]
        }
    }

    struct FakeSource {
        rows: Vec<Row>,
        count_calls: AtomicUsize,
        fetch_all_calls: AtomicUsize,
        fetch_page_calls: AtomicUsize,
    }

    impl FakeSource {
        fn new(rows: Vec<Row>) -> Self {
            Self {
                rows,
                count_calls: AtomicUsize::new(0),
                fetch_all_calls: AtomicUsize::new(0),
                fetch_page_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ListSource<Row> for FakeSource {
        async fn count(&self) -> Result<u64, RepoError> {
            self.count_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.rows.len() as u64)
        }

        async fn fetch_all(&self) -> Result<Vec<Row>, RepoError> {
            self.fetch_all_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.rows.clone())
        }

        async fn fetch_page(
            &self,
            _order: RemoteOrder,
            offset: u64,
            limit: u64,
        ) -> Result<Vec<Row>, RepoError> {
            self.fetch_page_calls.fetch_add(1, Ordering::SeqCst);
            let start = (offset as usize).min(self.rows.len());
            let end = (start + limit as usize).min(self.rows.len());
            Ok(self.rows[start..end].to_vec())
        }
    }

    fn composer() -> ListComposer {
        ListComposer::new(
            Arc::new(TtlStore::new(&CacheConfig::default())),
            Duration::from_secs(60),
            1_000,
        )
    }

    fn list_key() -> CacheKey {
        CacheKey::SellerList {
            scope: ListScope::Public,
            country: None,
            search: None,
            sort: SortMode::Newest,
        }
    }

    #[tokio::test]
    async fn second_page_is_served_from_cache_without_network() {
        let composer = composer();
        let rows: Vec<Row> = (0..37)
            .map(|i| Row::new(&format!("row-{i:02}"), 0, 0.0))
            .collect();
        let source = FakeSource::new(rows);

        let first = composer
            .compose(
                list_key(),
                SortMode::Alphabetical,
                None,
                PageRequest::new(1, 24),
                &source,
            )
            .await
            .expect("first page");
        assert_eq!(first.items.len(), 24);
        assert_eq!(first.total_count, 37);

        let second = composer
            .compose(
                list_key(),
                SortMode::Alphabetical,
                None,
                PageRequest::new(2, 24),
                &source,
            )
            .await
            .expect("second page");
        assert_eq!(second.items.len(), 13);
        assert_eq!(second.total_count, 37);

        assert_eq!(source.count_calls.load(Ordering::SeqCst), 1);
        assert_eq!(source.fetch_all_calls.load(Ordering::SeqCst), 1);
        assert_eq!(source.fetch_page_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn top_rated_orders_votes_then_rating() {
        let composer = composer();
        let source = FakeSource::new(vec![
            Row::new("five", 5, 4.0),
            Row::new("ten-low", 10, 3.0),
            Row::new("ten-high", 10, 5.0),
            Row::new("two", 2, 5.0),
        ]);

        let page = composer
            .compose(
                list_key(),
                SortMode::TopRated,
                None,
                PageRequest::new(1, 12),
                &source,
            )
            .await
            .expect("page");

        let names: Vec<&str> = page.items.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["ten-high", "ten-low", "five", "two"]);
    }

    #[tokio::test]
    async fn search_matches_joined_display_fields_client_side() {
        let composer = composer();
        let mut tagged = Row::new("plain", 0, 0.0);
        tagged.tag = "Beauty".to_string();
        let source = FakeSource::new(vec![tagged, Row::new("other", 0, 0.0)]);

        let page = composer
            .compose(
                list_key(),
                SortMode::Newest,
                Some("beau"),
                PageRequest::new(1, 12),
                &source,
            )
            .await
            .expect("page");

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.total_count, 1);
        assert_eq!(page.items[0].name, "plain");
    }

    #[tokio::test]
    async fn oversized_sets_fall_back_to_remote_paging_and_skip_cache() {
        let cache = Arc::new(TtlStore::new(&CacheConfig::default()));
        let composer = ListComposer::new(cache.clone(), Duration::from_secs(60), 3);
        let rows: Vec<Row> = (0..10)
            .map(|i| Row::new(&format!("row-{i}"), 0, 0.0))
            .collect();
        let source = FakeSource::new(rows);

        let page = composer
            .compose(
                list_key(),
                SortMode::Newest,
                None,
                PageRequest::new(2, 4),
                &source,
            )
            .await
            .expect("page");

        assert_eq!(page.total_count, 10);
        assert_eq!(page.items.len(), 4);
        assert_eq!(source.fetch_page_calls.load(Ordering::SeqCst), 1);
        assert_eq!(source.fetch_all_calls.load(Ordering::SeqCst), 0);
        assert!(cache.get::<Vec<Row>>(&list_key()).is_none());

        // The next request goes remote again; nothing was cached.
        let _ = composer
            .compose(
                list_key(),
                SortMode::Newest,
                None,
                PageRequest::new(1, 4),
                &source,
            )
            .await
            .expect("page");
        assert_eq!(source.fetch_page_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn remote_failure_aborts_composition() {
        struct FailingSource;

        #[async_trait]
        impl ListSource<Row> for FailingSource {
            async fn count(&self) -> Result<u64, RepoError> {
                Err(RepoError::Backend("connection reset".to_string()))
            }

            async fn fetch_all(&self) -> Result<Vec<Row>, RepoError> {
                unreachable!("count fails first")
            }

            async fn fetch_page(
                &self,
                _order: RemoteOrder,
                _offset: u64,
                _limit: u64,
            ) -> Result<Vec<Row>, RepoError> {
                unreachable!("count fails first")
            }
        }

        let composer = composer();
        let err = composer
            .compose(
                list_key(),
                SortMode::Newest,
                None,
                PageRequest::new(1, 12),
                &FailingSource,
            )
            .await
            .expect_err("composition aborts");
        assert!(matches!(err, RepoError::Backend(_)));
        assert!(composer.cache().get::<Vec<Row>>(&list_key()).is_none());
    }
}

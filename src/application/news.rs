//! News article workflows. Articles are admin-authored; the public scope only
//! sees published rows.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error};
use uuid::Uuid;

use crate::application::composer::{ListComposer, ListSource};
use crate::application::error::AppError;
use crate::application::pagination::{PageRequest, PagedResult};
use crate::application::repos::{CreateNewsParams, NewsFilter, NewsRepo, RemoteOrder, RepoError};
use crate::cache::{CacheKey, KeyFamily, TtlStore};
use crate::domain::entities::NewsArticleRecord;
use crate::domain::slug;
use crate::domain::types::{ListScope, SortMode};

const MAX_TITLE_LEN: usize = 160;

#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub excerpt: String,
    pub body: String,
    pub cover_url: Option<String>,
    pub published: bool,
}

pub struct NewsService {
    repo: Arc<dyn NewsRepo>,
    cache: Arc<TtlStore>,
    composer: ListComposer,
    detail_ttl: Duration,
}

struct NewsListSource {
    repo: Arc<dyn NewsRepo>,
    scope: ListScope,
    filter: NewsFilter,
}

#[async_trait]
impl ListSource<NewsArticleRecord> for NewsListSource {
    async fn count(&self) -> Result<u64, RepoError> {
        self.repo.count(self.scope, &self.filter).await
    }

    async fn fetch_all(&self) -> Result<Vec<NewsArticleRecord>, RepoError> {
        self.repo.fetch_all(self.scope, &self.filter).await
    }

    async fn fetch_page(
        &self,
        order: RemoteOrder,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<NewsArticleRecord>, RepoError> {
        self.repo
            .fetch_page(self.scope, &self.filter, order, offset, limit)
            .await
    }
}

impl NewsService {
    pub fn new(
        repo: Arc<dyn NewsRepo>,
        cache: Arc<TtlStore>,
        listing_ttl: Duration,
        materialize_cap: u64,
    ) -> Self {
        Self {
            repo,
            composer: ListComposer::new(cache.clone(), listing_ttl, materialize_cap),
            detail_ttl: listing_ttl,
            cache,
        }
    }

    /// News lists are always newest-first; only the search term varies.
    pub async fn list(
        &self,
        scope: ListScope,
        filter: NewsFilter,
        page: PageRequest,
    ) -> Result<PagedResult<NewsArticleRecord>, AppError> {
        let key = CacheKey::NewsList {
            scope,
            search: filter.search.clone(),
        };
        let search = filter.search.clone();
        let source = NewsListSource {
            repo: self.repo.clone(),
            scope,
            filter,
        };
        self.composer
            .compose(key, SortMode::Newest, search.as_deref(), page, &source)
            .await
            .map_err(AppError::from)
    }

    pub async fn get(&self, slug: &str) -> Result<NewsArticleRecord, AppError> {
        let key = CacheKey::NewsDetail {
            slug: slug.to_string(),
        };
        if let Some(article) = self.cache.get::<NewsArticleRecord>(&key) {
            return Ok(article);
        }

        match self.repo.find_by_slug(slug).await? {
            Some(article) => {
                self.cache.set(&key, article.clone(), self.detail_ttl);
                Ok(article)
            }
            None => Err(AppError::NotFound),
        }
    }

    pub async fn create(&self, input: NewArticle) -> Result<NewsArticleRecord, AppError> {
        if input.title.trim().is_empty() {
            return Err(AppError::validation("article title is required"));
        }
        if input.title.len() > MAX_TITLE_LEN {
            return Err(AppError::validation(format!(
                "title exceeds {MAX_TITLE_LEN} characters"
            )));
        }
        if input.body.trim().is_empty() {
            return Err(AppError::validation("article body is required"));
        }

        let base = slug::derive_slug(&input.title)?;
        let mut attempt = 0u32;
        let record = loop {
            let candidate = slug::with_suffix(&base, attempt);
            match self
                .repo
                .insert(CreateNewsParams {
                    title: input.title.clone(),
                    slug: candidate,
                    excerpt: input.excerpt.clone(),
                    body: input.body.clone(),
                    cover_url: input.cover_url.clone(),
                    published: input.published,
                })
                .await
            {
                Ok(record) => break record,
                Err(RepoError::Duplicate { constraint }) if constraint.contains("slug") => {
                    attempt += 1;
                    debug!(base = %base, attempt, "article slug taken, retrying with suffix");
                }
                Err(err) => {
                    error!(error = %err, title = %input.title, "article creation failed");
                    return Err(err.into());
                }
            }
        };

        self.cache.invalidate_family(KeyFamily::NewsLists);
        Ok(record)
    }

    pub async fn delete(&self, id: Uuid, slug: &str) -> Result<(), AppError> {
        self.repo.delete(id).await?;
        self.cache.invalidate_family(KeyFamily::NewsLists);
        self.cache.remove(&CacheKey::NewsDetail {
            slug: slug.to_string(),
        });
        Ok(())
    }
}

//! Direct-seller profile workflows.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error};
use uuid::Uuid;

use crate::application::composer::{ListComposer, ListSource};
use crate::application::error::AppError;
use crate::application::pagination::{PageRequest, PagedResult};
use crate::application::repos::{
    CreateSellerParams, RemoteOrder, RepoError, SellerFilter, SellersRepo,
};
use crate::cache::{CacheKey, KeyFamily, TtlStore};
use crate::domain::entities::SellerRecord;
use crate::domain::slug;
use crate::domain::types::{ListScope, SortMode};

const MAX_NAME_LEN: usize = 120;
const MAX_BIO_LEN: usize = 2000;

#[derive(Debug, Clone)]
pub struct NewSeller {
    pub display_name: String,
    pub country: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

pub struct SellerService {
    repo: Arc<dyn SellersRepo>,
    cache: Arc<TtlStore>,
    composer: ListComposer,
    detail_ttl: Duration,
}

struct SellerListSource {
    repo: Arc<dyn SellersRepo>,
    scope: ListScope,
    filter: SellerFilter,
}

#[async_trait]
impl ListSource<SellerRecord> for SellerListSource {
    async fn count(&self) -> Result<u64, RepoError> {
        self.repo.count(self.scope, &self.filter).await
    }

    async fn fetch_all(&self) -> Result<Vec<SellerRecord>, RepoError> {
        self.repo.fetch_all(self.scope, &self.filter).await
    }

    async fn fetch_page(
        &self,
        order: RemoteOrder,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<SellerRecord>, RepoError> {
        self.repo
            .fetch_page(self.scope, &self.filter, order, offset, limit)
            .await
    }
}

impl SellerService {
    pub fn new(
        repo: Arc<dyn SellersRepo>,
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

    pub async fn list(
        &self,
        scope: ListScope,
        filter: SellerFilter,
        sort: SortMode,
        page: PageRequest,
    ) -> Result<PagedResult<SellerRecord>, AppError> {
        let key = CacheKey::SellerList {
            scope,
            country: filter.country.clone(),
            search: filter.search.clone(),
            sort,
        };
        let search = filter.search.clone();
        let source = SellerListSource {
            repo: self.repo.clone(),
            scope,
            filter,
        };
        self.composer
            .compose(key, sort, search.as_deref(), page, &source)
            .await
            .map_err(AppError::from)
    }

    pub async fn get(&self, slug: &str) -> Result<SellerRecord, AppError> {
        let key = CacheKey::SellerDetail {
            slug: slug.to_string(),
        };
        if let Some(seller) = self.cache.get::<SellerRecord>(&key) {
            return Ok(seller);
        }

        match self.repo.find_by_slug(slug).await? {
            Some(seller) => {
                self.cache.set(&key, seller.clone(), self.detail_ttl);
                Ok(seller)
            }
            None => Err(AppError::NotFound),
        }
    }

    pub async fn create(&self, input: NewSeller) -> Result<SellerRecord, AppError> {
        if input.display_name.trim().is_empty() {
            return Err(AppError::validation("display name is required"));
        }
        if input.display_name.len() > MAX_NAME_LEN {
            return Err(AppError::validation(format!(
                "display name exceeds {MAX_NAME_LEN} characters"
            )));
        }
        if input.country.len() != 2 {
            return Err(AppError::validation(
                "country must be a two-letter ISO code",
            ));
        }
        if input.bio.as_deref().is_some_and(|bio| bio.len() > MAX_BIO_LEN) {
            return Err(AppError::validation(format!(
                "bio exceeds {MAX_BIO_LEN} characters"
            )));
        }

        let base = slug::derive_slug(&input.display_name)?;
        let mut attempt = 0u32;
        let record = loop {
            let candidate = slug::with_suffix(&base, attempt);
            match self
                .repo
                .insert(CreateSellerParams {
                    display_name: input.display_name.clone(),
                    slug: candidate,
                    country: input.country.clone(),
                    bio: input.bio.clone(),
                    avatar_url: input.avatar_url.clone(),
                })
                .await
            {
                Ok(record) => break record,
                Err(RepoError::Duplicate { constraint }) if constraint.contains("slug") => {
                    attempt += 1;
                    debug!(base = %base, attempt, "seller slug taken, retrying with suffix");
                }
                Err(err) => {
                    error!(error = %err, display_name = %input.display_name, "seller creation failed");
                    return Err(err.into());
                }
            }
        };

        self.cache.invalidate_family(KeyFamily::SellerLists);
        Ok(record)
    }

    pub async fn delete(&self, id: Uuid, slug: &str) -> Result<(), AppError> {
        self.repo.delete(id).await?;
        self.cache.invalidate_family(KeyFamily::SellerLists);
        self.cache.remove(&CacheKey::SellerDetail {
            slug: slug.to_string(),
        });
        Ok(())
    }
}

//! Classified-ad listing and management workflows.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error};
use uuid::Uuid;

use crate::application::composer::{ListComposer, ListSource};
use crate::application::error::AppError;
use crate::application::pagination::{PageRequest, PagedResult};
use crate::application::repos::{
    ClassifiedsRepo, CreateClassifiedParams, ListingFilter, RemoteOrder, RepoError,
};
use crate::cache::{CacheKey, KeyFamily, TtlStore};
use crate::domain::entities::ClassifiedRecord;
use crate::domain::slug;
use crate::domain::types::{ListScope, SortMode};

const MAX_TITLE_LEN: usize = 140;
const MAX_DESCRIPTION_LEN: usize = 4000;

#[derive(Debug, Clone)]
pub struct NewClassified {
    pub title: String,
    pub description: String,
    pub price: Option<f64>,
    pub country: String,
    pub category_id: Uuid,
    pub image_url: Option<String>,
    pub seller_id: Option<Uuid>,
}

pub struct ClassifiedService {
    repo: Arc<dyn ClassifiedsRepo>,
    cache: Arc<TtlStore>,
    composer: ListComposer,
    detail_ttl: Duration,
}

struct ClassifiedListSource {
    repo: Arc<dyn ClassifiedsRepo>,
    scope: ListScope,
    filter: ListingFilter,
}

#[async_trait]
impl ListSource<ClassifiedRecord> for ClassifiedListSource {
    async fn count(&self) -> Result<u64, RepoError> {
        self.repo.count(self.scope, &self.filter).await
    }

    async fn fetch_all(&self) -> Result<Vec<ClassifiedRecord>, RepoError> {
        self.repo.fetch_all(self.scope, &self.filter).await
    }

    async fn fetch_page(
        &self,
        order: RemoteOrder,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<ClassifiedRecord>, RepoError> {
        self.repo
            .fetch_page(self.scope, &self.filter, order, offset, limit)
            .await
    }
}

impl ClassifiedService {
    pub fn new(
        repo: Arc<dyn ClassifiedsRepo>,
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
        filter: ListingFilter,
        sort: SortMode,
        page: PageRequest,
    ) -> Result<PagedResult<ClassifiedRecord>, AppError> {
        let key = CacheKey::ClassifiedList {
            scope,
            country: filter.country.clone(),
            category: filter.category,
            search: filter.search.clone(),
            sort,
        };
        let search = filter.search.clone();
        let source = ClassifiedListSource {
            repo: self.repo.clone(),
            scope,
            filter,
        };
        self.composer
            .compose(key, sort, search.as_deref(), page, &source)
            .await
            .map_err(AppError::from)
    }

    pub async fn get(&self, slug: &str) -> Result<ClassifiedRecord, AppError> {
        let key = CacheKey::ClassifiedDetail {
            slug: slug.to_string(),
        };
        if let Some(classified) = self.cache.get::<ClassifiedRecord>(&key) {
            return Ok(classified);
        }

        match self.repo.find_by_slug(slug).await? {
            Some(classified) => {
                self.cache.set(&key, classified.clone(), self.detail_ttl);
                Ok(classified)
            }
            None => Err(AppError::NotFound),
        }
    }

    pub async fn create(&self, input: NewClassified) -> Result<ClassifiedRecord, AppError> {
        validate_new_classified(&input)?;

        let base = slug::derive_slug(&input.title)?;
        let mut attempt = 0u32;
        let record = loop {
            let candidate = slug::with_suffix(&base, attempt);
            match self
                .repo
                .insert(CreateClassifiedParams {
                    title: input.title.clone(),
                    slug: candidate,
                    description: input.description.clone(),
                    price: input.price,
                    country: input.country.clone(),
                    category_id: input.category_id,
                    image_url: input.image_url.clone(),
                    seller_id: input.seller_id,
                })
                .await
            {
                Ok(record) => break record,
                Err(RepoError::Duplicate { constraint }) if constraint.contains("slug") => {
                    attempt += 1;
                    debug!(base = %base, attempt, "classified slug taken, retrying with suffix");
                }
                Err(err) => {
                    error!(error = %err, title = %input.title, "classified creation failed");
                    return Err(err.into());
                }
            }
        };

        self.cache.invalidate_family(KeyFamily::ClassifiedLists);
        Ok(record)
    }

    pub async fn delete(&self, id: Uuid, slug: &str) -> Result<(), AppError> {
        self.repo.delete(id).await?;
        self.cache.invalidate_family(KeyFamily::ClassifiedLists);
        self.cache.remove(&CacheKey::ClassifiedDetail {
            slug: slug.to_string(),
        });
        Ok(())
    }
}

fn validate_new_classified(input: &NewClassified) -> Result<(), AppError> {
    if input.title.trim().is_empty() {
        return Err(AppError::validation("classified title is required"));
    }
    if input.title.len() > MAX_TITLE_LEN {
        return Err(AppError::validation(format!(
            "title exceeds {MAX_TITLE_LEN} characters"
        )));
    }
    if input.description.trim().is_empty() {
        return Err(AppError::validation("description is required"));
    }
    if input.description.len() > MAX_DESCRIPTION_LEN {
        return Err(AppError::validation(format!(
            "description exceeds {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    if input.country.len() != 2 {
        return Err(AppError::validation(
            "country must be a two-letter ISO code",
        ));
    }
    if let Some(price) = input.price {
        if !price.is_finite() || price < 0.0 {
            return Err(AppError::validation("price must be a non-negative number"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> NewClassified {
        NewClassified {
            title: "Garden table".to_string(),
            description: "Solid wood".to_string(),
            price: Some(50.0),
            country: "us".to_string(),
            category_id: Uuid::new_v4(),
            image_url: None,
            seller_id: None,
        }
    }

    #[test]
    fn validation_rejects_negative_price() {
        let candidate = NewClassified {
            price: Some(-1.0),
            ..input()
        };
        assert!(validate_new_classified(&candidate).is_err());
    }

    #[test]
    fn validation_accepts_free_items() {
        let candidate = NewClassified {
            price: None,
            ..input()
        };
        assert!(validate_new_classified(&candidate).is_ok());
    }
}

//! Country and category lookups, cached under the near-static tier.

use std::sync::Arc;
use std::time::Duration;

use crate::application::error::AppError;
use crate::application::repos::TaxonomyRepo;
use crate::cache::{CacheKey, TtlStore};
use crate::domain::entities::{CategoryRecord, CountryRecord};
use crate::domain::types::CategoryKind;

pub struct TaxonomyService {
    repo: Arc<dyn TaxonomyRepo>,
    cache: Arc<TtlStore>,
    static_ttl: Duration,
}

impl TaxonomyService {
    pub fn new(repo: Arc<dyn TaxonomyRepo>, cache: Arc<TtlStore>, static_ttl: Duration) -> Self {
        Self {
            repo,
            cache,
            static_ttl,
        }
    }

    pub async fn countries(&self) -> Result<Vec<CountryRecord>, AppError> {
        if let Some(countries) = self.cache.get::<Vec<CountryRecord>>(&CacheKey::Countries) {
            return Ok(countries);
        }

        let countries = self.repo.countries().await?;
        self.cache
            .set(&CacheKey::Countries, countries.clone(), self.static_ttl);
        Ok(countries)
    }

    pub async fn categories(&self, kind: CategoryKind) -> Result<Vec<CategoryRecord>, AppError> {
        let key = CacheKey::Categories { kind };
        if let Some(categories) = self.cache.get::<Vec<CategoryRecord>>(&key) {
            return Ok(categories);
        }

        let categories = self.repo.categories(kind).await?;
        self.cache.set(&key, categories.clone(), self.static_ttl);
        Ok(categories)
    }
}

//! Company listing and management workflows.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, warn};
use url::Url;
use uuid::Uuid;

use crate::application::composer::{ListComposer, ListSource};
use crate::application::error::AppError;
use crate::application::pagination::{PageRequest, PagedResult};
use crate::application::repos::{
    CompaniesRepo, CreateCompanyParams, ListingFilter, RemoteOrder, RepoError,
    UpdateCompanyParams,
};
use crate::cache::{CacheKey, KeyFamily, TtlStore};
use crate::domain::entities::CompanyRecord;
use crate::domain::slug;
use crate::domain::types::{ListScope, SortMode};

const MAX_NAME_LEN: usize = 120;
const MAX_DESCRIPTION_LEN: usize = 2000;

/// Validated-on-entry input for company creation.
#[derive(Debug, Clone)]
pub struct NewCompany {
    pub name: String,
    pub description: String,
    pub country: String,
    pub category_id: Uuid,
    pub website: Option<String>,
    pub logo_url: Option<String>,
}

pub struct CompanyService {
    repo: Arc<dyn CompaniesRepo>,
    cache: Arc<TtlStore>,
    composer: ListComposer,
    detail_ttl: Duration,
}

struct CompanyListSource {
    repo: Arc<dyn CompaniesRepo>,
    scope: ListScope,
    filter: ListingFilter,
}

#[async_trait]
impl ListSource<CompanyRecord> for CompanyListSource {
    async fn count(&self) -> Result<u64, RepoError> {
        self.repo.count(self.scope, &self.filter).await
    }

    async fn fetch_all(&self) -> Result<Vec<CompanyRecord>, RepoError> {
        self.repo.fetch_all(self.scope, &self.filter).await
    }

    async fn fetch_page(
        &self,
        order: RemoteOrder,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<CompanyRecord>, RepoError> {
        self.repo
            .fetch_page(self.scope, &self.filter, order, offset, limit)
            .await
    }
}

impl CompanyService {
    pub fn new(
        repo: Arc<dyn CompaniesRepo>,
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

    /// One page of companies for the active filters. Served from the cached
    /// sorted set when the filters match a previous load.
    pub async fn list(
        &self,
        scope: ListScope,
        filter: ListingFilter,
        sort: SortMode,
        page: PageRequest,
    ) -> Result<PagedResult<CompanyRecord>, AppError> {
        let key = CacheKey::CompanyList {
            scope,
            country: filter.country.clone(),
            category: filter.category,
            search: filter.search.clone(),
            sort,
        };
        let search = filter.search.clone();
        let source = CompanyListSource {
            repo: self.repo.clone(),
            scope,
            filter,
        };
        self.composer
            .compose(key, sort, search.as_deref(), page, &source)
            .await
            .map_err(AppError::from)
    }

    /// Detail lookup by slug. `NotFound` is typed so the consumer can redirect
    /// to the company list instead of rendering an empty detail view.
    pub async fn get(&self, slug: &str) -> Result<CompanyRecord, AppError> {
        let key = CacheKey::CompanyDetail {
            slug: slug.to_string(),
        };
        if let Some(company) = self.cache.get::<CompanyRecord>(&key) {
            return Ok(company);
        }

        match self.repo.find_by_slug(slug).await? {
            Some(company) => {
                self.cache.set(&key, company.clone(), self.detail_ttl);
                Ok(company)
            }
            None => Err(AppError::NotFound),
        }
    }

    /// Create a company. The slug pre-check is the backend's unique
    /// constraint: on a duplicate we advance the numeric suffix and retry, so
    /// concurrent writers converge instead of racing the check.
    pub async fn create(&self, input: NewCompany) -> Result<CompanyRecord, AppError> {
        validate_new_company(&input)?;

        let base = slug::derive_slug(&input.name)?;
        let mut attempt = 0u32;
        let record = loop {
            let candidate = slug::with_suffix(&base, attempt);
            match self
                .repo
                .insert(CreateCompanyParams {
                    name: input.name.clone(),
                    slug: candidate,
                    description: input.description.clone(),
                    country: input.country.clone(),
                    category_id: input.category_id,
                    website: input.website.clone(),
                    logo_url: input.logo_url.clone(),
                })
                .await
            {
                Ok(record) => break record,
                Err(RepoError::Duplicate { constraint }) if constraint.contains("slug") => {
                    attempt += 1;
                    debug!(base = %base, attempt, "company slug taken, retrying with suffix");
                }
                Err(err) => {
                    error!(error = %err, name = %input.name, "company creation failed");
                    return Err(err.into());
                }
            }
        };

        self.cache.invalidate_family(KeyFamily::CompanyLists);
        Ok(record)
    }

    pub async fn update(&self, params: UpdateCompanyParams) -> Result<CompanyRecord, AppError> {
        if params.description.trim().is_empty() {
            return Err(AppError::validation("description is required"));
        }
        if let Some(website) = params.website.as_deref() {
            validate_website(website)?;
        }

        let record = self.repo.update(params).await?;
        self.cache.invalidate_family(KeyFamily::CompanyLists);
        self.cache.remove(&CacheKey::CompanyDetail {
            slug: record.slug.clone(),
        });
        Ok(record)
    }

    pub async fn delete(&self, id: Uuid, slug: &str) -> Result<(), AppError> {
        self.repo.delete(id).await?;
        self.cache.invalidate_family(KeyFamily::CompanyLists);
        self.cache.invalidate_family(KeyFamily::CompanyRatings);
        self.cache.remove(&CacheKey::CompanyDetail {
            slug: slug.to_string(),
        });
        Ok(())
    }

    /// View-count bookkeeping. Fire-and-forget: a failed increment is logged
    /// and never surfaced to the page flow.
    pub async fn record_view(&self, id: Uuid) {
        if let Err(error) = self.repo.record_view(id).await {
            warn!(company_id = %id, error = %error, "view recording failed");
        }
    }
}

fn validate_new_company(input: &NewCompany) -> Result<(), AppError> {
    if input.name.trim().is_empty() {
        return Err(AppError::validation("company name is required"));
    }
    if input.name.len() > MAX_NAME_LEN {
        return Err(AppError::validation(format!(
            "company name exceeds {MAX_NAME_LEN} characters"
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
    if let Some(website) = input.website.as_deref() {
        validate_website(website)?;
    }
    Ok(())
}

fn validate_website(website: &str) -> Result<(), AppError> {
    let url = Url::parse(website)
        .map_err(|err| AppError::validation(format!("website is not a valid URL: {err}")))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(AppError::validation("website must use http or https"));
    }
    Ok(())
}

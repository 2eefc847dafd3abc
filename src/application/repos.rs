//! Repository traits describing the hosted backend's query surface.
//!
//! The remote platform owns every row; these traits are the seam between the
//! application services and the REST adapter in `infra::rest` (or in-memory
//! fakes under test).
//!
//! Free-text search contract: `count` and `fetch_all` apply only structural
//! filters (scope, country, category) so the composer can match the term
//! against joined display fields client-side; `fetch_page` is the capped
//! fallback and applies the term remotely against the entity's own columns.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::entities::{
    CategoryRecord, ClassifiedRecord, CompanyRecord, CountryRecord, NewsArticleRecord,
    RatingSummary, ReviewRecord, SellerRecord,
};
use crate::domain::types::{CategoryKind, ListScope};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("backend error: {0}")]
    Backend(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

impl RepoError {
    pub fn from_backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

/// Remote ordering for the capped fallback path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteOrder {
    CreatedDesc,
    NameAsc,
    /// Orders on the denormalized vote-count column; rating tie-breaks are
    /// not available remotely.
    VotesDesc,
}

/// Structural filters shared by company and classified listings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingFilter {
    pub country: Option<String>,
    pub category: Option<Uuid>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewsFilter {
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SellerFilter {
    pub country: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateCompanyParams {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub country: String,
    pub category_id: Uuid,
    pub website: Option<String>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdateCompanyParams {
    pub id: Uuid,
    pub description: String,
    pub category_id: Uuid,
    pub website: Option<String>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateClassifiedParams {
    pub title: String,
    pub slug: String,
    pub description: String,
    pub price: Option<f64>,
    pub country: String,
    pub category_id: Uuid,
    pub image_url: Option<String>,
    pub seller_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct CreateNewsParams {
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub body: String,
    pub cover_url: Option<String>,
    pub published: bool,
}

#[derive(Debug, Clone)]
pub struct CreateSellerParams {
    pub display_name: String,
    pub slug: String,
    pub country: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

#[async_trait]
pub trait CompaniesRepo: Send + Sync {
    async fn count(&self, scope: ListScope, filter: &ListingFilter) -> Result<u64, RepoError>;

    /// Entire structurally filtered set, remote-ordered by `created_at`
    /// descending. The free-text term is not applied here.
    async fn fetch_all(
        &self,
        scope: ListScope,
        filter: &ListingFilter,
    ) -> Result<Vec<CompanyRecord>, RepoError>;

    /// One remote-ordered page; applies the free-text term remotely.
    async fn fetch_page(
        &self,
        scope: ListScope,
        filter: &ListingFilter,
        order: RemoteOrder,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<CompanyRecord>, RepoError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<CompanyRecord>, RepoError>;

    async fn insert(&self, params: CreateCompanyParams) -> Result<CompanyRecord, RepoError>;

    async fn update(&self, params: UpdateCompanyParams) -> Result<CompanyRecord, RepoError>;

    async fn delete(&self, id: Uuid) -> Result<(), RepoError>;

    /// View-count bookkeeping RPC. Fire-and-forget from the caller's side.
    async fn record_view(&self, id: Uuid) -> Result<(), RepoError>;
}

#[async_trait]
pub trait ClassifiedsRepo: Send + Sync {
    async fn count(&self, scope: ListScope, filter: &ListingFilter) -> Result<u64, RepoError>;

    async fn fetch_all(
        &self,
        scope: ListScope,
        filter: &ListingFilter,
    ) -> Result<Vec<ClassifiedRecord>, RepoError>;

    async fn fetch_page(
        &self,
        scope: ListScope,
        filter: &ListingFilter,
        order: RemoteOrder,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<ClassifiedRecord>, RepoError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<ClassifiedRecord>, RepoError>;

    async fn insert(&self, params: CreateClassifiedParams) -> Result<ClassifiedRecord, RepoError>;

    async fn delete(&self, id: Uuid) -> Result<(), RepoError>;
}

#[async_trait]
pub trait NewsRepo: Send + Sync {
    async fn count(&self, scope: ListScope, filter: &NewsFilter) -> Result<u64, RepoError>;

    async fn fetch_all(
        &self,
        scope: ListScope,
        filter: &NewsFilter,
    ) -> Result<Vec<NewsArticleRecord>, RepoError>;

    async fn fetch_page(
        &self,
        scope: ListScope,
        filter: &NewsFilter,
        order: RemoteOrder,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<NewsArticleRecord>, RepoError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<NewsArticleRecord>, RepoError>;

    async fn insert(&self, params: CreateNewsParams) -> Result<NewsArticleRecord, RepoError>;

    async fn delete(&self, id: Uuid) -> Result<(), RepoError>;
}

#[async_trait]
pub trait SellersRepo: Send + Sync {
    async fn count(&self, scope: ListScope, filter: &SellerFilter) -> Result<u64, RepoError>;

    async fn fetch_all(
        &self,
        scope: ListScope,
        filter: &SellerFilter,
    ) -> Result<Vec<SellerRecord>, RepoError>;

    async fn fetch_page(
        &self,
        scope: ListScope,
        filter: &SellerFilter,
        order: RemoteOrder,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<SellerRecord>, RepoError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<SellerRecord>, RepoError>;

    async fn insert(&self, params: CreateSellerParams) -> Result<SellerRecord, RepoError>;

    async fn delete(&self, id: Uuid) -> Result<(), RepoError>;
}

#[async_trait]
pub trait ReviewsRepo: Send + Sync {
    /// The user's single `voting: true` row for the company, if any.
    async fn find_vote(
        &self,
        user_id: Uuid,
        company_id: Uuid,
    ) -> Result<Option<ReviewRecord>, RepoError>;

    /// The user's single `voting: false` row for the company, if any.
    async fn find_review(
        &self,
        user_id: Uuid,
        company_id: Uuid,
    ) -> Result<Option<ReviewRecord>, RepoError>;

    async fn insert_vote(
        &self,
        user_id: Uuid,
        company_id: Uuid,
        rating: i16,
    ) -> Result<ReviewRecord, RepoError>;

    /// Refresh the rating on an existing vote row (a returning voter after
    /// the cooldown keeps the single row per (user, company)).
    async fn update_vote(&self, id: Uuid, rating: i16) -> Result<ReviewRecord, RepoError>;

    /// Insert or replace the text of the user's review row. Never touches the
    /// vote row.
    async fn upsert_review(
        &self,
        user_id: Uuid,
        company_id: Uuid,
        comment: &str,
    ) -> Result<ReviewRecord, RepoError>;

    /// Review rows (`voting: false`) for a company, newest first.
    async fn list_for_company(&self, company_id: Uuid) -> Result<Vec<ReviewRecord>, RepoError>;

    async fn aggregate_rating(&self, company_id: Uuid) -> Result<RatingSummary, RepoError>;

    async fn vote_count(&self, company_id: Uuid) -> Result<i64, RepoError>;

    /// Annual-cooldown eligibility check, evaluated remotely.
    async fn can_vote(&self, user_id: Uuid, company_id: Uuid) -> Result<bool, RepoError>;

    async fn award_points(&self, user_id: Uuid, action: &str) -> Result<(), RepoError>;
}

#[async_trait]
pub trait TaxonomyRepo: Send + Sync {
    async fn countries(&self) -> Result<Vec<CountryRecord>, RepoError>;

    async fn categories(&self, kind: CategoryKind) -> Result<Vec<CategoryRecord>, RepoError>;
}

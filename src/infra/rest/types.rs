//! Wire rows for the hosted platform's JSON payloads and their conversions
//! into domain records. Joined fields are flattened here (`category.name`
//! becomes `category_name`).

use serde::Deserialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::entities::{
    CategoryRecord, ClassifiedRecord, CompanyRecord, CountryRecord, NewsArticleRecord,
    RatingSummary, ReviewRecord, SellerRecord,
};
use crate::domain::types::CategoryKind;

#[derive(Debug, Deserialize)]
pub(crate) struct CategoryRef {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompanyRow {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub country: String,
    pub category_id: Uuid,
    #[serde(default)]
    pub category: Option<CategoryRef>,
    pub website: Option<String>,
    pub logo_url: Option<String>,
    pub approved: bool,
    #[serde(default)]
    pub vote_count: i64,
    #[serde(default)]
    pub avg_rating: Option<f64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<CompanyRow> for CompanyRecord {
    fn from(row: CompanyRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            country: row.country,
            category_id: row.category_id,
            category_name: row.category.map(|category| category.name),
            website: row.website,
            logo_url: row.logo_url,
            approved: row.approved,
            vote_count: row.vote_count,
            avg_rating: row.avg_rating,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ClassifiedRow {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub price: Option<f64>,
    pub country: String,
    pub category_id: Uuid,
    #[serde(default)]
    pub category: Option<CategoryRef>,
    pub image_url: Option<String>,
    pub seller_id: Option<Uuid>,
    pub approved: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<ClassifiedRow> for ClassifiedRecord {
    fn from(row: ClassifiedRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            slug: row.slug,
            description: row.description,
            price: row.price,
            country: row.country,
            category_id: row.category_id,
            category_name: row.category.map(|category| category.name),
            image_url: row.image_url,
            seller_id: row.seller_id,
            approved: row.approved,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct NewsArticleRow {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub body: String,
    pub cover_url: Option<String>,
    pub published: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<NewsArticleRow> for NewsArticleRecord {
    fn from(row: NewsArticleRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            slug: row.slug,
            excerpt: row.excerpt,
            body: row.body,
            cover_url: row.cover_url,
            published: row.published,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SellerRow {
    pub id: Uuid,
    pub display_name: String,
    pub slug: String,
    pub country: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<SellerRow> for SellerRecord {
    fn from(row: SellerRow) -> Self {
        Self {
            id: row.id,
            display_name: row.display_name,
            slug: row.slug,
            country: row.country,
            bio: row.bio,
            avatar_url: row.avatar_url,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReviewRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub rating: Option<i16>,
    pub comment: Option<String>,
    /// Review-only rows may carry `false` or null.
    #[serde(default)]
    pub voting: Option<bool>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<ReviewRow> for ReviewRecord {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            company_id: row.company_id,
            rating: row.rating,
            comment: row.comment,
            voting: row.voting.unwrap_or(false),
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RatingSummaryRow {
    pub average: Option<f64>,
    pub votes: i64,
}

impl From<RatingSummaryRow> for RatingSummary {
    fn from(row: RatingSummaryRow) -> Self {
        Self {
            average: row.average.unwrap_or(0.0),
            votes: row.votes,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CountryRow {
    pub code: String,
    pub name: String,
}

impl From<CountryRow> for CountryRecord {
    fn from(row: CountryRow) -> Self {
        Self {
            code: row.code,
            name: row.name,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CategoryRow {
    pub id: Uuid,
    pub name: String,
    pub kind: CategoryKind,
}

impl From<CategoryRow> for CategoryRecord {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            kind: row.kind,
        }
    }
}

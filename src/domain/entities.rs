//! Domain entities mirrored from the hosted backend.
//!
//! Records are immutable DTOs within a request cycle: mutations go to the
//! backend and are followed by a re-fetch, never merged locally.

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyRecord {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub country: String,
    pub category_id: Uuid,
    /// Flattened from the joined category row.
    pub category_name: Option<String>,
    pub website: Option<String>,
    pub logo_url: Option<String>,
    pub approved: bool,
    /// Denormalized aggregates carried on the row for list ordering; the
    /// authoritative values come from the rating RPCs.
    pub vote_count: i64,
    pub avg_rating: Option<f64>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedRecord {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub price: Option<f64>,
    pub country: String,
    pub category_id: Uuid,
    pub category_name: Option<String>,
    pub image_url: Option<String>,
    pub seller_id: Option<Uuid>,
    pub approved: bool,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsArticleRecord {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub body: String,
    pub cover_url: Option<String>,
    pub published: bool,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SellerRecord {
    pub id: Uuid,
    pub display_name: String,
    pub slug: String,
    pub country: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: OffsetDateTime,
}

/// A row in the reviews table. `voting: true` rows carry a rating and count
/// toward the aggregate; `voting: false` rows are free-text only. A user holds
/// at most one of each per company, independently.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub rating: Option<i16>,
    pub comment: Option<String>,
    pub voting: bool,
    pub created_at: OffsetDateTime,
}

impl ReviewRecord {
    pub fn is_vote(&self) -> bool {
        self.voting
    }
}

/// Result of the `aggregate_rating` remote procedure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatingSummary {
    pub average: f64,
    pub votes: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryRecord {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRecord {
    pub id: Uuid,
    pub name: String,
    pub kind: crate::domain::types::CategoryKind,
}

//! Voting and review rules.
//!
//! A vote (`voting: true`) is a rating-only submission subject to a
//! once-per-year cooldown evaluated by the backend's `can_vote` procedure. A
//! review (`voting: false`) is free-text feedback tracked independently: a
//! user holds at most one of each per company, and neither submission touches
//! the other's row or cooldown.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, warn};
use uuid::Uuid;

use crate::application::error::AppError;
use crate::cache::{CacheKey, KeyFamily, TtlStore};
use crate::domain::entities::{RatingSummary, ReviewRecord};

const MAX_COMMENT_LEN: usize = 2000;
const POINTS_ACTION_VOTE: &str = "company_vote";

pub struct ReviewService {
    repo: Arc<dyn crate::application::repos::ReviewsRepo>,
    cache: Arc<TtlStore>,
    volatile_ttl: Duration,
}

impl ReviewService {
    pub fn new(
        repo: Arc<dyn crate::application::repos::ReviewsRepo>,
        cache: Arc<TtlStore>,
        volatile_ttl: Duration,
    ) -> Self {
        Self {
            repo,
            cache,
            volatile_ttl,
        }
    }

    /// Submit a rating vote. Eligibility is the backend's call (annual
    /// cooldown); an ineligible vote is a validation failure that never
    /// mutates anything. A successful vote invalidates the rating family and
    /// the company lists, whose ordering can depend on vote counts.
    pub async fn submit_vote(
        &self,
        user_id: Uuid,
        company_id: Uuid,
        rating: i16,
    ) -> Result<ReviewRecord, AppError> {
        if !(1..=5).contains(&rating) {
            return Err(AppError::validation("rating must be between 1 and 5"));
        }

        if !self.repo.can_vote(user_id, company_id).await? {
            return Err(AppError::validation(
                "a company can be rated once per year",
            ));
        }

        // A returning voter still holds the single vote row from the previous
        // cycle; refresh it instead of colliding with the (user, company)
        // pair constraint.
        let existing = self.repo.find_vote(user_id, company_id).await?;
        let result = match existing {
            Some(previous) => self.repo.update_vote(previous.id, rating).await,
            None => self.repo.insert_vote(user_id, company_id, rating).await,
        };
        let record = match result {
            Ok(record) => record,
            Err(err) => {
                error!(company_id = %company_id, error = %err, "vote submission failed");
                return Err(err.into());
            }
        };

        // Point bookkeeping is best-effort; the vote already landed.
        if let Err(err) = self.repo.award_points(user_id, POINTS_ACTION_VOTE).await {
            warn!(user_id = %user_id, error = %err, "point award failed after vote");
        }

        self.cache.invalidate_family(KeyFamily::CompanyRatings);
        self.cache.invalidate_family(KeyFamily::CompanyLists);
        Ok(record)
    }

    /// Insert or replace the user's free-text review. Independent of the vote
    /// row: it neither consumes nor resets the annual cooldown.
    pub async fn submit_review(
        &self,
        user_id: Uuid,
        company_id: Uuid,
        comment: &str,
    ) -> Result<ReviewRecord, AppError> {
        let text = comment.trim();
        if text.is_empty() {
            return Err(AppError::validation("review text is required"));
        }
        if text.len() > MAX_COMMENT_LEN {
            return Err(AppError::validation(format!(
                "review exceeds {MAX_COMMENT_LEN} characters"
            )));
        }

        // One review row per (user, company); an unchanged resubmission
        // performs no write.
        if let Some(existing) = self.repo.find_review(user_id, company_id).await? {
            if existing.comment.as_deref() == Some(text) {
                return Ok(existing);
            }
        }

        self.repo
            .upsert_review(user_id, company_id, text)
            .await
            .map_err(AppError::from)
    }

    /// Review rows for a company, newest first. Not cached: review lists are
    /// read immediately after submission.
    pub async fn reviews_for(&self, company_id: Uuid) -> Result<Vec<ReviewRecord>, AppError> {
        self.repo
            .list_for_company(company_id)
            .await
            .map_err(AppError::from)
    }

    /// Aggregate rating from the backend procedure, cached under the volatile
    /// tier.
    pub async fn rating(&self, company_id: Uuid) -> Result<RatingSummary, AppError> {
        let key = CacheKey::CompanyRating { id: company_id };
        if let Some(summary) = self.cache.get::<RatingSummary>(&key) {
            return Ok(summary);
        }

        let summary = self.repo.aggregate_rating(company_id).await?;
        self.cache.set(&key, summary, self.volatile_ttl);
        Ok(summary)
    }

    /// Vote count from the backend procedure, cached under the volatile tier.
    pub async fn vote_count(&self, company_id: Uuid) -> Result<i64, AppError> {
        let key = CacheKey::CompanyVoteCount { id: company_id };
        if let Some(count) = self.cache.get::<i64>(&key) {
            return Ok(count);
        }

        let count = self.repo.vote_count(company_id).await?;
        self.cache.set(&key, count, self.volatile_ttl);
        Ok(count)
    }

    /// Whether the user may vote right now. Evaluated remotely, never cached.
    pub async fn can_vote(&self, user_id: Uuid, company_id: Uuid) -> Result<bool, AppError> {
        self.repo
            .can_vote(user_id, company_id)
            .await
            .map_err(AppError::from)
    }
}

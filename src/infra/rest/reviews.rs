use async_trait::async_trait;
use serde_json::json;
use uuid::Uuid;

use crate::application::repos::{RepoError, ReviewsRepo};
use crate::domain::entities::{RatingSummary, ReviewRecord};

use super::types::{RatingSummaryRow, ReviewRow};
use super::{RestBackend, TableQuery};

const TABLE: &str = "company_reviews";
// One review row per (user, company); `voting` keeps the vote row distinct.
const REVIEW_CONFLICT_KEY: &str = "user_id,company_id,voting";

#[async_trait]
impl ReviewsRepo for RestBackend {
    async fn find_vote(
        &self,
        user_id: Uuid,
        company_id: Uuid,
    ) -> Result<Option<ReviewRecord>, RepoError> {
        let query = TableQuery::new()
            .eq("user_id", user_id)
            .eq("company_id", company_id)
            .is_true("voting");
        let row = self.select_one::<ReviewRow>(TABLE, query).await?;
        Ok(row.map(ReviewRecord::from))
    }

    async fn find_review(
        &self,
        user_id: Uuid,
        company_id: Uuid,
    ) -> Result<Option<ReviewRecord>, RepoError> {
        let query = TableQuery::new()
            .eq("user_id", user_id)
            .eq("company_id", company_id)
            .not_true("voting");
        let row = self.select_one::<ReviewRow>(TABLE, query).await?;
        Ok(row.map(ReviewRecord::from))
    }

    async fn insert_vote(
        &self,
        user_id: Uuid,
        company_id: Uuid,
        rating: i16,
    ) -> Result<ReviewRecord, RepoError> {
        let body = json!({
            "user_id": user_id,
            "company_id": company_id,
            "rating": rating,
            "voting": true,
        });
        let row = self
            .insert_row::<ReviewRow>(TABLE, body, TableQuery::new())
            .await?;
        Ok(ReviewRecord::from(row))
    }

    async fn update_vote(&self, id: Uuid, rating: i16) -> Result<ReviewRecord, RepoError> {
        let body = json!({ "rating": rating });
        let row = self
            .update_row::<ReviewRow>(TABLE, id, body, TableQuery::new())
            .await?;
        Ok(ReviewRecord::from(row))
    }

    async fn upsert_review(
        &self,
        user_id: Uuid,
        company_id: Uuid,
        comment: &str,
    ) -> Result<ReviewRecord, RepoError> {
        let body = json!({
            "user_id": user_id,
            "company_id": company_id,
            "comment": comment,
            "voting": false,
        });
        let row = self
            .upsert_row::<ReviewRow>(TABLE, REVIEW_CONFLICT_KEY, body, TableQuery::new())
            .await?;
        Ok(ReviewRecord::from(row))
    }

    async fn list_for_company(&self, company_id: Uuid) -> Result<Vec<ReviewRecord>, RepoError> {
        let query = TableQuery::new()
            .eq("company_id", company_id)
            .not_true("voting")
            .order_desc("created_at");
        let rows = self.select_rows::<ReviewRow>(TABLE, query).await?;
        Ok(rows.into_iter().map(ReviewRecord::from).collect())
    }

    async fn aggregate_rating(&self, company_id: Uuid) -> Result<RatingSummary, RepoError> {
        let row = self
            .rpc::<RatingSummaryRow>("aggregate_rating", json!({ "company_id": company_id }))
            .await?;
        Ok(RatingSummary::from(row))
    }

    async fn vote_count(&self, company_id: Uuid) -> Result<i64, RepoError> {
        self.rpc::<i64>("company_vote_count", json!({ "company_id": company_id }))
            .await
    }

    async fn can_vote(&self, user_id: Uuid, company_id: Uuid) -> Result<bool, RepoError> {
        self.rpc::<bool>(
            "can_vote",
            json!({ "user_id": user_id, "company_id": company_id }),
        )
        .await
    }

    async fn award_points(&self, user_id: Uuid, action: &str) -> Result<(), RepoError> {
        self.rpc_unit(
            "award_points",
            json!({ "user_id": user_id, "action": action }),
        )
        .await
    }
}

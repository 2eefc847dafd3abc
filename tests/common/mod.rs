//! In-memory backend for exercising the services without a network. Call
//! counters let tests assert how many remote round trips a flow performed.
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use time::{Duration as TimeDuration, OffsetDateTime};
use uuid::Uuid;

use vitrina::application::repos::{
    CompaniesRepo, CreateCompanyParams, ListingFilter, RemoteOrder, RepoError, ReviewsRepo,
    UpdateCompanyParams,
};
use vitrina::domain::entities::{CompanyRecord, RatingSummary, ReviewRecord};
use vitrina::domain::types::ListScope;

#[derive(Default)]
pub struct CallCounts {
    pub count: AtomicUsize,
    pub fetch_all: AtomicUsize,
    pub fetch_page: AtomicUsize,
    pub find: AtomicUsize,
    pub insert: AtomicUsize,
    pub rpc: AtomicUsize,
}

impl CallCounts {
    pub fn remote_total(&self) -> usize {
        self.count.load(Ordering::SeqCst)
            + self.fetch_all.load(Ordering::SeqCst)
            + self.fetch_page.load(Ordering::SeqCst)
            + self.find.load(Ordering::SeqCst)
            + self.insert.load(Ordering::SeqCst)
            + self.rpc.load(Ordering::SeqCst)
    }
}

/// Seedable in-memory stand-in for the hosted backend.
#[derive(Default)]
pub struct FakeBackend {
    pub companies: Mutex<Vec<CompanyRecord>>,
    pub reviews: Mutex<Vec<ReviewRecord>>,
    /// (user, company) pairs inside the annual vote cooldown.
    pub cooldown: Mutex<HashSet<(Uuid, Uuid)>>,
    pub calls: CallCounts,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_company(&self, record: CompanyRecord) {
        self.companies.lock().unwrap().push(record);
    }

    /// Simulate the annual cooldown lapsing for one (user, company) pair.
    pub fn expire_cooldown(&self, user_id: Uuid, company_id: Uuid) {
        self.cooldown.lock().unwrap().remove(&(user_id, company_id));
    }

    pub fn vote_rows(&self, company_id: Uuid) -> Vec<ReviewRecord> {
        self.reviews
            .lock()
            .unwrap()
            .iter()
            .filter(|row| row.company_id == company_id && row.voting)
            .cloned()
            .collect()
    }

    pub fn review_rows(&self, company_id: Uuid) -> Vec<ReviewRecord> {
        self.reviews
            .lock()
            .unwrap()
            .iter()
            .filter(|row| row.company_id == company_id && !row.voting)
            .cloned()
            .collect()
    }

    fn matches(record: &CompanyRecord, scope: ListScope, filter: &ListingFilter) -> bool {
        if matches!(scope, ListScope::Public) && !record.approved {
            return false;
        }
        if let Some(country) = filter.country.as_deref() {
            if record.country != country {
                return false;
            }
        }
        if let Some(category) = filter.category {
            if record.category_id != category {
                return false;
            }
        }
        true
    }
}

/// A released, approved company with staggered creation times so newest-first
/// ordering is deterministic.
pub fn company(name: &str, country: &str, category_id: Uuid, age_minutes: i64) -> CompanyRecord {
    CompanyRecord {
        id: Uuid::new_v4(),
        name: name.to_string(),
        slug: slug::slugify(name),
        description: format!("{name} description"),
        country: country.to_string(),
        category_id,
        category_name: Some("Beauty".to_string()),
        website: None,
        logo_url: None,
        approved: true,
        vote_count: 0,
        avg_rating: None,
        created_at: OffsetDateTime::now_utc() - TimeDuration::minutes(age_minutes),
    }
}

#[async_trait]
impl CompaniesRepo for FakeBackend {
    async fn count(&self, scope: ListScope, filter: &ListingFilter) -> Result<u64, RepoError> {
        self.calls.count.fetch_add(1, Ordering::SeqCst);
        let companies = self.companies.lock().unwrap();
        Ok(companies
            .iter()
            .filter(|record| Self::matches(record, scope, filter))
            .count() as u64)
    }

    async fn fetch_all(
        &self,
        scope: ListScope,
        filter: &ListingFilter,
    ) -> Result<Vec<CompanyRecord>, RepoError> {
        self.calls.fetch_all.fetch_add(1, Ordering::SeqCst);
        let companies = self.companies.lock().unwrap();
        let mut rows: Vec<CompanyRecord> = companies
            .iter()
            .filter(|record| Self::matches(record, scope, filter))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn fetch_page(
        &self,
        scope: ListScope,
        filter: &ListingFilter,
        order: RemoteOrder,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<CompanyRecord>, RepoError> {
        self.calls.fetch_page.fetch_add(1, Ordering::SeqCst);
        let mut rows = {
            let companies = self.companies.lock().unwrap();
            companies
                .iter()
                .filter(|record| Self::matches(record, scope, filter))
                .cloned()
                .collect::<Vec<_>>()
        };
        match order {
            RemoteOrder::CreatedDesc => rows.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            RemoteOrder::NameAsc => rows.sort_by(|a, b| a.name.cmp(&b.name)),
            RemoteOrder::VotesDesc => rows.sort_by(|a, b| b.vote_count.cmp(&a.vote_count)),
        }
        let start = (offset as usize).min(rows.len());
        let end = (start + limit as usize).min(rows.len());
        Ok(rows[start..end].to_vec())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<CompanyRecord>, RepoError> {
        self.calls.find.fetch_add(1, Ordering::SeqCst);
        let companies = self.companies.lock().unwrap();
        Ok(companies.iter().find(|record| record.slug == slug).cloned())
    }

    async fn insert(&self, params: CreateCompanyParams) -> Result<CompanyRecord, RepoError> {
        self.calls.insert.fetch_add(1, Ordering::SeqCst);
        let mut companies = self.companies.lock().unwrap();
        if companies.iter().any(|record| record.slug == params.slug) {
            return Err(RepoError::Duplicate {
                constraint: "companies_slug_key".to_string(),
            });
        }
        let record = CompanyRecord {
            id: Uuid::new_v4(),
            name: params.name,
            slug: params.slug,
            description: params.description,
            country: params.country,
            category_id: params.category_id,
            category_name: None,
            website: params.website,
            logo_url: params.logo_url,
            approved: false,
            vote_count: 0,
            avg_rating: None,
            created_at: OffsetDateTime::now_utc(),
        };
        companies.push(record.clone());
        Ok(record)
    }

    async fn update(&self, params: UpdateCompanyParams) -> Result<CompanyRecord, RepoError> {
        let mut companies = self.companies.lock().unwrap();
        let record = companies
            .iter_mut()
            .find(|record| record.id == params.id)
            .ok_or(RepoError::NotFound)?;
        record.description = params.description;
        record.category_id = params.category_id;
        record.website = params.website;
        record.logo_url = params.logo_url;
        Ok(record.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut companies = self.companies.lock().unwrap();
        let before = companies.len();
        companies.retain(|record| record.id != id);
        if companies.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn record_view(&self, _id: Uuid) -> Result<(), RepoError> {
        self.calls.rpc.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl ReviewsRepo for FakeBackend {
    async fn find_vote(
        &self,
        user_id: Uuid,
        company_id: Uuid,
    ) -> Result<Option<ReviewRecord>, RepoError> {
        self.calls.find.fetch_add(1, Ordering::SeqCst);
        let reviews = self.reviews.lock().unwrap();
        Ok(reviews
            .iter()
            .find(|row| row.user_id == user_id && row.company_id == company_id && row.voting)
            .cloned())
    }

    async fn find_review(
        &self,
        user_id: Uuid,
        company_id: Uuid,
    ) -> Result<Option<ReviewRecord>, RepoError> {
        self.calls.find.fetch_add(1, Ordering::SeqCst);
        let reviews = self.reviews.lock().unwrap();
        Ok(reviews
            .iter()
            .find(|row| row.user_id == user_id && row.company_id == company_id && !row.voting)
            .cloned())
    }

    async fn insert_vote(
        &self,
        user_id: Uuid,
        company_id: Uuid,
        rating: i16,
    ) -> Result<ReviewRecord, RepoError> {
        self.calls.insert.fetch_add(1, Ordering::SeqCst);
        let mut reviews = self.reviews.lock().unwrap();
        if reviews
            .iter()
            .any(|row| row.user_id == user_id && row.company_id == company_id && row.voting)
        {
            return Err(RepoError::Duplicate {
                constraint: "company_reviews_vote_key".to_string(),
            });
        }
        let record = ReviewRecord {
            id: Uuid::new_v4(),
            user_id,
            company_id,
            rating: Some(rating),
            comment: None,
            voting: true,
            created_at: OffsetDateTime::now_utc(),
        };
        reviews.push(record.clone());
        self.cooldown.lock().unwrap().insert((user_id, company_id));
        Ok(record)
    }

    async fn update_vote(&self, id: Uuid, rating: i16) -> Result<ReviewRecord, RepoError> {
        self.calls.insert.fetch_add(1, Ordering::SeqCst);
        let mut reviews = self.reviews.lock().unwrap();
        let row = reviews
            .iter_mut()
            .find(|row| row.id == id && row.voting)
            .ok_or(RepoError::NotFound)?;
        row.rating = Some(rating);
        let record = row.clone();
        drop(reviews);
        self.cooldown
            .lock()
            .unwrap()
            .insert((record.user_id, record.company_id));
        Ok(record)
    }

    async fn upsert_review(
        &self,
        user_id: Uuid,
        company_id: Uuid,
        comment: &str,
    ) -> Result<ReviewRecord, RepoError> {
        self.calls.insert.fetch_add(1, Ordering::SeqCst);
        let mut reviews = self.reviews.lock().unwrap();
        if let Some(row) = reviews
            .iter_mut()
            .find(|row| row.user_id == user_id && row.company_id == company_id && !row.voting)
        {
            row.comment = Some(comment.to_string());
            return Ok(row.clone());
        }
        let record = ReviewRecord {
            id: Uuid::new_v4(),
            user_id,
            company_id,
            rating: None,
            comment: Some(comment.to_string()),
            voting: false,
            created_at: OffsetDateTime::now_utc(),
        };
        reviews.push(record.clone());
        Ok(record)
    }

    async fn list_for_company(&self, company_id: Uuid) -> Result<Vec<ReviewRecord>, RepoError> {
        self.calls.fetch_all.fetch_add(1, Ordering::SeqCst);
        let reviews = self.reviews.lock().unwrap();
        let mut rows: Vec<ReviewRecord> = reviews
            .iter()
            .filter(|row| row.company_id == company_id && !row.voting)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn aggregate_rating(&self, company_id: Uuid) -> Result<RatingSummary, RepoError> {
        self.calls.rpc.fetch_add(1, Ordering::SeqCst);
        let reviews = self.reviews.lock().unwrap();
        let ratings: Vec<f64> = reviews
            .iter()
            .filter(|row| row.company_id == company_id && row.voting)
            .filter_map(|row| row.rating.map(f64::from))
            .collect();
        if ratings.is_empty() {
            return Ok(RatingSummary {
                average: 0.0,
                votes: 0,
            });
        }
        Ok(RatingSummary {
            average: ratings.iter().sum::<f64>() / ratings.len() as f64,
            votes: ratings.len() as i64,
        })
    }

    async fn vote_count(&self, company_id: Uuid) -> Result<i64, RepoError> {
        self.calls.rpc.fetch_add(1, Ordering::SeqCst);
        let reviews = self.reviews.lock().unwrap();
        Ok(reviews
            .iter()
            .filter(|row| row.company_id == company_id && row.voting)
            .count() as i64)
    }

    async fn can_vote(&self, user_id: Uuid, company_id: Uuid) -> Result<bool, RepoError> {
        self.calls.rpc.fetch_add(1, Ordering::SeqCst);
        Ok(!self
            .cooldown
            .lock()
            .unwrap()
            .contains(&(user_id, company_id)))
    }

    async fn award_points(&self, _user_id: Uuid, _action: &str) -> Result<(), RepoError> {
        self.calls.rpc.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

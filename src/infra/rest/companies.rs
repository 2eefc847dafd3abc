use async_trait::async_trait;
use serde_json::json;
use uuid::Uuid;

use crate::application::repos::{
    CompaniesRepo, CreateCompanyParams, ListingFilter, RemoteOrder, RepoError,
    UpdateCompanyParams,
};
use crate::domain::entities::CompanyRecord;
use crate::domain::types::ListScope;

use super::types::CompanyRow;
use super::{RestBackend, TableQuery};

const TABLE: &str = "companies";
const SELECT: &str = "*,category:categories(name)";
const SEARCH_COLUMNS: &[&str] = &["name", "description"];

fn base_query(scope: ListScope, filter: &ListingFilter) -> TableQuery {
    let mut query = TableQuery::new();
    if matches!(scope, ListScope::Public) {
        query = query.is_true("approved");
    }
    if let Some(country) = filter.country.as_deref() {
        query = query.eq("country", country);
    }
    if let Some(category) = filter.category {
        query = query.eq("category_id", category);
    }
    query
}

#[async_trait]
impl CompaniesRepo for RestBackend {
    async fn count(&self, scope: ListScope, filter: &ListingFilter) -> Result<u64, RepoError> {
        self.count_rows(TABLE, base_query(scope, filter)).await
    }

    async fn fetch_all(
        &self,
        scope: ListScope,
        filter: &ListingFilter,
    ) -> Result<Vec<CompanyRecord>, RepoError> {
        let query = base_query(scope, filter)
            .select(SELECT)
            .order_desc("created_at");
        let rows = self.select_rows::<CompanyRow>(TABLE, query).await?;
        Ok(rows.into_iter().map(CompanyRecord::from).collect())
    }

    async fn fetch_page(
        &self,
        scope: ListScope,
        filter: &ListingFilter,
        order: RemoteOrder,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<CompanyRecord>, RepoError> {
        let mut query = base_query(scope, filter).select(SELECT);
        if let Some(term) = filter.search.as_deref() {
            query = query.ilike_any(SEARCH_COLUMNS, term);
        }
        query = match order {
            RemoteOrder::CreatedDesc => query.order_desc("created_at"),
            RemoteOrder::NameAsc => query.order_asc("name"),
            RemoteOrder::VotesDesc => query.order_desc("vote_count"),
        };
        let rows = self
            .select_rows::<CompanyRow>(TABLE, query.window(offset, limit))
            .await?;
        Ok(rows.into_iter().map(CompanyRecord::from).collect())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<CompanyRecord>, RepoError> {
        let query = TableQuery::new().select(SELECT).eq("slug", slug);
        let row = self.select_one::<CompanyRow>(TABLE, query).await?;
        Ok(row.map(CompanyRecord::from))
    }

    async fn insert(&self, params: CreateCompanyParams) -> Result<CompanyRecord, RepoError> {
        let body = json!({
            "name": params.name,
            "slug": params.slug,
            "description": params.description,
            "country": params.country,
            "category_id": params.category_id,
            "website": params.website,
            "logo_url": params.logo_url,
            "approved": false,
        });
        let row = self
            .insert_row::<CompanyRow>(TABLE, body, TableQuery::new().select(SELECT))
            .await?;
        Ok(CompanyRecord::from(row))
    }

    async fn update(&self, params: UpdateCompanyParams) -> Result<CompanyRecord, RepoError> {
        let body = json!({
            "description": params.description,
            "category_id": params.category_id,
            "website": params.website,
            "logo_url": params.logo_url,
        });
        let row = self
            .update_row::<CompanyRow>(TABLE, params.id, body, TableQuery::new().select(SELECT))
            .await?;
        Ok(CompanyRecord::from(row))
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.delete_row(TABLE, id).await
    }

    async fn record_view(&self, id: Uuid) -> Result<(), RepoError> {
        self.rpc_unit("record_company_view", json!({ "company_id": id }))
            .await
    }
}

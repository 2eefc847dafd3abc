use async_trait::async_trait;
use serde_json::json;
use uuid::Uuid;

use crate::application::repos::{
    CreateSellerParams, RemoteOrder, RepoError, SellerFilter, SellersRepo,
};
use crate::domain::entities::SellerRecord;
use crate::domain::types::ListScope;

use super::types::SellerRow;
use super::{RestBackend, TableQuery};

const TABLE: &str = "sellers";
const SEARCH_COLUMNS: &[&str] = &["display_name", "bio"];

fn base_query(filter: &SellerFilter) -> TableQuery {
    let mut query = TableQuery::new();
    if let Some(country) = filter.country.as_deref() {
        query = query.eq("country", country);
    }
    query
}

#[async_trait]
impl SellersRepo for RestBackend {
    async fn count(&self, _scope: ListScope, filter: &SellerFilter) -> Result<u64, RepoError> {
        self.count_rows(TABLE, base_query(filter)).await
    }

    async fn fetch_all(
        &self,
        _scope: ListScope,
        filter: &SellerFilter,
    ) -> Result<Vec<SellerRecord>, RepoError> {
        let query = base_query(filter).order_desc("created_at");
        let rows = self.select_rows::<SellerRow>(TABLE, query).await?;
        Ok(rows.into_iter().map(SellerRecord::from).collect())
    }

    async fn fetch_page(
        &self,
        _scope: ListScope,
        filter: &SellerFilter,
        order: RemoteOrder,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<SellerRecord>, RepoError> {
        let mut query = base_query(filter);
        if let Some(term) = filter.search.as_deref() {
            query = query.ilike_any(SEARCH_COLUMNS, term);
        }
        query = match order {
            RemoteOrder::NameAsc => query.order_asc("display_name"),
            _ => query.order_desc("created_at"),
        };
        let rows = self
            .select_rows::<SellerRow>(TABLE, query.window(offset, limit))
            .await?;
        Ok(rows.into_iter().map(SellerRecord::from).collect())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<SellerRecord>, RepoError> {
        let query = TableQuery::new().eq("slug", slug);
        let row = self.select_one::<SellerRow>(TABLE, query).await?;
        Ok(row.map(SellerRecord::from))
    }

    async fn insert(&self, params: CreateSellerParams) -> Result<SellerRecord, RepoError> {
        let body = json!({
            "display_name": params.display_name,
            "slug": params.slug,
            "country": params.country,
            "bio": params.bio,
            "avatar_url": params.avatar_url,
        });
        let row = self
            .insert_row::<SellerRow>(TABLE, body, TableQuery::new())
            .await?;
        Ok(SellerRecord::from(row))
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.delete_row(TABLE, id).await
    }
}

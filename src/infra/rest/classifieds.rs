use async_trait::async_trait;
use serde_json::json;
use uuid::Uuid;

use crate::application::repos::{
    ClassifiedsRepo, CreateClassifiedParams, ListingFilter, RemoteOrder, RepoError,
};
use crate::domain::entities::ClassifiedRecord;
use crate::domain::types::ListScope;

use super::types::ClassifiedRow;
use super::{RestBackend, TableQuery};

const TABLE: &str = "classifieds";
const SELECT: &str = "*,category:categories(name)";
const SEARCH_COLUMNS: &[&str] = &["title", "description"];

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
impl ClassifiedsRepo for RestBackend {
    async fn count(&self, scope: ListScope, filter: &ListingFilter) -> Result<u64, RepoError> {
        self.count_rows(TABLE, base_query(scope, filter)).await
    }

    async fn fetch_all(
        &self,
        scope: ListScope,
        filter: &ListingFilter,
    ) -> Result<Vec<ClassifiedRecord>, RepoError> {
        let query = base_query(scope, filter)
            .select(SELECT)
            .order_desc("created_at");
        let rows = self.select_rows::<ClassifiedRow>(TABLE, query).await?;
        Ok(rows.into_iter().map(ClassifiedRecord::from).collect())
    }

    async fn fetch_page(
        &self,
        scope: ListScope,
        filter: &ListingFilter,
        order: RemoteOrder,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<ClassifiedRecord>, RepoError> {
        let mut query = base_query(scope, filter).select(SELECT);
        if let Some(term) = filter.search.as_deref() {
            query = query.ilike_any(SEARCH_COLUMNS, term);
        }
        query = match order {
            RemoteOrder::CreatedDesc | RemoteOrder::VotesDesc => query.order_desc("created_at"),
            RemoteOrder::NameAsc => query.order_asc("title"),
        };
        let rows = self
            .select_rows::<ClassifiedRow>(TABLE, query.window(offset, limit))
            .await?;
        Ok(rows.into_iter().map(ClassifiedRecord::from).collect())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<ClassifiedRecord>, RepoError> {
        let query = TableQuery::new().select(SELECT).eq("slug", slug);
        let row = self.select_one::<ClassifiedRow>(TABLE, query).await?;
        Ok(row.map(ClassifiedRecord::from))
    }

    async fn insert(&self, params: CreateClassifiedParams) -> Result<ClassifiedRecord, RepoError> {
        let body = json!({
            "title": params.title,
            "slug": params.slug,
            "description": params.description,
            "price": params.price,
            "country": params.country,
            "category_id": params.category_id,
            "image_url": params.image_url,
            "seller_id": params.seller_id,
            "approved": false,
        });
        let row = self
            .insert_row::<ClassifiedRow>(TABLE, body, TableQuery::new().select(SELECT))
            .await?;
        Ok(ClassifiedRecord::from(row))
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.delete_row(TABLE, id).await
    }
}

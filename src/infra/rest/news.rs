use async_trait::async_trait;
use serde_json::json;
use uuid::Uuid;

use crate::application::repos::{CreateNewsParams, NewsFilter, NewsRepo, RemoteOrder, RepoError};
use crate::domain::entities::NewsArticleRecord;
use crate::domain::types::ListScope;

use super::types::NewsArticleRow;
use super::{RestBackend, TableQuery};

const TABLE: &str = "news_articles";
const SEARCH_COLUMNS: &[&str] = &["title", "excerpt"];

fn base_query(scope: ListScope) -> TableQuery {
    let query = TableQuery::new();
    if matches!(scope, ListScope::Public) {
        query.is_true("published")
    } else {
        query
    }
}

#[async_trait]
impl NewsRepo for RestBackend {
    async fn count(&self, scope: ListScope, _filter: &NewsFilter) -> Result<u64, RepoError> {
        self.count_rows(TABLE, base_query(scope)).await
    }

    async fn fetch_all(
        &self,
        scope: ListScope,
        _filter: &NewsFilter,
    ) -> Result<Vec<NewsArticleRecord>, RepoError> {
        let query = base_query(scope).order_desc("created_at");
        let rows = self.select_rows::<NewsArticleRow>(TABLE, query).await?;
        Ok(rows.into_iter().map(NewsArticleRecord::from).collect())
    }

    async fn fetch_page(
        &self,
        scope: ListScope,
        filter: &NewsFilter,
        order: RemoteOrder,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<NewsArticleRecord>, RepoError> {
        let mut query = base_query(scope);
        if let Some(term) = filter.search.as_deref() {
            query = query.ilike_any(SEARCH_COLUMNS, term);
        }
        query = match order {
            RemoteOrder::NameAsc => query.order_asc("title"),
            _ => query.order_desc("created_at"),
        };
        let rows = self
            .select_rows::<NewsArticleRow>(TABLE, query.window(offset, limit))
            .await?;
        Ok(rows.into_iter().map(NewsArticleRecord::from).collect())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<NewsArticleRecord>, RepoError> {
        let query = TableQuery::new().eq("slug", slug);
        let row = self.select_one::<NewsArticleRow>(TABLE, query).await?;
        Ok(row.map(NewsArticleRecord::from))
    }

    async fn insert(&self, params: CreateNewsParams) -> Result<NewsArticleRecord, RepoError> {
        let body = json!({
            "title": params.title,
            "slug": params.slug,
            "excerpt": params.excerpt,
            "body": params.body,
            "cover_url": params.cover_url,
            "published": params.published,
        });
        let row = self
            .insert_row::<NewsArticleRow>(TABLE, body, TableQuery::new())
            .await?;
        Ok(NewsArticleRecord::from(row))
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.delete_row(TABLE, id).await
    }
}

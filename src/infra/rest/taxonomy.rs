use async_trait::async_trait;

use crate::application::repos::{RepoError, TaxonomyRepo};
use crate::domain::entities::{CategoryRecord, CountryRecord};
use crate::domain::types::CategoryKind;

use super::types::{CategoryRow, CountryRow};
use super::{RestBackend, TableQuery};

#[async_trait]
impl TaxonomyRepo for RestBackend {
    async fn countries(&self) -> Result<Vec<CountryRecord>, RepoError> {
        let rows = self
            .select_rows::<CountryRow>("countries", TableQuery::new().order_asc("name"))
            .await?;
        Ok(rows.into_iter().map(CountryRecord::from).collect())
    }

    async fn categories(&self, kind: CategoryKind) -> Result<Vec<CategoryRecord>, RepoError> {
        let query = TableQuery::new()
            .eq("kind", kind.as_str())
            .order_asc("name");
        let rows = self.select_rows::<CategoryRow>("categories", query).await?;
        Ok(rows.into_iter().map(CategoryRecord::from).collect())
    }
}

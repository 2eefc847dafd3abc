//! Typed client for the hosted data platform's REST surface.
//!
//! Three primitives cover the whole contract: table selects with composable
//! filters ([`TableQuery`]), named remote procedures, and mutations by
//! primary key. Unique violations surface as [`RepoError::Duplicate`] so
//! creation flows can advance their slug suffix and retry.
//!
//! No explicit request timeout is configured; the transport's own defaults
//! apply.

mod classifieds;
mod companies;
mod news;
mod query;
mod reviews;
mod sellers;
mod taxonomy;
mod types;

pub use query::TableQuery;

use metrics::counter;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::application::repos::RepoError;
use crate::config::BackendSettings;
use crate::infra::error::InfraError;

const METRIC_BACKEND_ERROR: &str = "vitrina_backend_error_total";

const HEADER_API_KEY: &str = "apikey";
const PREFER_REPRESENTATION: &str = "return=representation";
const PREFER_UPSERT: &str = "resolution=merge-duplicates,return=representation";

/// Client for the hosted backend. Cheap to clone; implements every
/// repository trait in `application::repos`.
#[derive(Clone)]
pub struct RestBackend {
    client: Client,
    base: Url,
    api_key: String,
}

impl RestBackend {
    pub fn new(settings: &BackendSettings) -> Result<Self, InfraError> {
        let base = Url::parse(&settings.url)
            .and_then(|url| url.join("rest/v1/"))
            .map_err(|err| {
                InfraError::configuration(format!("invalid backend URL `{}`: {err}", settings.url))
            })?;
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .build()
            .map_err(|err| InfraError::http(err.to_string()))?;
        Ok(Self {
            client,
            base,
            api_key: settings.api_key.clone(),
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("vitrina/", env!("CARGO_PKG_VERSION"))
    }

    fn table_url(&self, table: &str, pairs: &[(String, String)]) -> Result<Url, RepoError> {
        let mut url = self.base.join(table).map_err(RepoError::from_backend)?;
        if !pairs.is_empty() {
            let mut qp = url.query_pairs_mut();
            for (key, value) in pairs {
                qp.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .header(HEADER_API_KEY, &self.api_key)
            .bearer_auth(&self.api_key)
    }

    pub(crate) async fn select_rows<T: DeserializeOwned>(
        &self,
        table: &str,
        query: TableQuery,
    ) -> Result<Vec<T>, RepoError> {
        let url = self.table_url(table, &query.into_pairs())?;
        debug!(%url, "backend select");
        let response = self
            .request(Method::GET, url)
            .send()
            .await
            .map_err(transport_error)?;
        Self::read_rows(response).await
    }

    pub(crate) async fn select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        query: TableQuery,
    ) -> Result<Option<T>, RepoError> {
        let mut rows = self.select_rows::<T>(table, query.limit(1)).await?;
        Ok(rows.pop())
    }

    /// Exact row count via a `HEAD` request with `Prefer: count=exact`; the
    /// total arrives in the `Content-Range` header (`0-23/37`).
    pub(crate) async fn count_rows(&self, table: &str, query: TableQuery) -> Result<u64, RepoError> {
        let url = self.table_url(table, &query.into_pairs())?;
        let response = self
            .request(Method::HEAD, url)
            .header("Prefer", "count=exact")
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::error_from_response(status, response).await);
        }

        let range = response
            .headers()
            .get("content-range")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        parse_content_range_total(range).ok_or_else(|| {
            RepoError::Backend(format!("unparsable content-range header `{range}`"))
        })
    }

    pub(crate) async fn insert_row<T: DeserializeOwned>(
        &self,
        table: &str,
        body: serde_json::Value,
        representation: TableQuery,
    ) -> Result<T, RepoError> {
        let url = self.table_url(table, &representation.into_pairs())?;
        let response = self
            .request(Method::POST, url)
            .header("Prefer", PREFER_REPRESENTATION)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;
        Self::read_single(response).await
    }

    /// Insert-or-merge on a unique key (`on_conflict` columns).
    pub(crate) async fn upsert_row<T: DeserializeOwned>(
        &self,
        table: &str,
        on_conflict: &str,
        body: serde_json::Value,
        representation: TableQuery,
    ) -> Result<T, RepoError> {
        let mut pairs = representation.into_pairs();
        pairs.push(("on_conflict".to_string(), on_conflict.to_string()));
        let url = self.table_url(table, &pairs)?;
        let response = self
            .request(Method::POST, url)
            .header("Prefer", PREFER_UPSERT)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;
        Self::read_single(response).await
    }

    pub(crate) async fn update_row<T: DeserializeOwned>(
        &self,
        table: &str,
        id: uuid::Uuid,
        body: serde_json::Value,
        representation: TableQuery,
    ) -> Result<T, RepoError> {
        let url = self.table_url(table, &representation.eq("id", id).into_pairs())?;
        let response = self
            .request(Method::PATCH, url)
            .header("Prefer", PREFER_REPRESENTATION)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;
        Self::read_single(response).await
    }

    pub(crate) async fn delete_row(&self, table: &str, id: uuid::Uuid) -> Result<(), RepoError> {
        let url = self.table_url(table, &TableQuery::new().eq("id", id).into_pairs())?;
        let response = self
            .request(Method::DELETE, url)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::error_from_response(status, response).await);
        }
        Ok(())
    }

    /// Invoke a named remote procedure and decode its JSON result.
    pub(crate) async fn rpc<T: DeserializeOwned>(
        &self,
        function: &str,
        args: serde_json::Value,
    ) -> Result<T, RepoError> {
        let url = self
            .base
            .join(&format!("rpc/{function}"))
            .map_err(RepoError::from_backend)?;
        debug!(%url, "backend rpc");
        let response = self
            .request(Method::POST, url)
            .json(&args)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(transport_error)?;
        if !status.is_success() {
            return Err(Self::error_from_body(status, &bytes));
        }
        serde_json::from_slice(&bytes).map_err(|err| {
            RepoError::Backend(format!("failed to decode rpc `{function}` result: {err}"))
        })
    }

    /// Procedure invoked for its side effect only.
    pub(crate) async fn rpc_unit(
        &self,
        function: &str,
        args: serde_json::Value,
    ) -> Result<(), RepoError> {
        self.rpc::<serde_json::Value>(function, args).await?;
        Ok(())
    }

    async fn read_rows<T: DeserializeOwned>(response: Response) -> Result<Vec<T>, RepoError> {
        let status = response.status();
        let bytes = response.bytes().await.map_err(transport_error)?;
        if !status.is_success() {
            return Err(Self::error_from_body(status, &bytes));
        }
        serde_json::from_slice(&bytes)
            .map_err(|err| RepoError::Backend(format!("failed to decode response body: {err}")))
    }

    /// Mutations with `return=representation` answer with a one-element array.
    async fn read_single<T: DeserializeOwned>(response: Response) -> Result<T, RepoError> {
        let mut rows = Self::read_rows::<T>(response).await?;
        rows.pop().ok_or(RepoError::NotFound)
    }

    async fn error_from_response(status: StatusCode, response: Response) -> RepoError {
        let bytes = response.bytes().await.unwrap_or_default();
        Self::error_from_body(status, &bytes)
    }

    fn error_from_body(status: StatusCode, body: &[u8]) -> RepoError {
        let message = serde_json::from_slice::<BackendErrorBody>(body)
            .map(|body| body.message)
            .unwrap_or_else(|_| String::from_utf8_lossy(body).into_owned());

        match status {
            StatusCode::NOT_FOUND => RepoError::NotFound,
            StatusCode::CONFLICT => {
                counter!(METRIC_BACKEND_ERROR, "kind" => "conflict").increment(1);
                RepoError::Duplicate {
                    constraint: extract_constraint(&message),
                }
            }
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                counter!(METRIC_BACKEND_ERROR, "kind" => "invalid").increment(1);
                RepoError::invalid_input(message)
            }
            _ => {
                counter!(METRIC_BACKEND_ERROR, "kind" => "server").increment(1);
                RepoError::Backend(format!("status {status}: {message}"))
            }
        }
    }
}

fn transport_error(err: reqwest::Error) -> RepoError {
    counter!(METRIC_BACKEND_ERROR, "kind" => "transport").increment(1);
    RepoError::from_backend(err)
}

#[derive(Debug, serde::Deserialize)]
struct BackendErrorBody {
    message: String,
}

/// Total from a `Content-Range` header such as `0-23/37` or `*/0`.
fn parse_content_range_total(value: &str) -> Option<u64> {
    value.rsplit('/').next()?.trim().parse().ok()
}

/// The violated constraint name from a platform error message, e.g.
/// `duplicate key value violates unique constraint "companies_slug_key"`.
fn extract_constraint(message: &str) -> String {
    let mut quoted = message.split('"');
    match (quoted.next(), quoted.next()) {
        (Some(_), Some(constraint)) if !constraint.is_empty() => constraint.to_string(),
        _ => "unique".to_string(),
    }
}

use thiserror::Error;

use crate::application::repos::RepoError;
use crate::domain::error::DomainError;
use crate::domain::slug::SlugError;
use crate::infra::error::InfraError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Repo(RepoError),
    #[error("resource not found")]
    NotFound,
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// Not-found on a detail lookup is its own variant so consumers can map
    /// it to a list-page redirect instead of rendering a broken detail view.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AppError::NotFound
                | AppError::Repo(RepoError::NotFound)
                | AppError::Domain(DomainError::NotFound { .. })
        )
    }
}

impl From<RepoError> for AppError {
    fn from(error: RepoError) -> Self {
        match error {
            RepoError::NotFound => AppError::NotFound,
            other => AppError::Repo(other),
        }
    }
}

impl From<SlugError> for AppError {
    fn from(error: SlugError) -> Self {
        AppError::Validation(error.to_string())
    }
}

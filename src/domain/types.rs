//! Shared domain enumerations aligned with persisted database enums.

use serde::{Deserialize, Serialize};

/// Ordering applied to listing pages.
///
/// `TopRated` cannot be delegated to the remote store together with arbitrary
/// filters, which is why list composition materializes the filtered set before
/// sorting (see `application::composer`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// Most recent first (`created_at` descending).
    #[default]
    Newest,
    /// Case-sensitive comparison on the display name.
    Alphabetical,
    /// Vote count descending, ties broken by average rating descending.
    TopRated,
}

impl SortMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SortMode::Newest => "newest",
            SortMode::Alphabetical => "a-z",
            SortMode::TopRated => "top-rated",
        }
    }
}

impl std::str::FromStr for SortMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "newest" => Ok(SortMode::Newest),
            "a-z" | "alphabetical" => Ok(SortMode::Alphabetical),
            "top-rated" | "top-review" => Ok(SortMode::TopRated),
            other => Err(format!("unknown sort mode `{other}`")),
        }
    }
}

/// Visibility scope for listing queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListScope {
    /// Approved/published rows only.
    #[default]
    Public,
    /// Everything, including rows awaiting approval.
    Admin,
}

impl ListScope {
    pub fn as_str(self) -> &'static str {
        match self {
            ListScope::Public => "public",
            ListScope::Admin => "admin",
        }
    }
}

/// Category partition: company categories and classified categories are
/// separate vocabularies on the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    Company,
    Classified,
}

impl CategoryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CategoryKind::Company => "company",
            CategoryKind::Classified => "classified",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_mode_parses_aliases() {
        assert_eq!("a-z".parse::<SortMode>().unwrap(), SortMode::Alphabetical);
        assert_eq!("top-review".parse::<SortMode>().unwrap(), SortMode::TopRated);
        assert!("best".parse::<SortMode>().is_err());
    }

    #[test]
    fn sort_mode_defaults_to_newest() {
        assert_eq!(SortMode::default(), SortMode::Newest);
    }
}

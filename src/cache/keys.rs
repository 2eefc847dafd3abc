//! Cache key definitions.
//!
//! One `CacheKey` variant per cached artifact. Keys render to stable strings
//! prefixed by their family, and invalidation always targets a family, so the
//! key shape and the invalidation pattern live in one place.

use std::fmt;

use uuid::Uuid;

use crate::domain::types::{CategoryKind, ListScope, SortMode};

/// Groups of keys invalidated together after a write.
///
/// A new company invalidates `CompanyLists`; a vote invalidates
/// `CompanyRatings` and `CompanyLists` (list ordering can depend on vote
/// counts); taxonomy changes never happen at runtime and expire by TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyFamily {
    CompanyLists,
    CompanyDetails,
    CompanyRatings,
    ClassifiedLists,
    ClassifiedDetails,
    NewsLists,
    NewsDetails,
    SellerLists,
    SellerDetails,
    Taxonomy,
}

impl KeyFamily {
    pub fn prefix(self) -> &'static str {
        match self {
            KeyFamily::CompanyLists => "companies:list",
            KeyFamily::CompanyDetails => "companies:detail",
            KeyFamily::CompanyRatings => "companies:rating",
            KeyFamily::ClassifiedLists => "classifieds:list",
            KeyFamily::ClassifiedDetails => "classifieds:detail",
            KeyFamily::NewsLists => "news:list",
            KeyFamily::NewsDetails => "news:detail",
            KeyFamily::SellerLists => "sellers:list",
            KeyFamily::SellerDetails => "sellers:detail",
            KeyFamily::Taxonomy => "taxonomy",
        }
    }
}

/// Identifies a cached artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    CompanyList {
        scope: ListScope,
        country: Option<String>,
        category: Option<Uuid>,
        search: Option<String>,
        sort: SortMode,
    },
    CompanyDetail {
        slug: String,
    },
    CompanyRating {
        id: Uuid,
    },
    CompanyVoteCount {
        id: Uuid,
    },
    ClassifiedList {
        scope: ListScope,
        country: Option<String>,
        category: Option<Uuid>,
        search: Option<String>,
        sort: SortMode,
    },
    ClassifiedDetail {
        slug: String,
    },
    NewsList {
        scope: ListScope,
        search: Option<String>,
    },
    NewsDetail {
        slug: String,
    },
    SellerList {
        scope: ListScope,
        country: Option<String>,
        search: Option<String>,
        sort: SortMode,
    },
    SellerDetail {
        slug: String,
    },
    Countries,
    Categories {
        kind: CategoryKind,
    },
}

impl CacheKey {
    pub fn family(&self) -> KeyFamily {
        match self {
            CacheKey::CompanyList { .. } => KeyFamily::CompanyLists,
            CacheKey::CompanyDetail { .. } => KeyFamily::CompanyDetails,
            CacheKey::CompanyRating { .. } | CacheKey::CompanyVoteCount { .. } => {
                KeyFamily::CompanyRatings
            }
            CacheKey::ClassifiedList { .. } => KeyFamily::ClassifiedLists,
            CacheKey::ClassifiedDetail { .. } => KeyFamily::ClassifiedDetails,
            CacheKey::NewsList { .. } => KeyFamily::NewsLists,
            CacheKey::NewsDetail { .. } => KeyFamily::NewsDetails,
            CacheKey::SellerList { .. } => KeyFamily::SellerLists,
            CacheKey::SellerDetail { .. } => KeyFamily::SellerDetails,
            CacheKey::Countries | CacheKey::Categories { .. } => KeyFamily::Taxonomy,
        }
    }

    /// Stable string form; the family prefix always leads.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

fn opt(value: Option<&str>) -> &str {
    value.unwrap_or("*")
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = self.family().prefix();
        match self {
            CacheKey::CompanyList {
                scope,
                country,
                category,
                search,
                sort,
            }
            | CacheKey::ClassifiedList {
                scope,
                country,
                category,
                search,
                sort,
            } => {
                let category = category.map(|id| id.to_string());
                write!(
                    f,
                    "{prefix}:{}:{}:{}:{}:{}",
                    scope.as_str(),
                    opt(country.as_deref()),
                    opt(category.as_deref()),
                    opt(search.as_deref()),
                    sort.as_str(),
                )
            }
            CacheKey::SellerList {
                scope,
                country,
                search,
                sort,
            } => write!(
                f,
                "{prefix}:{}:{}:{}:{}",
                scope.as_str(),
                opt(country.as_deref()),
                opt(search.as_deref()),
                sort.as_str(),
            ),
            CacheKey::NewsList { scope, search } => {
                write!(f, "{prefix}:{}:{}", scope.as_str(), opt(search.as_deref()))
            }
            CacheKey::CompanyDetail { slug }
            | CacheKey::ClassifiedDetail { slug }
            | CacheKey::NewsDetail { slug }
            | CacheKey::SellerDetail { slug } => write!(f, "{prefix}:{slug}"),
            CacheKey::CompanyRating { id } => write!(f, "{prefix}:avg:{id}"),
            CacheKey::CompanyVoteCount { id } => write!(f, "{prefix}:votes:{id}"),
            CacheKey::Countries => write!(f, "{prefix}:countries"),
            CacheKey::Categories { kind } => write!(f, "{prefix}:categories:{}", kind.as_str()),
        }
    }
}

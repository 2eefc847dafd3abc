//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{num::NonZeroU32, path::PathBuf, str::FromStr, time::Duration};

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;
use uuid::Uuid;

use crate::cache::CacheConfig;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "vitrina";
const DEFAULT_VOLATILE_TTL_SECS: u64 = 60;
const DEFAULT_LISTING_TTL_SECS: u64 = 180;
const DEFAULT_STATIC_TTL_SECS: u64 = 24 * 60 * 60;
const DEFAULT_CACHE_MAX_ENTRIES: u64 = 4096;
const DEFAULT_MATERIALIZE_CAP: u64 = 1000;
const DEFAULT_COMPANIES_PAGE_SIZE: u32 = 12;
const DEFAULT_CLASSIFIEDS_PAGE_SIZE: u32 = 24;
const DEFAULT_NEWS_PAGE_SIZE: u32 = 12;
const DEFAULT_SELLERS_PAGE_SIZE: u32 = 12;
const MAX_PAGE_SIZE: u32 = 100;

/// Command-line arguments for the Vitrina binary.
#[derive(Debug, Parser)]
#[command(name = "vitrina", version, about = "Vitrina directory client")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "VITRINA_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: GlobalOverrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args, Default, Clone)]
pub struct GlobalOverrides {
    /// Override the backend base URL.
    #[arg(long = "backend-url", env = "VITRINA_BACKEND_URL", value_name = "URL")]
    pub backend_url: Option<String>,

    /// Override the backend API key.
    #[arg(long = "api-key", env = "VITRINA_API_KEY", value_name = "KEY")]
    pub api_key: Option<String>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Browse and manage companies.
    Companies(CompaniesArgs),
    /// Browse and manage classified ads.
    Classifieds(ClassifiedsArgs),
    /// Browse news articles.
    News(NewsArgs),
    /// Browse direct-seller profiles.
    Sellers(SellersArgs),
    /// Submit a rating vote for a company.
    Vote(VoteArgs),
    /// Submit or replace a free-text review for a company.
    Review(ReviewArgs),
    /// List countries.
    Countries,
    /// List categories for one listing kind.
    Categories(CategoriesArgs),
}

#[derive(Debug, Args, Clone)]
pub struct CompaniesArgs {
    #[command(subcommand)]
    pub command: CompaniesCommand,
}

#[derive(Debug, Subcommand, Clone)]
pub enum CompaniesCommand {
    /// List companies with filters and sorting.
    List(ListFilterArgs),
    /// Show one company with its rating, vote count, and reviews.
    Show {
        #[arg(value_name = "SLUG")]
        slug: String,
    },
    /// Create a company (lands unapproved).
    Create(CreateCompanyArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ListFilterArgs {
    /// Two-letter country filter.
    #[arg(long, value_name = "CODE")]
    pub country: Option<String>,

    /// Category id filter.
    #[arg(long, value_name = "UUID")]
    pub category: Option<Uuid>,

    /// Free-text search term.
    #[arg(long, value_name = "TERM")]
    pub search: Option<String>,

    /// Sort mode: newest, a-z, or top-rated.
    #[arg(long, value_name = "MODE")]
    pub sort: Option<String>,

    /// 1-based page number.
    #[arg(long, default_value_t = 1, value_name = "N")]
    pub page: u32,

    /// Include rows awaiting approval.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub admin: bool,
}

#[derive(Debug, Args, Clone)]
pub struct CreateCompanyArgs {
    #[arg(long, value_name = "NAME")]
    pub name: String,

    #[arg(long, value_name = "TEXT")]
    pub description: String,

    #[arg(long, value_name = "CODE")]
    pub country: String,

    #[arg(long, value_name = "UUID")]
    pub category: Uuid,

    #[arg(long, value_name = "URL")]
    pub website: Option<String>,

    #[arg(long = "logo-url", value_name = "URL")]
    pub logo_url: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct ClassifiedsArgs {
    #[command(subcommand)]
    pub command: ClassifiedsCommand,
}

#[derive(Debug, Subcommand, Clone)]
pub enum ClassifiedsCommand {
    /// List classified ads with filters and sorting.
    List(ListFilterArgs),
    /// Show one classified ad.
    Show {
        #[arg(value_name = "SLUG")]
        slug: String,
    },
}

#[derive(Debug, Args, Clone)]
pub struct NewsArgs {
    #[command(subcommand)]
    pub command: NewsCommand,
}

#[derive(Debug, Subcommand, Clone)]
pub enum NewsCommand {
    /// List news articles, newest first.
    List {
        /// Free-text search term.
        #[arg(long, value_name = "TERM")]
        search: Option<String>,

        /// 1-based page number.
        #[arg(long, default_value_t = 1, value_name = "N")]
        page: u32,
    },
    /// Show one article.
    Show {
        #[arg(value_name = "SLUG")]
        slug: String,
    },
}

#[derive(Debug, Args, Clone)]
pub struct SellersArgs {
    #[command(subcommand)]
    pub command: SellersCommand,
}

#[derive(Debug, Subcommand, Clone)]
pub enum SellersCommand {
    /// List seller profiles.
    List {
        /// Two-letter country filter.
        #[arg(long, value_name = "CODE")]
        country: Option<String>,

        /// Free-text search term.
        #[arg(long, value_name = "TERM")]
        search: Option<String>,

        /// Sort mode: newest or a-z.
        #[arg(long, value_name = "MODE")]
        sort: Option<String>,

        /// 1-based page number.
        #[arg(long, default_value_t = 1, value_name = "N")]
        page: u32,
    },
    /// Show one seller profile.
    Show {
        #[arg(value_name = "SLUG")]
        slug: String,
    },
}

#[derive(Debug, Args, Clone)]
pub struct VoteArgs {
    /// Acting user id.
    #[arg(long, value_name = "UUID")]
    pub user: Uuid,

    /// Company slug.
    #[arg(long, value_name = "SLUG")]
    pub company: String,

    /// Rating from 1 to 5.
    #[arg(long, value_name = "N")]
    pub rating: i16,
}

#[derive(Debug, Args, Clone)]
pub struct ReviewArgs {
    /// Acting user id.
    #[arg(long, value_name = "UUID")]
    pub user: Uuid,

    /// Company slug.
    #[arg(long, value_name = "SLUG")]
    pub company: String,

    /// Review text.
    #[arg(long, value_name = "TEXT")]
    pub text: String,
}

#[derive(Debug, Args, Clone)]
pub struct CategoriesArgs {
    /// Listing kind: company or classified.
    #[arg(value_name = "KIND")]
    pub kind: String,
}

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub backend: BackendSettings,
    pub logging: LoggingSettings,
    pub cache: CacheConfig,
    pub listing: ListingSettings,
}

#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub url: String,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct ListingSettings {
    pub companies_page_size: NonZeroU32,
    pub classifieds_page_size: NonZeroU32,
    pub news_page_size: NonZeroU32,
    pub sellers_page_size: NonZeroU32,
    /// Largest filtered set the composer will materialize client-side; `0`
    /// disables the bound.
    pub materialize_cap: u64,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("VITRINA").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    backend: RawBackendSettings,
    logging: RawLoggingSettings,
    cache: RawCacheSettings,
    listing: RawListingSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawBackendSettings {
    url: Option<String>,
    api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    volatile_ttl_seconds: Option<u64>,
    listing_ttl_seconds: Option<u64>,
    static_ttl_seconds: Option<u64>,
    max_entries: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawListingSettings {
    companies_page_size: Option<u32>,
    classifieds_page_size: Option<u32>,
    news_page_size: Option<u32>,
    sellers_page_size: Option<u32>,
    materialize_cap: Option<u64>,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &GlobalOverrides) {
        if let Some(url) = overrides.backend_url.as_ref() {
            self.backend.url = Some(url.clone());
        }
        if let Some(key) = overrides.api_key.as_ref() {
            self.backend.api_key = Some(key.clone());
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            backend,
            logging,
            cache,
            listing,
        } = raw;

        let backend = build_backend_settings(backend)?;
        let logging = build_logging_settings(logging)?;
        let cache = build_cache_config(cache)?;
        let listing = build_listing_settings(listing)?;

        Ok(Self {
            backend,
            logging,
            cache,
            listing,
        })
    }
}

fn build_backend_settings(backend: RawBackendSettings) -> Result<BackendSettings, LoadError> {
    let url = backend
        .url
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| LoadError::invalid("backend.url", "backend URL is required"))?;

    Url::parse(&url).map_err(|err| LoadError::invalid("backend.url", err.to_string()))?;

    let api_key = backend
        .api_key
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| LoadError::invalid("backend.api_key", "API key is required"))?;

    Ok(BackendSettings { url, api_key })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_cache_config(cache: RawCacheSettings) -> Result<CacheConfig, LoadError> {
    let volatile = cache
        .volatile_ttl_seconds
        .unwrap_or(DEFAULT_VOLATILE_TTL_SECS);
    if volatile == 0 {
        return Err(LoadError::invalid(
            "cache.volatile_ttl_seconds",
            "must be greater than zero",
        ));
    }
    let listing = cache
        .listing_ttl_seconds
        .unwrap_or(DEFAULT_LISTING_TTL_SECS);
    if listing == 0 {
        return Err(LoadError::invalid(
            "cache.listing_ttl_seconds",
            "must be greater than zero",
        ));
    }
    let static_ttl = cache.static_ttl_seconds.unwrap_or(DEFAULT_STATIC_TTL_SECS);
    if static_ttl == 0 {
        return Err(LoadError::invalid(
            "cache.static_ttl_seconds",
            "must be greater than zero",
        ));
    }

    let max_entries_value = cache.max_entries.unwrap_or(DEFAULT_CACHE_MAX_ENTRIES);
    let max_entries = usize::try_from(max_entries_value).map_err(|_| {
        LoadError::invalid(
            "cache.max_entries",
            "value exceeds supported range for usize",
        )
    })?;

    Ok(CacheConfig {
        volatile_ttl: Duration::from_secs(volatile),
        listing_ttl: Duration::from_secs(listing),
        static_ttl: Duration::from_secs(static_ttl),
        max_entries,
    })
}

fn build_listing_settings(listing: RawListingSettings) -> Result<ListingSettings, LoadError> {
    let companies_page_size = page_size(
        listing.companies_page_size,
        DEFAULT_COMPANIES_PAGE_SIZE,
        "listing.companies_page_size",
    )?;
    let classifieds_page_size = page_size(
        listing.classifieds_page_size,
        DEFAULT_CLASSIFIEDS_PAGE_SIZE,
        "listing.classifieds_page_size",
    )?;
    let news_page_size = page_size(
        listing.news_page_size,
        DEFAULT_NEWS_PAGE_SIZE,
        "listing.news_page_size",
    )?;
    let sellers_page_size = page_size(
        listing.sellers_page_size,
        DEFAULT_SELLERS_PAGE_SIZE,
        "listing.sellers_page_size",
    )?;

    Ok(ListingSettings {
        companies_page_size,
        classifieds_page_size,
        news_page_size,
        sellers_page_size,
        materialize_cap: listing.materialize_cap.unwrap_or(DEFAULT_MATERIALIZE_CAP),
    })
}

fn page_size(value: Option<u32>, default: u32, key: &'static str) -> Result<NonZeroU32, LoadError> {
    let value = value.unwrap_or(default);
    if value > MAX_PAGE_SIZE {
        return Err(LoadError::invalid(
            key,
            format!("must not exceed {MAX_PAGE_SIZE}"),
        ));
    }
    NonZeroU32::new(value).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

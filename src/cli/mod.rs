//! Operator CLI over the application services.

pub mod handlers;
pub mod print;

use std::sync::Arc;

use crate::application::classifieds::ClassifiedService;
use crate::application::companies::CompanyService;
use crate::application::error::AppError;
use crate::application::news::NewsService;
use crate::application::reviews::ReviewService;
use crate::application::sellers::SellerService;
use crate::application::taxonomy::TaxonomyService;
use crate::cache::TtlStore;
use crate::config::{Command, ListingSettings, Settings};
use crate::infra::rest::RestBackend;

/// Wired services sharing one backend client and one cache.
pub struct AppContext {
    pub companies: CompanyService,
    pub classifieds: ClassifiedService,
    pub news: NewsService,
    pub sellers: SellerService,
    pub reviews: ReviewService,
    pub taxonomy: TaxonomyService,
    pub listing: ListingSettings,
}

impl AppContext {
    pub fn new(settings: &Settings) -> Result<Self, AppError> {
        let backend = Arc::new(RestBackend::new(&settings.backend)?);
        let cache = Arc::new(TtlStore::new(&settings.cache));
        let cap = settings.listing.materialize_cap;

        Ok(Self {
            companies: CompanyService::new(
                backend.clone(),
                cache.clone(),
                settings.cache.listing_ttl,
                cap,
            ),
            classifieds: ClassifiedService::new(
                backend.clone(),
                cache.clone(),
                settings.cache.listing_ttl,
                cap,
            ),
            news: NewsService::new(
                backend.clone(),
                cache.clone(),
                settings.cache.listing_ttl,
                cap,
            ),
            sellers: SellerService::new(
                backend.clone(),
                cache.clone(),
                settings.cache.listing_ttl,
                cap,
            ),
            reviews: ReviewService::new(backend.clone(), cache.clone(), settings.cache.volatile_ttl),
            taxonomy: TaxonomyService::new(backend, cache, settings.cache.static_ttl),
            listing: settings.listing.clone(),
        })
    }
}

pub async fn run(command: Command, ctx: &AppContext) -> Result<(), AppError> {
    match command {
        Command::Companies(args) => handlers::companies(ctx, args.command).await,
        Command::Classifieds(args) => handlers::classifieds(ctx, args.command).await,
        Command::News(args) => handlers::news(ctx, args.command).await,
        Command::Sellers(args) => handlers::sellers(ctx, args.command).await,
        Command::Vote(args) => handlers::vote(ctx, args).await,
        Command::Review(args) => handlers::review(ctx, args).await,
        Command::Countries => handlers::countries(ctx).await,
        Command::Categories(args) => handlers::categories(ctx, args).await,
    }
}

//! Subcommand handlers: build filters, call the services, print JSON.

use futures::join;
use serde_json::json;
use tracing::warn;

use crate::application::error::AppError;
use crate::application::pagination::PageRequest;
use crate::application::repos::{ListingFilter, NewsFilter, SellerFilter};
use crate::config::{
    CategoriesArgs, ClassifiedsCommand, CompaniesCommand, CreateCompanyArgs, ListFilterArgs,
    NewsCommand, ReviewArgs, SellersCommand, VoteArgs,
};
use crate::domain::types::{CategoryKind, ListScope, SortMode};

use super::AppContext;
use super::print::print_json;

fn parse_sort(sort: Option<&str>) -> Result<SortMode, AppError> {
    match sort {
        Some(value) => value.parse().map_err(AppError::Validation),
        None => Ok(SortMode::default()),
    }
}

fn scope_for(admin: bool) -> ListScope {
    if admin { ListScope::Admin } else { ListScope::Public }
}

pub async fn companies(ctx: &AppContext, command: CompaniesCommand) -> Result<(), AppError> {
    match command {
        CompaniesCommand::List(args) => list_companies(ctx, args).await,
        CompaniesCommand::Show { slug } => show_company(ctx, &slug).await,
        CompaniesCommand::Create(args) => create_company(ctx, args).await,
    }
}

async fn list_companies(ctx: &AppContext, args: ListFilterArgs) -> Result<(), AppError> {
    let sort = parse_sort(args.sort.as_deref())?;
    let filter = ListingFilter {
        country: args.country,
        category: args.category,
        search: args.search,
    };
    let page = PageRequest::new(args.page, ctx.listing.companies_page_size.get());
    let result = ctx
        .companies
        .list(scope_for(args.admin), filter, sort, page)
        .await?;
    print_json(&result)
}

async fn show_company(ctx: &AppContext, slug: &str) -> Result<(), AppError> {
    let company = match ctx.companies.get(slug).await {
        Ok(company) => company,
        // The web surface redirects a dead detail link back to the listing;
        // the CLI equivalent is the default list plus a notice on stderr.
        Err(err) if err.is_not_found() => {
            eprintln!("company `{slug}` not found; showing the companies list");
            return list_companies(ctx, ListFilterArgs::default()).await;
        }
        Err(err) => return Err(err),
    };

    // Independent fetches merged into disjoint fields; completion order does
    // not matter.
    let (rating, votes, reviews) = join!(
        ctx.reviews.rating(company.id),
        ctx.reviews.vote_count(company.id),
        ctx.reviews.reviews_for(company.id),
    );
    let rating = rating?;
    let votes = votes?;
    let reviews = reviews?;

    ctx.companies.record_view(company.id).await;

    print_json(&json!({
        "company": company,
        "rating": rating,
        "votes": votes,
        "reviews": reviews,
    }))
}

async fn create_company(ctx: &AppContext, args: CreateCompanyArgs) -> Result<(), AppError> {
    let record = ctx
        .companies
        .create(crate::application::companies::NewCompany {
            name: args.name,
            description: args.description,
            country: args.country,
            category_id: args.category,
            website: args.website,
            logo_url: args.logo_url,
        })
        .await?;
    print_json(&record)
}

pub async fn classifieds(ctx: &AppContext, command: ClassifiedsCommand) -> Result<(), AppError> {
    match command {
        ClassifiedsCommand::List(args) => {
            let sort = parse_sort(args.sort.as_deref())?;
            let filter = ListingFilter {
                country: args.country,
                category: args.category,
                search: args.search,
            };
            let page = PageRequest::new(args.page, ctx.listing.classifieds_page_size.get());
            let result = ctx
                .classifieds
                .list(scope_for(args.admin), filter, sort, page)
                .await?;
            print_json(&result)
        }
        ClassifiedsCommand::Show { slug } => {
            let record = ctx.classifieds.get(&slug).await?;
            print_json(&record)
        }
    }
}

pub async fn news(ctx: &AppContext, command: NewsCommand) -> Result<(), AppError> {
    match command {
        NewsCommand::List { search, page } => {
            let filter = NewsFilter { search };
            let page = PageRequest::new(page, ctx.listing.news_page_size.get());
            let result = ctx.news.list(ListScope::Public, filter, page).await?;
            print_json(&result)
        }
        NewsCommand::Show { slug } => {
            let record = ctx.news.get(&slug).await?;
            print_json(&record)
        }
    }
}

pub async fn sellers(ctx: &AppContext, command: SellersCommand) -> Result<(), AppError> {
    match command {
        SellersCommand::List {
            country,
            search,
            sort,
            page,
        } => {
            let sort = parse_sort(sort.as_deref())?;
            let filter = SellerFilter { country, search };
            let page = PageRequest::new(page, ctx.listing.sellers_page_size.get());
            let result = ctx
                .sellers
                .list(ListScope::Public, filter, sort, page)
                .await?;
            print_json(&result)
        }
        SellersCommand::Show { slug } => {
            let record = ctx.sellers.get(&slug).await?;
            print_json(&record)
        }
    }
}

pub async fn vote(ctx: &AppContext, args: VoteArgs) -> Result<(), AppError> {
    let company = ctx.companies.get(&args.company).await?;
    let record = ctx
        .reviews
        .submit_vote(args.user, company.id, args.rating)
        .await?;

    // The cached aggregate was invalidated by the vote; re-fetch from the
    // source of truth instead of merging locally.
    let rating = match ctx.reviews.rating(company.id).await {
        Ok(rating) => Some(rating),
        Err(err) => {
            warn!(company = %args.company, error = %err, "rating refresh failed after vote");
            None
        }
    };

    print_json(&json!({ "vote": record, "rating": rating }))
}

pub async fn review(ctx: &AppContext, args: ReviewArgs) -> Result<(), AppError> {
    let company = ctx.companies.get(&args.company).await?;
    let record = ctx
        .reviews
        .submit_review(args.user, company.id, &args.text)
        .await?;
    print_json(&record)
}

pub async fn countries(ctx: &AppContext) -> Result<(), AppError> {
    let countries = ctx.taxonomy.countries().await?;
    print_json(&countries)
}

pub async fn categories(ctx: &AppContext, args: CategoriesArgs) -> Result<(), AppError> {
    let kind = match args.kind.as_str() {
        "company" | "companies" => CategoryKind::Company,
        "classified" | "classifieds" => CategoryKind::Classified,
        other => {
            return Err(AppError::validation(format!(
                "unknown category kind `{other}` (expected company or classified)"
            )));
        }
    };
    let categories = ctx.taxonomy.categories(kind).await?;
    print_json(&categories)
}

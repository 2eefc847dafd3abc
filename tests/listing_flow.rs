//! End-to-end listing flows over the in-memory backend: composition, cache
//! reuse across pages, and invalidation after writes.

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use uuid::Uuid;

use common::{FakeBackend, company};
use vitrina::application::companies::{CompanyService, NewCompany};
use vitrina::application::pagination::PageRequest;
use vitrina::application::repos::ListingFilter;
use vitrina::cache::{CacheConfig, TtlStore};
use vitrina::domain::types::{ListScope, SortMode};

fn service(backend: Arc<FakeBackend>) -> CompanyService {
    let cache = Arc::new(TtlStore::new(&CacheConfig::default()));
    CompanyService::new(backend, cache, Duration::from_secs(180), 1_000)
}

fn beauty_filter(category: Uuid) -> ListingFilter {
    ListingFilter {
        country: Some("us".to_string()),
        category: Some(category),
        search: None,
    }
}

#[tokio::test]
async fn second_page_serves_from_cache_with_zero_network_calls() {
    let backend = Arc::new(FakeBackend::new());
    let beauty = Uuid::new_v4();

    for i in 0..37 {
        backend.seed_company(company(&format!("Company {i:02}"), "us", beauty, i));
    }
    // Noise outside the filters.
    backend.seed_company(company("Elsewhere", "mx", beauty, 1));
    backend.seed_company(company("Other Trade", "us", Uuid::new_v4(), 2));

    let service = service(backend.clone());

    let first = service
        .list(
            ListScope::Public,
            beauty_filter(beauty),
            SortMode::Alphabetical,
            PageRequest::new(1, 24),
        )
        .await
        .expect("first page");

    assert_eq!(first.total_count, 37);
    assert_eq!(first.items.len(), 24);
    let names: Vec<&str> = first.items.iter().map(|c| c.name.as_str()).collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);

    let calls_after_first = backend.calls.remote_total();

    let second = service
        .list(
            ListScope::Public,
            beauty_filter(beauty),
            SortMode::Alphabetical,
            PageRequest::new(2, 24),
        )
        .await
        .expect("second page");

    assert_eq!(second.items.len(), 13);
    assert_eq!(second.total_count, 37);
    assert_eq!(second.items[0].name, "Company 24");
    assert_eq!(
        backend.calls.remote_total(),
        calls_after_first,
        "page 2 must not touch the backend"
    );
}

#[tokio::test]
async fn changed_filters_compose_a_fresh_set() {
    let backend = Arc::new(FakeBackend::new());
    let beauty = Uuid::new_v4();
    backend.seed_company(company("Acme", "us", beauty, 1));
    backend.seed_company(company("Bravo", "mx", beauty, 2));

    let service = service(backend.clone());

    let us = service
        .list(
            ListScope::Public,
            beauty_filter(beauty),
            SortMode::Newest,
            PageRequest::new(1, 12),
        )
        .await
        .expect("us page");
    assert_eq!(us.total_count, 1);

    let mx = service
        .list(
            ListScope::Public,
            ListingFilter {
                country: Some("mx".to_string()),
                category: Some(beauty),
                search: None,
            },
            SortMode::Newest,
            PageRequest::new(1, 12),
        )
        .await
        .expect("mx page");

    assert_eq!(mx.total_count, 1);
    assert_eq!(mx.items[0].name, "Bravo");
    assert_eq!(backend.calls.fetch_all.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn creating_a_company_invalidates_cached_lists() {
    let backend = Arc::new(FakeBackend::new());
    let beauty = Uuid::new_v4();
    backend.seed_company(company("Acme", "us", beauty, 1));

    let service = service(backend.clone());
    let filter = ListingFilter::default();

    let before = service
        .list(
            ListScope::Admin,
            filter.clone(),
            SortMode::Newest,
            PageRequest::new(1, 12),
        )
        .await
        .expect("list before create");
    assert_eq!(before.total_count, 1);
    assert_eq!(backend.calls.fetch_all.load(Ordering::SeqCst), 1);

    service
        .create(NewCompany {
            name: "Brand New".to_string(),
            description: "Fresh".to_string(),
            country: "us".to_string(),
            category_id: beauty,
            website: None,
            logo_url: None,
        })
        .await
        .expect("create");

    let after = service
        .list(
            ListScope::Admin,
            filter,
            SortMode::Newest,
            PageRequest::new(1, 12),
        )
        .await
        .expect("list after create");

    assert_eq!(after.total_count, 2);
    assert_eq!(
        backend.calls.fetch_all.load(Ordering::SeqCst),
        2,
        "the cached list must be invalidated by the write"
    );
    assert_eq!(after.items[0].name, "Brand New");
}

#[tokio::test]
async fn missing_detail_is_a_typed_not_found() {
    let backend = Arc::new(FakeBackend::new());
    let service = service(backend);

    let err = service.get("ghost").await.expect_err("missing company");
    assert!(err.is_not_found());
}

#[tokio::test]
async fn detail_lookup_is_cached_by_slug() {
    let backend = Arc::new(FakeBackend::new());
    let beauty = Uuid::new_v4();
    backend.seed_company(company("Acme", "us", beauty, 1));

    let service = service(backend.clone());

    let first = service.get("acme").await.expect("detail");
    let second = service.get("acme").await.expect("cached detail");
    assert_eq!(first.id, second.id);
    assert_eq!(backend.calls.find.load(Ordering::SeqCst), 1);
}

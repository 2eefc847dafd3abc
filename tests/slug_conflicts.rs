//! Slug allocation under collisions: the backend's unique constraint is the
//! arbiter, and creation retries with the next numeric suffix.

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use uuid::Uuid;

use common::{FakeBackend, company};
use vitrina::application::companies::{CompanyService, NewCompany};
use vitrina::cache::{CacheConfig, TtlStore};

fn service(backend: Arc<FakeBackend>) -> CompanyService {
    let cache = Arc::new(TtlStore::new(&CacheConfig::default()));
    CompanyService::new(backend, cache, Duration::from_secs(180), 1_000)
}

fn acme(category: Uuid) -> NewCompany {
    NewCompany {
        name: "Acme".to_string(),
        description: "A company".to_string(),
        country: "us".to_string(),
        category_id: category,
        website: None,
        logo_url: None,
    }
}

#[tokio::test]
async fn colliding_names_receive_incrementing_suffixes() {
    let backend = Arc::new(FakeBackend::new());
    let service = service(backend.clone());
    let category = Uuid::new_v4();

    let first = service.create(acme(category)).await.expect("first");
    let second = service.create(acme(category)).await.expect("second");
    let third = service.create(acme(category)).await.expect("third");

    assert_eq!(first.slug, "acme");
    assert_eq!(second.slug, "acme-1");
    assert_eq!(third.slug, "acme-2");
}

#[tokio::test]
async fn preexisting_slug_forces_the_first_suffix() {
    let backend = Arc::new(FakeBackend::new());
    backend.seed_company(company("Acme", "us", Uuid::new_v4(), 10));

    let service = service(backend.clone());
    let created = service
        .create(acme(Uuid::new_v4()))
        .await
        .expect("created despite collision");

    assert_eq!(created.slug, "acme-1");
    // One conflicted insert plus the successful retry.
    assert_eq!(backend.calls.insert.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn punctuated_names_normalize_before_probing() {
    let backend = Arc::new(FakeBackend::new());
    let service = service(backend);

    let created = service
        .create(NewCompany {
            name: "Acme & Co.  -- Ltd!".to_string(),
            description: "A company".to_string(),
            country: "us".to_string(),
            category_id: Uuid::new_v4(),
            website: None,
            logo_url: None,
        })
        .await
        .expect("created");

    assert_eq!(created.slug, "acme-co-ltd");
}

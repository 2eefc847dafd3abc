//! Utilities for generating deterministic, human-friendly slugs.
//!
//! Normalization is delegated to the `slug` crate (lowercase, punctuation
//! stripped, whitespace and hyphen runs collapsed, no edge hyphens).
//! Collisions are resolved by suffix probing: `base`, `base-1`, `base-2`, …
//! The probe loop is bounded only by actual collisions, and creation flows
//! additionally retry on the storage layer's unique-violation signal instead
//! of trusting the pre-check (see the entity services).

use std::future::Future;

use slug::slugify;
use thiserror::Error;

/// Errors that can occur while deriving a slug.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug source text is empty")]
    EmptyInput,
    #[error("failed to derive slug from `{input}`")]
    Unrepresentable { input: String },
}

/// Errors that can occur while generating a slug via an async uniqueness check.
#[derive(Debug, Error)]
pub enum SlugAsyncError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    #[error(transparent)]
    Slug(#[from] SlugError),
    #[error(transparent)]
    Predicate(E),
}

/// Derive a base slug from the provided human-readable text.
pub fn derive_slug(input: &str) -> Result<String, SlugError> {
    if input.trim().is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let candidate = slugify(input);
    if candidate.is_empty() {
        return Err(SlugError::Unrepresentable {
            input: input.to_string(),
        });
    }

    Ok(candidate)
}

/// Render the `attempt`-th probe candidate. Attempt 0 is the base itself.
pub fn with_suffix(base: &str, attempt: u32) -> String {
    if attempt == 0 {
        base.to_string()
    } else {
        format!("{base}-{attempt}")
    }
}

/// Produce a slug that the supplied predicate reports as free.
///
/// `is_taken` should return `true` when the candidate already exists. Probing
/// advances one numeric suffix per collision, so the loop terminates as soon
/// as the existing records run out.
pub fn unique_slug<F>(input: &str, mut is_taken: F) -> Result<String, SlugError>
where
    F: FnMut(&str) -> bool,
{
    let base = derive_slug(input)?;

    let mut attempt = 0u32;
    loop {
        let candidate = with_suffix(&base, attempt);
        if !is_taken(&candidate) {
            return Ok(candidate);
        }
        attempt += 1;
    }
}

/// Async variant of [`unique_slug`] that awaits the existence predicate.
pub async fn unique_slug_async<F, Fut, E>(
    input: &str,
    mut is_taken: F,
) -> Result<String, SlugAsyncError<E>>
where
    F: FnMut(&str) -> Fut,
    Fut: Future<Output = Result<bool, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    let base = derive_slug(input)?;

    let mut attempt = 0u32;
    loop {
        let candidate = with_suffix(&base, attempt);
        if !is_taken(&candidate)
            .await
            .map_err(SlugAsyncError::Predicate)?
        {
            return Ok(candidate);
        }
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_slug_normalizes_punctuation_and_runs() {
        let slug = derive_slug("Acme & Co.  -- Ltd!").expect("slug");
        assert_eq!(slug, "acme-co-ltd");
    }

    #[test]
    fn derive_slug_rejects_empty_input() {
        assert_eq!(derive_slug("   "), Err(SlugError::EmptyInput));
    }

    #[test]
    fn unique_slug_probes_numeric_suffixes() {
        let existing = ["acme".to_string()];
        let slug = unique_slug("Acme", |candidate| {
            existing.contains(&candidate.to_string())
        })
        .expect("unique slug");
        assert_eq!(slug, "acme-1");

        let existing = ["acme".to_string(), "acme-1".to_string()];
        let slug = unique_slug("Acme", |candidate| {
            existing.contains(&candidate.to_string())
        })
        .expect("unique slug");
        assert_eq!(slug, "acme-2");
    }

    #[test]
    fn unique_slug_without_collisions_returns_base() {
        let slug = unique_slug("Fresh Name", |_| false).expect("unique slug");
        assert_eq!(slug, "fresh-name");
    }

    #[tokio::test]
    async fn unique_slug_async_probes_until_free() {
        use std::sync::Arc;
        use tokio::sync::Mutex;

        let existing = Arc::new(Mutex::new(vec!["acme".to_string(), "acme-1".to_string()]));

        let slug = unique_slug_async("Acme", |candidate| {
            let existing = existing.clone();
            let candidate = candidate.to_string();
            async move {
                let guard = existing.lock().await;
                Ok::<bool, std::convert::Infallible>(guard.contains(&candidate))
            }
        })
        .await
        .expect("unique slug");

        assert_eq!(slug, "acme-2");
    }
}

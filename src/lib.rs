//! Vitrina: the backend-facing core of a directory/listing platform.
//!
//! Companies, classified ads, news articles, and direct-seller profiles live
//! in a hosted data platform; this crate supplies the typed REST client, the
//! in-memory TTL cache, the list-query composition every listing surface
//! shares, slug generation with conflict retry, and the vote/review rules.
//! The `vitrina` binary is a thin operator CLI over the same services.

pub mod application;
pub mod cache;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infra;

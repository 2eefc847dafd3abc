//! Infrastructure adapters: the hosted-backend REST client and telemetry.

pub mod error;
pub mod rest;
pub mod telemetry;

//! VGen backend REST client.
//!
//! This crate provides:
//! - A typed client for the ideas, pipeline and queue endpoints
//! - Error taxonomy that preserves the backend's `detail` message
//! - The `StudioApi` trait the dashboard is written against
//! - Request metrics through the `metrics` facade

pub mod api;
pub mod client;
pub mod error;
pub mod metrics;

#[cfg(test)]
mod client_tests;

pub use api::StudioApi;
pub use client::{ClientConfig, StudioClient, DEFAULT_BACKEND_URL};
pub use error::{extract_detail, ClientError, ClientResult};

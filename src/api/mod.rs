//! HTTP client module for the identity service.
//!
//! This module provides the `ApiClient` for the three auth endpoints
//! (obtain token pair, register, refresh) and the `ApiError` taxonomy
//! that classifies their failures.

pub mod client;
pub mod error;

pub use client::{ApiClient, TokenPair};
pub use error::ApiError;

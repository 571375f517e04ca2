//! REST API client module for the point-of-sale backend.
//!
//! This module provides the `ApiClient` for communicating with the backend
//! to manage clients, products, sales and the message board.
//!
//! The API uses JWT bearer tokens obtained from `/api/token/`. Expired
//! access tokens are refreshed transparently through `/api/token/refresh/`.

pub mod client;
pub mod endpoints;
pub mod error;
pub mod refresh;
pub mod resources;

pub use client::{ApiClient, ApiClientBuilder, ApiRequest};
pub use error::ApiError;

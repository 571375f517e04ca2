//! posadmin-core: client library for the point-of-sale admin backend.
//!
//! - `api`: the authenticated HTTP client with single-flight token refresh,
//!   plus the resource endpoints (clients, products, sales, message board)
//! - `auth`: token storage and the login session
//! - `models`: records as the backend serializes them
//! - `dashboard`, `board`: derived views used by the front ends
//! - `config`: on-disk configuration with environment overrides

pub mod api;
pub mod auth;
pub mod board;
pub mod config;
pub mod dashboard;
pub mod models;
pub mod utils;

pub use api::{ApiClient, ApiClientBuilder, ApiError, ApiRequest};
pub use auth::{AuthSession, TokenPair, TokenService, TokenStore};
pub use board::{add_tag_to_message, BoardError, TagBoard};
pub use config::{Config, TokenStorage};
pub use dashboard::DashboardStats;

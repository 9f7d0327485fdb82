//! Admin Backend API
//!
//! HTTP client layer for the VigiChain backend.
//!
//! # Endpoints
//!
//! ## Auth
//! - `POST /v1/auth/login` - Verify a signed login message
//! - `GET /v1/auth/me` - Current identity
//!
//! ## Resources
//! - `/v1/wallets`, `/v1/tags`, `/v1/categories`, `/v1/reports`,
//!   `/v1/chains`, `/v1/settings` (see [`crate::resources`])
//!
//! Every response is wrapped as `{ success, message, data }`; list endpoints
//! put `{ data, pagination }` (or a bare array) inside `data`.

pub mod auth;
pub mod client;
pub mod dto;
pub mod error;

pub use auth::{AuthApi, LoginRequest, LoginResponse, WalletIdentity, ADMIN_ROLE};
pub use client::ApiClient;
pub use dto::{Page, Pagination, QueryParams, SortOrder};
pub use error::{ApiError, ApiResult};

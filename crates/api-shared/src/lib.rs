//! # API Shared
//!
//! Shared request/response types and services for OptiNote APIs.
//!
//! Contains:
//! - Wire DTOs (`dto` module) with OpenAPI schemas
//! - Shared services like `HealthService`
//!
//! Used by `api-rest` and available to any other adapter over `optinote-core`.

pub mod dto;
pub mod health;

pub use dto::*;
pub use health::HealthService;

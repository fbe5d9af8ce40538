//! Flight delay prediction service
//!
//! Serves `GET /health` and `POST /predict` over a delay artifact loaded
//! once at startup and shared read-only across requests.

pub mod config;
pub mod errors;
pub mod server;

pub use config::{ConfigError, ServiceConfig, CONFIG_PATH_ENV};
pub use errors::{ApiError, ErrorResponse};
pub use server::{build_router, serve, AppState};

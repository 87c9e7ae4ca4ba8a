//! # meridian-core
//!
//! Shared foundation for the Meridian ERP authentication subsystem:
//! the unified [`error::AppError`] type, the [`result::AppResult`] alias,
//! and the configuration schemas loaded from TOML + environment.

pub mod config;
pub mod error;
pub mod result;
pub mod telemetry;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;

//! TA Desk - Backend Library
//!
//! University TA management backend: role-scoped request workflows,
//! audit trail and notifications.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod store;
pub mod telemetry;

pub use config::Config;
pub use error::{AppError, Result};

//! API request handlers.

pub mod audit;
pub mod auth;
pub mod health;
pub mod leave;
pub mod notifications;
pub mod swap;
pub mod users;

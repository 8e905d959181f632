//! Services - business logic layer.
//!
//! Each service is constructed once at startup and shared via `Arc`;
//! there are no hidden globals beyond the immutable permission registry.

pub mod audit_service;
pub mod auth_service;
pub mod guard;
pub mod leave_service;
pub mod notification_service;
pub mod swap_service;

//! API module - HTTP handlers and middleware.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;

use std::sync::Arc;

use crate::config::Config;
use crate::models::PermissionRegistry;
use crate::services::audit_service::AuditService;
use crate::services::auth_service::AuthService;
use crate::services::guard::Guard;
use crate::services::leave_service::LeaveService;
use crate::services::notification_service::NotificationService;
use crate::services::swap_service::SwapService;
use crate::store::Store;

/// Application state shared across handlers.
///
/// All services are constructed once here and shared for the process
/// lifetime.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub registry: Arc<PermissionRegistry>,
    pub store: Arc<dyn Store>,
    pub auth: Arc<AuthService>,
    pub guard: Arc<Guard>,
    pub audit: Arc<AuditService>,
    pub notifier: Arc<NotificationService>,
    pub leave: Arc<LeaveService>,
    pub swap: Arc<SwapService>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn Store>) -> Self {
        let registry = Arc::new(PermissionRegistry::new());
        let auth = Arc::new(AuthService::new(store.clone(), registry.clone(), &config));
        let audit = Arc::new(AuditService::new(store.clone()));
        let guard = Arc::new(Guard::new(audit.clone()));
        let notifier = Arc::new(NotificationService::new(store.clone()));
        let leave = Arc::new(LeaveService::new(
            store.clone(),
            audit.clone(),
            notifier.clone(),
        ));
        let swap = Arc::new(SwapService::new(
            store.clone(),
            audit.clone(),
            notifier.clone(),
        ));
        Self {
            config,
            registry,
            store,
            auth,
            guard,
            audit,
            notifier,
            leave,
            swap,
        }
    }
}

pub type SharedState = Arc<AppState>;

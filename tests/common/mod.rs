#![allow(dead_code)]

use std::sync::Arc;

use ta_desk_backend::api::{AppState, SharedState};
use ta_desk_backend::models::{Assignment, AssignmentKind, PermissionRegistry, Role, User};
use ta_desk_backend::services::auth_service::{AuthService, Identity};
use ta_desk_backend::store::{AssignmentStore, MemoryStore, UserStore};
use ta_desk_backend::Config;
use uuid::Uuid;

pub fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".into(),
        log_level: "debug".into(),
        jwt_secret: "integration-test-secret".into(),
        jwt_access_token_expiry_minutes: 60,
        admin_username: "admin".into(),
        admin_password: None,
    }
}

/// Full application state backed by a fresh in-memory store.
pub fn test_state() -> (SharedState, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let state = Arc::new(AppState::new(test_config(), store.clone()));
    (state, store)
}

/// Identity for an existing user, with permissions derived the same way
/// the token path derives them.
pub fn identity_for(user: &User) -> Identity {
    let registry = PermissionRegistry::new();
    Identity {
        user_id: user.id,
        role: user.role,
        permissions: registry.permissions_for(user.role).clone(),
    }
}

pub async fn seed_user(store: &MemoryStore, username: &str, role: Role) -> User {
    let user = User::new(username, format!("{username}@uni.edu"), role);
    store.insert_user(user.clone()).await.unwrap();
    user
}

pub async fn seed_user_with_password(
    store: &MemoryStore,
    username: &str,
    role: Role,
    password: &str,
) -> User {
    let mut user = User::new(username, format!("{username}@uni.edu"), role);
    user.password_hash = Some(AuthService::hash_password(password).unwrap());
    store.insert_user(user.clone()).await.unwrap();
    user
}

pub async fn seed_assignment(
    store: &MemoryStore,
    user_id: Uuid,
    course_id: Uuid,
    kind: AssignmentKind,
    title: &str,
) -> Assignment {
    let assignment = Assignment::new(user_id, course_id, kind, title);
    store.insert_assignment(assignment.clone()).await.unwrap();
    assignment
}

//! Server entrypoint.

use std::sync::Arc;

use ta_desk_backend::api::routes::build_router;
use ta_desk_backend::api::AppState;
use ta_desk_backend::models::{Role, User};
use ta_desk_backend::services::auth_service::AuthService;
use ta_desk_backend::store::{MemoryStore, UserStore};
use ta_desk_backend::telemetry::init_tracing;
use ta_desk_backend::{Config, Result};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(&format!("ta_desk_backend={},tower_http=info", config.log_level));

    let store = Arc::new(MemoryStore::new());
    provision_admin(&config, store.as_ref()).await?;

    let state = Arc::new(AppState::new(config.clone(), store));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    tracing::info!(address = %config.bind_address, "Server listening");
    // ConnectInfo makes the peer address available for audit entries.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;
    Ok(())
}

/// Seed the initial admin account. When `ADMIN_PASSWORD` is unset a
/// random password is generated and logged once at startup.
async fn provision_admin(config: &Config, store: &MemoryStore) -> Result<()> {
    if store.get_user_by_username(&config.admin_username).await?.is_some() {
        return Ok(());
    }

    let (password, generated) = match &config.admin_password {
        Some(p) => (p.clone(), false),
        None => (uuid::Uuid::new_v4().simple().to_string(), true),
    };

    let mut admin = User::new(
        config.admin_username.clone(),
        format!("{}@localhost", config.admin_username),
        Role::Admin,
    );
    admin.password_hash = Some(AuthService::hash_password(&password)?);
    store.insert_user(admin).await?;

    if generated {
        tracing::warn!(
            username = %config.admin_username,
            password = %password,
            "Provisioned admin with generated password; set ADMIN_PASSWORD to override"
        );
    } else {
        tracing::info!(username = %config.admin_username, "Provisioned admin account");
    }
    Ok(())
}

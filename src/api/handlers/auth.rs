//! Authentication handlers.

use axum::{
    extract::{Extension, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::SharedState;
use crate::error::Result;
use crate::models::User;
use crate::services::audit_service::{Actor, AuditAction, AuditEntry, ClientInfo, EntityType};

pub fn router() -> Router<SharedState> {
    Router::new().route("/login", post(login))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: User,
}

/// Authenticate with username and password, returning a bearer token.
#[utoipa::path(
    post,
    path = "/login",
    context_path = "/api/v1/auth",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = crate::api::openapi::ErrorResponse),
    )
)]
pub async fn login(
    State(state): State<SharedState>,
    Extension(client): Extension<ClientInfo>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    match state.auth.authenticate(&req.username, &req.password).await {
        Ok((user, token)) => {
            state
                .audit
                .record(
                    AuditEntry::new(AuditAction::Login, EntityType::User)
                        .actor(Actor::User(user.id))
                        .entity(user.id)
                        .description("User logged in")
                        .client(&client),
                )
                .await;
            Ok(Json(LoginResponse {
                access_token: token.access_token,
                token_type: token.token_type.to_string(),
                expires_in: token.expires_in,
                user,
            }))
        }
        Err(e) => {
            state
                .audit
                .record(
                    AuditEntry::new(AuditAction::LoginFailed, EntityType::User)
                        .actor(Actor::Anonymous)
                        .description(format!("Login failed for {}", req.username))
                        .client(&client),
                )
                .await;
            Err(e)
        }
    }
}

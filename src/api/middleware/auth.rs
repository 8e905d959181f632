//! Authentication middleware.
//!
//! Resolves the `Authorization: Bearer <token>` header to an
//! [`Identity`] and stores it as `Option<Identity>` in the request
//! extensions, alongside a [`ClientInfo`] with the peer address and
//! `User-Agent` for audit entries. Requests without credentials proceed
//! with `None` so the guard can record the deny; requests with an
//! invalid token or role are rejected here.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::header::{AUTHORIZATION, USER_AGENT},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::api::SharedState;
use crate::error::{AppError, Result};
use crate::services::audit_service::{Actor, AuditAction, AuditEntry, ClientInfo, EntityType};
use crate::services::auth_service::Identity;

/// Resolve the caller identity, if any, and attach it to the request.
pub async fn auth_middleware(
    State(state): State<SharedState>,
    mut request: Request,
    next: Next,
) -> Response {
    let client = client_info(&request);

    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(str::to_owned);

    let identity = match header.as_deref() {
        None => None,
        Some(value) => match value.strip_prefix("Bearer ") {
            None => {
                return reject(
                    &state,
                    &client,
                    AppError::Authentication("Invalid authorization header format".to_string()),
                )
                .await;
            }
            Some(token) => match state.auth.resolve_identity(token) {
                Ok(identity) => Some(identity),
                Err(e) => return reject(&state, &client, e).await,
            },
        },
    };

    request.extensions_mut().insert(identity);
    request.extensions_mut().insert(client);
    next.run(request).await
}

/// Peer address and user agent, when the transport provides them.
/// `ConnectInfo` is present only when the server is started with
/// `into_make_service_with_connect_info`.
fn client_info(request: &Request) -> ClientInfo {
    ClientInfo {
        ip_address: request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string()),
        user_agent: request
            .headers()
            .get(USER_AGENT)
            .and_then(|h| h.to_str().ok())
            .map(str::to_owned),
    }
}

/// Record the boundary deny and convert the error into a response.
async fn reject(state: &SharedState, client: &ClientInfo, error: AppError) -> Response {
    state
        .audit
        .record(
            AuditEntry::new(AuditAction::AuthorizeDeny, EntityType::Authorization)
                .actor(Actor::Anonymous)
                .description("credential rejected at boundary")
                .metadata(serde_json::json!({ "reason": error.to_string() }))
                .client(client),
        )
        .await;
    error.into_response()
}

/// Unwrap the identity after a guard check has passed.
///
/// Handlers call this only on paths the guard has already allowed, so a
/// missing identity here is an authentication failure, not a bug.
pub fn require_identity(identity: &Option<Identity>) -> Result<&Identity> {
    identity
        .as_ref()
        .ok_or_else(|| AppError::Authentication("Missing credentials".to_string()))
}

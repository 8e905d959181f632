//! Authentication service.
//!
//! Resolves bearer credentials to an [`Identity`], and handles password
//! verification and JWT issuance.

use std::collections::HashSet;
use std::sync::Arc;

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{Permission, PermissionRegistry, Role, User};
use crate::store::Store;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: Uuid,
    /// Role wire name
    pub role: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Authenticated caller with the permission set derived once per
/// request from the registry. Never cached beyond the request.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: Role,
    pub permissions: HashSet<Permission>,
}

impl Identity {
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }
}

/// Access token response
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
}

/// Authentication service
pub struct AuthService {
    store: Arc<dyn Store>,
    registry: Arc<PermissionRegistry>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_expiry_minutes: i64,
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>, registry: Arc<PermissionRegistry>, config: &Config) -> Self {
        let secret = config.jwt_secret.as_bytes();
        Self {
            store,
            registry,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            token_expiry_minutes: config.jwt_access_token_expiry_minutes,
        }
    }

    /// Authenticate with username and password
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<(User, TokenResponse)> {
        let user = self
            .store
            .get_user_by_username(username)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| AppError::Authentication("Invalid username or password".to_string()))?;

        let password_hash = user
            .password_hash
            .as_deref()
            .ok_or_else(|| AppError::Authentication("Invalid username or password".to_string()))?;

        if !Self::verify_password(password, password_hash)? {
            return Err(AppError::Authentication(
                "Invalid username or password".to_string(),
            ));
        }

        let token = self.issue_token(&user)?;
        Ok((user, token))
    }

    /// Issue a signed access token for a user
    pub fn issue_token(&self, user: &User) -> Result<TokenResponse> {
        let now = Utc::now();
        let exp = now + Duration::minutes(self.token_expiry_minutes);
        let claims = Claims {
            sub: user.id,
            role: user.role.as_str().to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };
        let access_token = encode(&Header::default(), &claims, &self.encoding_key)?;
        Ok(TokenResponse {
            access_token,
            token_type: "Bearer",
            expires_in: (self.token_expiry_minutes * 60) as u64,
        })
    }

    /// Resolve a bearer token to an identity.
    ///
    /// The role claim must name a defined role; the permission set is
    /// derived from the registry at this point and travels with the
    /// identity for the rest of the request.
    pub fn resolve_identity(&self, token: &str) -> Result<Identity> {
        let data = self.decode_token(token)?;
        let claims = data.claims;

        if !self.registry.role_exists(&claims.role) {
            return Err(AppError::Authorization("invalid role".to_string()));
        }
        // role_exists established the parse succeeds
        let role = Role::parse(&claims.role)
            .ok_or_else(|| AppError::Authorization("invalid role".to_string()))?;

        Ok(Identity {
            user_id: claims.sub,
            role,
            permissions: self.registry.permissions_for(role).clone(),
        })
    }

    fn decode_token(&self, token: &str) -> Result<TokenData<Claims>> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|e| AppError::Authentication(format!("Invalid token: {}", e)))
    }

    /// Hash a password
    pub fn hash_password(password: &str) -> Result<String> {
        hash(password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// Verify a password against a hash
    pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
        verify(password, hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
    }
}

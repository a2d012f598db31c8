use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::utils::error::AppError;

/// JWT Claims issued by the external auth service.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject - User ID
    pub sub: String,
    pub username: String,
    /// One of `admin`, `manager`, `staff`, `customer`
    pub role: String,
    /// Expiration Time (UNIX TIME)
    pub exp: usize,
}

impl Claims {
    pub fn new(user_id: Uuid, username: impl Into<String>, role: Role, ttl_secs: i64) -> Self {
        Claims {
            sub: user_id.to_string(),
            username: username.into(),
            role: role.as_str().to_string(),
            exp: (chrono::Utc::now().timestamp() + ttl_secs).max(0) as usize,
        }
    }

    /// Sign these claims with the shared HS256 secret.
    pub fn issue(&self, secret: &str) -> Result<String, AppError> {
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| AppError::internal(format!("Token generation failed: {}", e)))
    }

    /// Resolve the claims into the identity the workflow trusts.
    pub fn actor(&self) -> Result<Actor, AppError> {
        let user_id = self
            .sub
            .parse::<Uuid>()
            .map_err(|_| AppError::Unauthenticated("Invalid user ID format in token".to_string()))?;
        let role = Role::parse(&self.role)
            .ok_or_else(|| AppError::Unauthenticated(format!("Unknown role '{}'", self.role)))?;
        Ok(Actor { user_id, role })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    Staff,
    Customer,
}

impl Role {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "admin" => Some(Role::Admin),
            "manager" => Some(Role::Manager),
            "staff" => Some(Role::Staff),
            "customer" => Some(Role::Customer),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Staff => "staff",
            Role::Customer => "customer",
        }
    }
}

/// Authenticated caller, attached to every private request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Managers propose changes; admins may too.
    pub fn can_submit(&self) -> bool {
        matches!(self.role, Role::Manager | Role::Admin)
    }
}

/// ✅ **JWT Middleware** (Handles Token Authentication)
pub async fn jwt_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let auth_header = req.headers().get("Authorization").ok_or_else(|| {
        tracing::warn!("Missing Authorization header");
        AppError::Unauthenticated("Missing Authorization header".to_string()).into_response()
    })?;

    let token_str = auth_header.to_str().map_err(|_| {
        AppError::validation("Invalid Authorization header format").into_response()
    })?;

    let token = token_str.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::validation("Invalid token format (missing 'Bearer ' prefix)").into_response()
    })?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.config.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::warn!("JWT decoding failed: {:?}", e);
        AppError::Unauthenticated("Invalid token".to_string()).into_response()
    })?;

    let actor = token_data.claims.actor().map_err(IntoResponse::into_response)?;
    tracing::debug!("Authenticated {} as {}", actor.user_id, actor.role.as_str());

    req.extensions_mut().insert(token_data.claims);
    req.extensions_mut().insert(actor);
    Ok(next.run(req).await)
}

fn actor_from(req: &Request<Body>) -> Result<Actor, Response> {
    req.extensions().get::<Actor>().copied().ok_or_else(|| {
        tracing::error!("Missing actor in request; jwt_middleware must run first");
        AppError::Unauthenticated("Missing credentials".to_string()).into_response()
    })
}

/// Gate for manager-facing routes.
pub async fn require_manager(req: Request<Body>, next: Next) -> Result<Response, Response> {
    let actor = actor_from(&req)?;
    if !actor.can_submit() {
        return Err(AppError::forbidden("Manager role required").into_response());
    }
    Ok(next.run(req).await)
}

/// Gate for admin-facing routes.
pub async fn require_admin(req: Request<Body>, next: Next) -> Result<Response, Response> {
    let actor = actor_from(&req)?;
    if !actor.is_admin() {
        return Err(AppError::forbidden("Admin role required").into_response());
    }
    Ok(next.run(req).await)
}

// ============================================================================
// Authority HTTP Handlers
// ============================================================================
//
// Endpoints:
// - POST /auth/register     - create an account
// - POST /auth/login        - validate credentials, mint a signed token
// - POST /auth/authenticate - verify a presented credential (internal)
//
// Login echoes the credential into the `Authentication` cookie as well as
// the response body, so both browser and API clients work unchanged.
//
// ============================================================================

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::AuthorityContext;
use crate::error::{AppError, AppResult};
use crate::guard::{self, credentials::CREDENTIAL_COOKIE};
use crate::identity::Identity;
use crate::stores::User;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// User shape exposed over HTTP; never includes the password hash
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub roles: Vec<String>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            roles: user.roles.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    /// Unix epoch seconds
    pub expires_at: i64,
    pub user: UserResponse,
}

/// POST /auth/register
pub async fn register(
    State(ctx): State<Arc<AuthorityContext>>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    let user = ctx.core.register(&request.email, &request.password).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// POST /auth/login
pub async fn login(
    State(ctx): State<Arc<AuthorityContext>>,
    Json(request): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let (token, expires_at, user) = ctx.core.login(&request.email, &request.password).await?;

    let max_age = (expires_at - Utc::now().timestamp()).max(0);
    let cookie = format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        CREDENTIAL_COOKIE, token, max_age
    );
    let mut headers = HeaderMap::new();
    headers.insert(
        SET_COOKIE,
        HeaderValue::from_str(&cookie)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("cookie encoding: {}", e)))?,
    );

    let body = LoginResponse {
        token,
        expires_at,
        user: UserResponse::from(&user),
    };
    Ok((headers, Json(body)))
}

/// POST /auth/authenticate
///
/// Internal HTTP frontend of the verification operation the TCP, queue
/// and gRPC transports expose; reads the credential the same way the
/// guard does.
pub async fn authenticate(
    State(ctx): State<Arc<AuthorityContext>>,
    headers: HeaderMap,
) -> AppResult<Json<Identity>> {
    let credential = guard::extract_credential(&headers).ok_or(AppError::Unauthorized)?;
    let identity = ctx.core.authenticate(&credential).await?;
    Ok(Json(identity))
}

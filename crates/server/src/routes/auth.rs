use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
    Extension, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use uuid::Uuid;

use service::auth::domain::{AuthUser, LoginInput, RegisterInput};
use service::auth::repo::seaorm::SeaOrmAuthRepository;
use service::auth::service::{AuthConfig, AuthService};
use service::listing::ListingService;
use service::storage::FileStore;

use crate::errors::ApiError;

pub const AUTH_COOKIE: &str = "auth_token";

#[derive(Clone)]
pub struct ServerAuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

#[derive(Clone)]
pub struct ServerState {
    pub auth: Arc<AuthService<SeaOrmAuthRepository>>,
    pub listings: ListingService,
    /// Externally visible base URL (no trailing slash), used for page links.
    pub public_url: String,
    pub storage_root: PathBuf,
    pub max_body_bytes: usize,
}

impl ServerState {
    pub fn new(
        db: DatabaseConnection,
        store: Arc<dyn FileStore>,
        auth: ServerAuthConfig,
        public_url: &str,
        storage_root: PathBuf,
        max_body_bytes: usize,
    ) -> Self {
        let repo = Arc::new(SeaOrmAuthRepository { db: db.clone() });
        let cfg = AuthConfig {
            jwt_secret: Some(auth.jwt_secret),
            password_algorithm: "argon2".into(),
            token_ttl_hours: auth.token_ttl_hours,
        };
        Self {
            auth: Arc::new(AuthService::new(repo, cfg)),
            listings: ListingService::new(db, store),
            public_url: public_url.trim_end_matches('/').to_string(),
            storage_root,
            max_body_bytes,
        }
    }
}

#[derive(Serialize)]
pub struct RegisterOutput { pub user_id: Uuid }

#[derive(Serialize)]
pub struct MeOutput { pub user_id: Uuid, pub email: String, pub name: String, pub username: Option<String> }

#[derive(Serialize)]
pub struct LoginOutput { pub user_id: Uuid, pub email: String, pub name: String, pub token: String }

#[utoipa::path(post, path = "/auth/register", tag = "auth", request_body = crate::openapi::RegisterRequest, responses((status = 200, description = "Registered"), (status = 400, description = "Bad Request"), (status = 409, description = "Conflict")))]
pub async fn register(State(state): State<ServerState>, Json(input): Json<RegisterInput>) -> Result<Json<RegisterOutput>, ApiError> {
    let user = state.auth.register(input).await?;
    Ok(Json(RegisterOutput { user_id: user.id }))
}

#[utoipa::path(post, path = "/auth/login", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Logged In"), (status = 401, description = "Unauthorized")))]
pub async fn login(State(state): State<ServerState>, jar: CookieJar, Json(input): Json<LoginInput>) -> Result<(CookieJar, Json<LoginOutput>), ApiError> {
    let session = state.auth.login(input).await?;
    let user = session.user;
    let token = session.token.ok_or_else(|| ApiError::Internal("token generation failed".into()))?;

    let mut cookie = Cookie::new(AUTH_COOKIE, token.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(false);
    cookie.set_same_site(SameSite::Lax);
    let jar = jar.add(cookie);
    let out = LoginOutput { user_id: user.id, email: user.email, name: user.name, token };
    Ok((jar, Json(out)))
}

#[utoipa::path(post, path = "/auth/logout", tag = "auth", responses((status = 204, description = "Cookie cleared")))]
pub async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    let mut cookie = Cookie::from(AUTH_COOKIE);
    cookie.set_path("/");
    (jar.remove(cookie), StatusCode::NO_CONTENT)
}

#[utoipa::path(get, path = "/auth/me", tag = "auth", responses((status = 200, description = "Current user"), (status = 401, description = "Unauthorized")))]
pub async fn me(Extension(user): Extension<AuthUser>) -> Json<MeOutput> {
    Json(MeOutput { user_id: user.id, email: user.email, name: user.name, username: user.username })
}

/// Bearer token from `Authorization`, falling back to the `auth_token` cookie.
fn extract_token(req: &Request, jar: &CookieJar) -> Result<Option<String>, ApiError> {
    if let Some(h) = req.headers().get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        return match h.strip_prefix("Bearer ") {
            Some(t) if !t.trim().is_empty() => Ok(Some(t.trim().to_string())),
            _ => {
                tracing::warn!(path = %req.uri().path(), "invalid Authorization format (expect Bearer)");
                Err(ApiError::Unauthorized("Unauthenticated.".into()))
            }
        };
    }
    Ok(jar.get(AUTH_COOKIE).map(|c| c.value().to_string()).filter(|t| !t.is_empty()))
}

/// 路由中间件：解析 Bearer token 并把 `AuthUser` 放入请求扩展
/// 缺失或非法 token 一律返回 401
pub async fn require_auth(
    State(state): State<ServerState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = extract_token(&req, &jar)? else {
        tracing::warn!(path = %req.uri().path(), "missing Authorization header and auth_token cookie");
        return Err(ApiError::Unauthorized("Unauthenticated.".into()));
    };
    let user = state.auth.resolve_token(&token).await.map_err(|e| {
        tracing::warn!(path = %req.uri().path(), err = %e, "token validation failed");
        ApiError::from(e)
    })?;
    tracing::debug!(user_id = %user.id, "principal resolved");
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

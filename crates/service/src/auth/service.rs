use std::sync::Arc;

use argon2::{Argon2, password_hash::{PasswordHasher, PasswordVerifier, SaltString}, PasswordHash};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header as JwtHeader, Validation};
use rand::rngs::OsRng;
use tracing::{info, debug, instrument};
use uuid::Uuid;

use super::domain::{RegisterInput, LoginInput, AuthUser, AuthSession, Claims};
use super::errors::AuthError;
use super::repository::AuthRepository;

/// Auth service configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: Option<String>,
    pub password_algorithm: String,
    pub token_ttl_hours: i64,
}

impl AuthConfig {
    pub fn with_secret(secret: &str) -> Self {
        Self { jwt_secret: Some(secret.to_string()), password_algorithm: "argon2".into(), token_ttl_hours: 12 }
    }
}

/// Auth business service independent of web framework
pub struct AuthService<R: AuthRepository> {
    repo: Arc<R>,
    cfg: AuthConfig,
}

impl<R: AuthRepository> AuthService<R> {
    pub fn new(repo: Arc<R>, cfg: AuthConfig) -> Self { Self { repo, cfg } }

    /// Register a new user with a hashed password.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::RegisterInput;
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo, AuthConfig { jwt_secret: None, password_algorithm: "argon2".into(), token_ttl_hours: 12 });
    /// let input = RegisterInput { email: "user@example.com".into(), name: "Test".into(), username: None, password: "Secret123".into() };
    /// let user = tokio_test::block_on(svc.register(input)).unwrap();
    /// assert_eq!(user.email, "user@example.com");
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterInput) -> Result<AuthUser, AuthError> {
        if input.password.len() < 8 {
            return Err(AuthError::Validation("password too short (>=8)".into()));
        }
        let email = input.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(AuthError::Validation("invalid email".into()));
        }
        if input.name.trim().is_empty() {
            return Err(AuthError::Validation("name required".into()));
        }
        if let Some(existing) = self.repo.find_user_by_email(email).await? {
            debug!("user exists: {}", existing.email);
            return Err(AuthError::Conflict);
        }

        let user = self.repo.create_user(email, input.name.trim(), input.username.as_deref()).await?;
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(input.password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashError(e.to_string()))?
            .to_string();

        let _cred = self.repo.upsert_password(user.id, hash, self.cfg.password_algorithm.clone()).await?;
        info!(user_id = %user.id, email = %user.email, "user_registered");
        Ok(user)
    }

    /// Authenticate a user and optionally issue a token.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::{RegisterInput, LoginInput};
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo.clone(), AuthConfig::with_secret("secret"));
    /// let _ = tokio_test::block_on(svc.register(RegisterInput { email: "u@e.com".into(), name: "N".into(), username: None, password: "Passw0rd".into() }));
    /// let session = tokio_test::block_on(svc.login(LoginInput { email: "u@e.com".into(), password: "Passw0rd".into() })).unwrap();
    /// assert_eq!(session.user.email, "u@e.com");
    /// assert!(session.token.is_some());
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let user = self.repo
            .find_user_by_email(input.email.trim())
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let cred = self.repo
            .get_credentials(user.id)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let parsed = PasswordHash::new(&cred.password_hash).map_err(|e| AuthError::HashError(e.to_string()))?;
        if Argon2::default().verify_password(input.password.as_bytes(), &parsed).is_err() {
            return Err(AuthError::Unauthorized);
        }

        let mut token = None;
        if let Some(secret) = &self.cfg.jwt_secret {
            let exp = (chrono::Utc::now() + chrono::Duration::hours(self.cfg.token_ttl_hours)).timestamp() as usize;
            let claims = Claims { sub: user.email.clone(), uid: user.id.to_string(), exp };
            token = Some(encode(&JwtHeader::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).map_err(|e| AuthError::TokenError(e.to_string()))?);
        }

        info!(user_id = %user.id, "user_logged_in");
        Ok(AuthSession { user, token })
    }

    /// Verify a bearer token and load its principal.
    ///
    /// Bad signature, expiry, malformed `uid` and deleted users all map to
    /// `Unauthorized`.
    pub async fn resolve_token(&self, token: &str) -> Result<AuthUser, AuthError> {
        let secret = self.cfg.jwt_secret.as_deref().ok_or(AuthError::Unauthorized)?;
        let data = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &Validation::default())
            .map_err(|e| {
                debug!(error = %e, "token rejected");
                AuthError::Unauthorized
            })?;
        let uid = Uuid::parse_str(&data.claims.uid).map_err(|_| AuthError::Unauthorized)?;
        self.repo.find_user_by_id(uid).await?.ok_or(AuthError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repository::mock::MockAuthRepository;

    fn svc() -> AuthService<MockAuthRepository> {
        AuthService::new(Arc::new(MockAuthRepository::default()), AuthConfig::with_secret("unit-secret"))
    }

    fn register_input(email: &str, password: &str) -> RegisterInput {
        RegisterInput { email: email.into(), name: "Name".into(), username: None, password: password.into() }
    }

    #[tokio::test]
    async fn short_password_is_rejected() {
        let err = svc().register(register_input("a@b.com", "short")).await.unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
        assert_eq!(err.code(), 1001);
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let svc = svc();
        svc.register(register_input("a@b.com", "Passw0rd!")).await.unwrap();
        let err = svc.login(LoginInput { email: "a@b.com".into(), password: "nope-nope".into() }).await.unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized));
    }

    #[tokio::test]
    async fn issued_token_resolves_to_user() {
        let svc = svc();
        let user = svc.register(register_input("t@b.com", "Passw0rd!")).await.unwrap();
        let session = svc.login(LoginInput { email: "t@b.com".into(), password: "Passw0rd!".into() }).await.unwrap();
        let resolved = svc.resolve_token(session.token.as_deref().unwrap()).await.unwrap();
        assert_eq!(resolved, user);
    }

    #[tokio::test]
    async fn foreign_or_expired_tokens_are_rejected() {
        let svc = svc();
        let user = svc.register(register_input("x@b.com", "Passw0rd!")).await.unwrap();

        let claims = Claims { sub: user.email.clone(), uid: user.id.to_string(), exp: 4_102_444_800 };
        let foreign = encode(&JwtHeader::default(), &claims, &EncodingKey::from_secret(b"other")).unwrap();
        assert!(matches!(svc.resolve_token(&foreign).await, Err(AuthError::Unauthorized)));

        let expired = Claims { exp: 1_000, ..claims };
        let expired = encode(&JwtHeader::default(), &expired, &EncodingKey::from_secret(b"unit-secret")).unwrap();
        assert!(matches!(svc.resolve_token(&expired).await, Err(AuthError::Unauthorized)));

        assert!(matches!(svc.resolve_token("garbage").await, Err(AuthError::Unauthorized)));
    }
}

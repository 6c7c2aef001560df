//! Registration, login and bearer token verification.

use crate::domain::users::{normalize_email, Claims, Principal, User, UserProfile};
use crate::error::{AuthError, RepositoryError};
use crate::ports::repository::UserRepository;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Longest accepted token lifetime (ten years).
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365 * 10;

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    jwt_secret: String,
    token_ttl: Duration,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, jwt_secret: impl Into<String>, ttl_hours: i64) -> Self {
        let clamped = ttl_hours.clamp(1, MAX_TOKEN_TTL_HOURS);
        if clamped != ttl_hours {
            warn!("Token lifetime of {} hours is out of range, using {}", ttl_hours, clamped);
        }
        Self {
            users,
            jwt_secret: jwt_secret.into(),
            token_ttl: Duration::hours(clamped),
        }
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<UserProfile, AuthError> {
        let name = name.trim();
        let email = normalize_email(email);
        if name.is_empty() || email.is_empty() || password.trim().is_empty() {
            return Err(AuthError::MissingFields);
        }
        if self.users.find_user_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || password_auth::generate_hash(password))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?;

        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            email,
            password_hash,
            videos: Vec::new(),
            created_at: Utc::now(),
        };
        match self.users.create_user(&user).await {
            Ok(()) => {}
            Err(RepositoryError::Conflict(_)) => return Err(AuthError::EmailTaken),
            Err(e) => return Err(e.into()),
        }

        info!(user_id = %user.id, "User registered");
        Ok(user.into())
    }

    /// Returns a signed token and the user's profile.
    pub async fn login(&self, email: &str, password: &str) -> Result<(String, UserProfile), AuthError> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }
        let user = self
            .users
            .find_user_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let candidate = password.to_string();
        let hash = user.password_hash.clone();
        let verified = tokio::task::spawn_blocking(move || {
            password_auth::verify_password(candidate, &hash).is_ok()
        })
        .await
        .map_err(|e| AuthError::Hashing(e.to_string()))?;
        if !verified {
            debug!(user_id = %user.id, "Password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.issue_token(&user)?;
        Ok((token, user.into()))
    }

    pub fn issue_token(&self, user: &User) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            iat: now.timestamp(),
            exp: now
                .checked_add_signed(self.token_ttl)
                .unwrap_or(now)
                .timestamp(),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|_| AuthError::InvalidToken)
    }

    pub fn verify(&self, token: &str) -> Result<Principal, AuthError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|e| {
            debug!("Rejected token: {}", e);
            AuthError::InvalidToken
        })?;
        Ok(Principal {
            user_id: data.claims.sub,
            email: data.claims.email,
        })
    }

    pub async fn profile(&self, user_id: &str) -> Result<UserProfile, AuthError> {
        Ok(self.users.find_user(user_id).await?.into())
    }
}

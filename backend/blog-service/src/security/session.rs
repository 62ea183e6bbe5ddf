/// Signed session cookies
///
/// The cookie value is an HS256 JWT carrying the user id and username.
/// Nothing is stored server side; logging out removes the cookie.
use crate::config::SessionConfig;
use crate::error::{AppError, Result};
use crate::models::User;
use actix_web::cookie::{time, Cookie, SameSite};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

const SESSION_ALGORITHM: Algorithm = Algorithm::HS256;

/// Session token claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    /// User id as a decimal string
    pub sub: String,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

/// The signed-in viewer, placed in request extensions by the session middleware
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: i64,
    pub username: String,
}

/// Keys and cookie settings for issuing and reading sessions
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    cookie_name: String,
    ttl_days: i64,
    secure: bool,
}

impl SessionKeys {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            cookie_name: config.cookie_name.clone(),
            ttl_days: config.ttl_days,
            secure: config.secure_cookie,
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Sign a session token for `user`
    pub fn issue(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::days(self.ttl_days)).timestamp(),
        };

        encode(&Header::new(SESSION_ALGORITHM), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign session: {}", e)))
    }

    /// Validate a token and return its viewer; any failure means "anonymous"
    pub fn validate(&self, token: &str) -> Option<SessionUser> {
        let mut validation = Validation::new(SESSION_ALGORITHM);
        validation.validate_exp = true;

        let data = match decode::<SessionClaims>(token, &self.decoding, &validation) {
            Ok(data) => data,
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring invalid session token");
                return None;
            }
        };

        let id = data.claims.sub.parse().ok()?;
        Some(SessionUser {
            id,
            username: data.claims.username,
        })
    }

    /// Cookie that starts a session for `user`
    pub fn login_cookie(&self, user: &User) -> Result<Cookie<'static>> {
        let token = self.issue(user)?;
        Ok(Cookie::build(self.cookie_name.clone(), token)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .max_age(time::Duration::days(self.ttl_days))
            .finish())
    }

    /// Cookie that ends the session
    pub fn logout_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build(self.cookie_name.clone(), "")
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .finish();
        cookie.make_removal();
        cookie
    }
}

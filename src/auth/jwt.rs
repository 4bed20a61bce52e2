use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use thiserror::Error;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::{
    claims::{Claims, TokenKind},
    dto::TokenPair,
};
use crate::{config::JwtConfig, state::AppState};

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("failed to sign token: {0}")]
    Sign(String),
    #[error("token expired")]
    Expired,
    #[error("invalid token: {0}")]
    Invalid(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            _ => Self::Invalid(e.to_string()),
        }
    }
}

#[derive(Clone)]
struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SigningKey {
    fn new(secret: &str, ttl_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::from_secs((ttl_minutes.max(0) as u64).saturating_mul(60)),
        }
    }
}

/// Access and refresh signing keys. Each kind has its own secret and lifetime.
#[derive(Clone)]
pub struct JwtKeys {
    access: SigningKey,
    refresh: SigningKey,
}

impl From<&JwtConfig> for JwtKeys {
    fn from(cfg: &JwtConfig) -> Self {
        Self {
            access: SigningKey::new(&cfg.access_secret, cfg.access_ttl_minutes),
            refresh: SigningKey::new(&cfg.refresh_secret, cfg.refresh_ttl_minutes),
        }
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.keys.clone()
    }
}

impl JwtKeys {
    fn key(&self, kind: TokenKind) -> &SigningKey {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    pub(crate) fn sign_with_kind(
        &self,
        user_id: Uuid,
        kind: TokenKind,
        now: OffsetDateTime,
    ) -> Result<String, TokenError> {
        let key = self.key(kind);
        let exp = i64::try_from(key.ttl.as_secs())
            .ok()
            .and_then(|secs| now.checked_add(TimeDuration::seconds(secs)))
            .ok_or_else(|| TokenError::Sign(format!("{kind:?} token lifetime is out of range")))?;
        let claims = Claims {
            authorized: true,
            user_id,
            id: Uuid::new_v4(),
            exp: usize::try_from(exp.unix_timestamp()).unwrap_or(0),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &key.encoding)
            .map_err(|e| TokenError::Sign(e.to_string()))?;
        debug!(user_id = %user_id, kind = ?kind, "jwt signed");
        Ok(token)
    }

    /// Mint a fresh access/refresh pair for `user_id`.
    pub fn issue_pair(&self, user_id: Uuid) -> Result<TokenPair, TokenError> {
        let now = OffsetDateTime::now_utc();
        Ok(TokenPair {
            access_token: self.sign_with_kind(user_id, TokenKind::Access, now)?,
            refresh_token: self.sign_with_kind(user_id, TokenKind::Refresh, now)?,
        })
    }

    fn verify(&self, token: &str, kind: TokenKind) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let data = decode::<Claims>(token, &self.key(kind).decoding, &validation)?;
        if !data.claims.authorized {
            return Err(TokenError::Invalid("token is not authorized".into()));
        }
        debug!(user_id = %data.claims.user_id, kind = ?kind, "jwt verified");
        Ok(data.claims)
    }

    pub fn verify_access(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify(token, TokenKind::Access)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify(token, TokenKind::Refresh)
    }
}

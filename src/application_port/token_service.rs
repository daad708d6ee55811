use crate::domain_model::*;
use crate::domain_port::StoreError;
use chrono::{DateTime, Utc};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token invalid")]
    InvalidToken,
    #[error("feature disabled: {0}")]
    FeatureDisabled(&'static str),
    #[error("refresh token store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("token encoding failed: {0}")]
    Encoding(String),
}

impl From<StoreError> for TokenError {
    fn from(error: StoreError) -> Self {
        TokenError::StoreUnavailable(error.to_string())
    }
}

/// Stateless signing and parsing of bearer tokens.
pub trait TokenCodec: Send + Sync {
    fn mint(
        &self,
        subject: &str,
        claims: &Claims,
        ttl: Duration,
        token_id: Option<TokenId>,
    ) -> Result<String, TokenError>;

    /// Checks signature and structure only; an expired token still parses.
    fn parse(&self, token: &str) -> Result<TokenClaims, TokenError>;
}

#[async_trait::async_trait]
pub trait TokenService: Send + Sync {
    fn issue_access_token(&self, subject: &str, claims: &Claims) -> Result<String, TokenError>;

    async fn issue_refresh_token(&self, subject: &str) -> Result<String, TokenError>;

    async fn issue_token_pair(&self, subject: &str, claims: &Claims)
    -> Result<TokenPair, TokenError>;

    /// `Ok(false)` for bad or expired tokens; `Err` only when the answer is unknown.
    async fn validate(&self, token: &str) -> Result<bool, TokenError>;

    /// `Ok(None)` means the caller has to authenticate again.
    async fn refresh(&self, refresh_token: &str) -> Result<Option<TokenPair>, TokenError>;

    fn parse(&self, token: &str) -> Result<TokenClaims, TokenError>;

    fn extract_subject(&self, token: &str) -> Option<String> {
        self.parse(token).ok().map(|c| c.subject)
    }

    fn extract_claims(&self, token: &str) -> Option<Claims> {
        self.parse(token).ok().map(|c| c.claims)
    }

    fn extract_expiration(&self, token: &str) -> Option<DateTime<Utc>> {
        self.parse(token).ok().map(|c| c.expires_at)
    }

    /// Unparseable tokens count as expired.
    fn is_token_expired(&self, token: &str) -> bool {
        self.parse(token).map(|c| c.is_expired()).unwrap_or(true)
    }
}

use crate::application_port::*;
use crate::domain_model::*;
use chrono::{Duration, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};

const ACCESS_PREFIX: &str = "fake-access-token:";
const REFRESH_PREFIX: &str = "fake-refresh-token:";
const OUTAGE_TOKEN: &str = "fake-store-outage";

/// Token service stand-in for exercising callers without keys or stores.
///
/// `fake-access-token:<subject>` is valid and carries the `USER` role,
/// `fake-store-outage` behaves like an unreachable store, and every other
/// string is invalid.
#[derive(Debug, Default)]
pub struct FakeTokenService {
    validations: AtomicUsize,
}

impl FakeTokenService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validation_count(&self) -> usize {
        self.validations.load(Ordering::SeqCst)
    }
}

// Minimal fake implementation for basic use only.
#[async_trait::async_trait]
impl TokenService for FakeTokenService {
    fn issue_access_token(&self, subject: &str, _claims: &Claims) -> Result<String, TokenError> {
        Ok(format!("{ACCESS_PREFIX}{subject}"))
    }

    async fn issue_refresh_token(&self, subject: &str) -> Result<String, TokenError> {
        Ok(format!("{REFRESH_PREFIX}{subject}"))
    }

    async fn issue_token_pair(
        &self,
        subject: &str,
        claims: &Claims,
    ) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.issue_access_token(subject, claims)?,
            refresh_token: Some(self.issue_refresh_token(subject).await?),
        })
    }

    async fn validate(&self, token: &str) -> Result<bool, TokenError> {
        self.validations.fetch_add(1, Ordering::SeqCst);
        if token == OUTAGE_TOKEN {
            return Err(TokenError::StoreUnavailable("fake outage".to_string()));
        }
        Ok(self.parse(token).is_ok())
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Option<TokenPair>, TokenError> {
        match refresh_token.strip_prefix(REFRESH_PREFIX) {
            Some(subject) => Ok(Some(TokenPair {
                access_token: format!("{ACCESS_PREFIX}{subject}"),
                refresh_token: Some(refresh_token.to_string()),
            })),
            None => Ok(None),
        }
    }

    fn parse(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let subject = token
            .strip_prefix(ACCESS_PREFIX)
            .filter(|s| !s.is_empty())
            .ok_or(TokenError::InvalidToken)?;

        let mut claims = Claims::new();
        claims.insert("roles".to_string(), serde_json::json!(["USER"]));
        let now = Utc::now();

        Ok(TokenClaims {
            subject: subject.to_string(),
            claims,
            issued_at: now,
            expires_at: now + Duration::hours(1),
            token_id: None,
        })
    }
}

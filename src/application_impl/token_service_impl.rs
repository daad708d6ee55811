use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct TokenServiceConfig {
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub refresh_enabled: bool,
    pub rotation_enabled: bool,
    pub refresh_mode: RefreshTokenMode,
    pub reuse_handling: ReuseHandling,
}

impl Default for TokenServiceConfig {
    fn default() -> Self {
        TokenServiceConfig {
            access_ttl: Duration::from_secs(60 * 60),       // 1 hour
            refresh_ttl: Duration::from_secs(24 * 60 * 60), // 1 day
            refresh_enabled: true,
            rotation_enabled: false,
            refresh_mode: RefreshTokenMode::SimpleValidation,
            reuse_handling: ReuseHandling::Remove,
        }
    }
}

pub struct RealTokenService {
    codec: Arc<dyn TokenCodec>,
    store: Arc<dyn RefreshTokenStore>,
    config: TokenServiceConfig,
}

impl RealTokenService {
    pub fn new(
        codec: Arc<dyn TokenCodec>,
        store: Arc<dyn RefreshTokenStore>,
        config: TokenServiceConfig,
    ) -> Self {
        Self {
            codec,
            store,
            config,
        }
    }

    pub fn config(&self) -> &TokenServiceConfig {
        &self.config
    }

    #[inline]
    fn tracks_refresh_tokens(&self) -> bool {
        self.config.refresh_enabled
            && self.config.refresh_mode == RefreshTokenMode::StoreAndValidate
    }

    fn ensure_refresh_enabled(&self) -> Result<(), TokenError> {
        if self.config.refresh_enabled {
            Ok(())
        } else {
            Err(TokenError::FeatureDisabled("refresh tokens"))
        }
    }

    /// Parse a presented refresh token; anything unusable yields `None`.
    fn usable_refresh_claims(&self, refresh_token: &str) -> Option<(TokenClaims, TokenId)> {
        let claims = match self.codec.parse(refresh_token) {
            Ok(claims) => claims,
            Err(e) => {
                debug!(error = %e, "refresh token rejected");
                return None;
            }
        };
        let Some(token_id) = claims.token_id else {
            debug!(subject = %claims.subject, "access token presented as refresh token");
            return None;
        };
        if claims.is_expired() {
            debug!(%token_id, "refresh token expired");
            return None;
        }
        Some((claims, token_id))
    }

    /// Rotation retires the presented token and checks it in the same store
    /// call, so concurrent refreshes with one token cannot both succeed.
    async fn accept_presented(&self, token_id: &TokenId) -> Result<bool, StoreError> {
        if self.config.rotation_enabled {
            self.store.consume(token_id, self.config.reuse_handling).await
        } else {
            self.store.is_valid(token_id).await
        }
    }

    async fn report_rejected(&self, claims: &TokenClaims, token_id: &TokenId) -> Result<(), StoreError> {
        if self.config.reuse_handling != ReuseHandling::Blacklist {
            debug!(%token_id, "refresh token not found in store");
            return Ok(());
        }
        match self.store.state(token_id).await? {
            // Extension point: account-wide revocation hangs off this signal.
            RefreshTokenState::Blacklisted => warn!(
                subject = %claims.subject,
                %token_id,
                "rotated refresh token presented again, possible token theft"
            ),
            state => debug!(%token_id, ?state, "refresh token rejected by store"),
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl TokenService for RealTokenService {
    fn issue_access_token(&self, subject: &str, claims: &Claims) -> Result<String, TokenError> {
        self.codec.mint(subject, claims, self.config.access_ttl, None)
    }

    async fn issue_refresh_token(&self, subject: &str) -> Result<String, TokenError> {
        self.ensure_refresh_enabled()?;

        let token_id = TokenId::new_v4();
        let token = self
            .codec
            .mint(subject, &Claims::new(), self.config.refresh_ttl, Some(token_id))?;

        if self.tracks_refresh_tokens() {
            let claims = self.codec.parse(&token)?;
            self.store
                .store(&token_id, subject, claims.expires_at)
                .await?;
        }

        Ok(token)
    }

    async fn issue_token_pair(
        &self,
        subject: &str,
        claims: &Claims,
    ) -> Result<TokenPair, TokenError> {
        let access_token = self.issue_access_token(subject, claims)?;
        let refresh_token = if self.config.refresh_enabled {
            Some(self.issue_refresh_token(subject).await?)
        } else {
            None
        };

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    async fn validate(&self, token: &str) -> Result<bool, TokenError> {
        let claims = match self.codec.parse(token) {
            Ok(claims) => claims,
            Err(e) => {
                debug!(error = %e, "token validation failed");
                return Ok(false);
            }
        };
        if claims.is_expired() {
            debug!(subject = %claims.subject, "token expired");
            return Ok(false);
        }

        match claims.token_id {
            Some(token_id) if self.tracks_refresh_tokens() => {
                Ok(self.store.is_valid(&token_id).await?)
            }
            _ => Ok(true),
        }
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Option<TokenPair>, TokenError> {
        self.ensure_refresh_enabled()?;

        let Some((claims, token_id)) = self.usable_refresh_claims(refresh_token) else {
            return Ok(None);
        };

        if self.tracks_refresh_tokens() && !self.accept_presented(&token_id).await? {
            self.report_rejected(&claims, &token_id).await?;
            return Ok(None);
        }

        let access_token = self.issue_access_token(&claims.subject, &Claims::new())?;
        let refresh_token = if self.config.rotation_enabled {
            self.issue_refresh_token(&claims.subject).await?
        } else {
            refresh_token.to_string()
        };

        Ok(Some(TokenPair {
            access_token,
            refresh_token: Some(refresh_token),
        }))
    }

    fn parse(&self, token: &str) -> Result<TokenClaims, TokenError> {
        self.codec.parse(token)
    }
}

use crate::domain_model::*;
use chrono::{DateTime, Utc};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store serialization error: {0}")]
    Serialization(String),
}

/// Persistence of refresh-token records.
///
/// "Not found" is never an error: unknown ids are simply invalid. Only faults
/// of the underlying store are reported through [`StoreError`].
#[async_trait::async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Upsert a record. Overwriting an id clears its blacklist flag.
    async fn store(
        &self,
        token_id: &TokenId,
        subject: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// True iff the record exists, is not blacklisted and has not expired.
    async fn is_valid(&self, token_id: &TokenId) -> Result<bool, StoreError>;

    async fn remove(&self, token_id: &TokenId) -> Result<(), StoreError>;

    /// Mark a record unusable but keep it until it expires. No-op if absent.
    async fn blacklist(&self, token_id: &TokenId) -> Result<(), StoreError>;

    /// Retire a valid record in one atomic step, removing or blacklisting it
    /// according to `handling`. Returns false if the record was absent,
    /// blacklisted or expired, i.e. someone else already used it.
    async fn consume(&self, token_id: &TokenId, handling: ReuseHandling) -> Result<bool, StoreError>;

    /// Drop expired records, returning how many were removed.
    async fn cleanup(&self) -> Result<u64, StoreError>;

    async fn lookup(&self, token_id: &TokenId) -> Result<Option<RefreshTokenRecord>, StoreError>;

    async fn state(&self, token_id: &TokenId) -> Result<RefreshTokenState, StoreError> {
        let record = self.lookup(token_id).await?;
        Ok(RefreshTokenState::of(record.as_ref(), Utc::now()))
    }
}

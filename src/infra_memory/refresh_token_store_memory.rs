use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

/// Process-local store. Records do not survive a restart, which only forces
/// holders of refresh tokens to authenticate again.
#[derive(Debug, Default)]
pub struct InMemoryRefreshTokenStore {
    records: DashMap<TokenId, RefreshTokenRecord>,
}

impl InMemoryRefreshTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait::async_trait]
impl RefreshTokenStore for InMemoryRefreshTokenStore {
    async fn store(
        &self,
        token_id: &TokenId,
        subject: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.records.insert(
            *token_id,
            RefreshTokenRecord::new(*token_id, subject, expires_at),
        );
        Ok(())
    }

    async fn is_valid(&self, token_id: &TokenId) -> Result<bool, StoreError> {
        let now = Utc::now();
        Ok(self
            .records
            .get(token_id)
            .is_some_and(|record| record.is_valid_at(now)))
    }

    async fn remove(&self, token_id: &TokenId) -> Result<(), StoreError> {
        self.records.remove(token_id);
        Ok(())
    }

    async fn blacklist(&self, token_id: &TokenId) -> Result<(), StoreError> {
        // get_mut holds the shard lock, so the flag flip cannot race a store().
        if let Some(mut record) = self.records.get_mut(token_id) {
            record.blacklisted = true;
        }
        Ok(())
    }

    async fn consume(&self, token_id: &TokenId, handling: ReuseHandling) -> Result<bool, StoreError> {
        let now = Utc::now();
        let consumed = match handling {
            ReuseHandling::Remove => self
                .records
                .remove_if(token_id, |_, record| record.is_valid_at(now))
                .is_some(),
            ReuseHandling::Blacklist => match self.records.get_mut(token_id) {
                Some(mut record) if record.is_valid_at(now) => {
                    record.blacklisted = true;
                    true
                }
                _ => false,
            },
        };
        Ok(consumed)
    }

    async fn cleanup(&self) -> Result<u64, StoreError> {
        let now = Utc::now();
        let before = self.records.len();
        self.records.retain(|_, record| record.expires_at > now);
        Ok(before.saturating_sub(self.records.len()) as u64)
    }

    async fn lookup(&self, token_id: &TokenId) -> Result<Option<RefreshTokenRecord>, StoreError> {
        Ok(self.records.get(token_id).map(|record| record.value().clone()))
    }
}

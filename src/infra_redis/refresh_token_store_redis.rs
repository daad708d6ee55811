use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisError, Script};
use tracing::trace;

const BLACKLIST_SCRIPT: &str = include_str!("refresh_token_blacklist.lua");
const CONSUME_SCRIPT: &str = include_str!("refresh_token_consume.lua");
const BLACKLIST_MARKER: &str = "blacklisted";

/// Records live at `<prefix>:refresh:<id>`, blacklist markers at
/// `<prefix>:blacklist:<id>`. Both expire together with the token, so Redis
/// does the cleanup itself.
pub struct RedisRefreshTokenStore {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisRefreshTokenStore {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        RedisRefreshTokenStore {
            conn,
            prefix: prefix.into(),
        }
    }

    fn refresh_key(&self, token_id: &TokenId) -> String {
        namespaced_key(&self.prefix, "refresh", token_id)
    }

    fn blacklist_key(&self, token_id: &TokenId) -> String {
        namespaced_key(&self.prefix, "blacklist", token_id)
    }

    fn remaining_millis(expires_at: DateTime<Utc>) -> u64 {
        let millis = (expires_at - Utc::now()).num_milliseconds();
        if millis <= 0 { 0 } else { millis as u64 }
    }
}

fn namespaced_key(prefix: &str, kind: &str, token_id: &TokenId) -> String {
    if prefix.is_empty() {
        format!("{}:{}", kind, token_id)
    } else {
        format!("{}:{}:{}", prefix, kind, token_id)
    }
}

#[inline]
fn unavailable(e: RedisError) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

#[async_trait::async_trait]
impl RefreshTokenStore for RedisRefreshTokenStore {
    async fn store(
        &self,
        token_id: &TokenId,
        subject: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let key = self.refresh_key(token_id);
        let marker = self.blacklist_key(token_id);
        let mut conn = self.conn.clone();

        let ttl_ms = Self::remaining_millis(expires_at);
        if ttl_ms == 0 {
            // Already expired: the upsert leaves nothing valid behind.
            let _: () = conn.del(vec![key, marker]).await.map_err(unavailable)?;
            return Ok(());
        }

        let record = RefreshTokenRecord::new(*token_id, subject, expires_at);
        let value = serde_json::to_string(&record)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let _: () = redis::pipe()
            .atomic()
            .cmd("SET")
            .arg(&key)
            .arg(value)
            .arg("PX")
            .arg(ttl_ms)
            .ignore()
            .cmd("DEL")
            .arg(&marker)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(unavailable)?;

        Ok(())
    }

    async fn is_valid(&self, token_id: &TokenId) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let (present, blacklisted): (bool, bool) = redis::pipe()
            .atomic()
            .exists(self.refresh_key(token_id))
            .exists(self.blacklist_key(token_id))
            .query_async(&mut conn)
            .await
            .map_err(unavailable)?;

        Ok(present && !blacklisted)
    }

    async fn remove(&self, token_id: &TokenId) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .del(vec![self.refresh_key(token_id), self.blacklist_key(token_id)])
            .await
            .map_err(unavailable)?;
        Ok(())
    }

    async fn blacklist(&self, token_id: &TokenId) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let written: i64 = Script::new(BLACKLIST_SCRIPT)
            .key(self.refresh_key(token_id))
            .key(self.blacklist_key(token_id))
            .arg(BLACKLIST_MARKER)
            .invoke_async(&mut conn)
            .await
            .map_err(unavailable)?;

        if written == 0 {
            trace!(%token_id, "nothing to blacklist");
        }
        Ok(())
    }

    async fn consume(&self, token_id: &TokenId, handling: ReuseHandling) -> Result<bool, StoreError> {
        let mode = match handling {
            ReuseHandling::Remove => "remove",
            ReuseHandling::Blacklist => "blacklist",
        };
        let mut conn = self.conn.clone();
        let consumed: i64 = Script::new(CONSUME_SCRIPT)
            .key(self.refresh_key(token_id))
            .key(self.blacklist_key(token_id))
            .arg(mode)
            .arg(BLACKLIST_MARKER)
            .invoke_async(&mut conn)
            .await
            .map_err(unavailable)?;

        Ok(consumed == 1)
    }

    async fn cleanup(&self) -> Result<u64, StoreError> {
        trace!("redis expires refresh tokens by TTL, nothing to sweep");
        Ok(0)
    }

    async fn lookup(&self, token_id: &TokenId) -> Result<Option<RefreshTokenRecord>, StoreError> {
        let mut conn = self.conn.clone();
        let (value, blacklisted): (Option<String>, bool) = redis::pipe()
            .atomic()
            .get(self.refresh_key(token_id))
            .exists(self.blacklist_key(token_id))
            .query_async(&mut conn)
            .await
            .map_err(unavailable)?;

        let Some(value) = value else {
            return Ok(None);
        };
        let mut record: RefreshTokenRecord = serde_json::from_str(&value)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        record.blacklisted = blacklisted;

        Ok(Some(record))
    }
}

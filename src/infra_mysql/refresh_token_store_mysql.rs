use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

const SCHEMA: &str = include_str!("refresh_tokens.sql");

pub struct MySqlRefreshTokenStore {
    pool: MySqlPool,
}

impl MySqlRefreshTokenStore {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlRefreshTokenStore { pool }
    }

    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;
        Ok(())
    }

    fn row_to_record(row: MySqlRow) -> Result<RefreshTokenRecord, StoreError> {
        let token_id: String = row.try_get("token_id").map_err(malformed)?;
        let token_id = token_id
            .parse::<TokenId>()
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let subject: String = row.try_get("subject").map_err(malformed)?;
        let expires_at: DateTime<Utc> = row.try_get("expires_at").map_err(malformed)?;
        let blacklisted: bool = row.try_get("blacklisted").map_err(malformed)?;

        Ok(RefreshTokenRecord {
            token_id,
            subject,
            expires_at,
            blacklisted,
        })
    }
}

#[inline]
fn unavailable(e: sqlx::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

#[inline]
fn malformed(e: sqlx::Error) -> StoreError {
    StoreError::Serialization(e.to_string())
}

#[async_trait::async_trait]
impl RefreshTokenStore for MySqlRefreshTokenStore {
    async fn store(
        &self,
        token_id: &TokenId,
        subject: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
INSERT INTO refresh_tokens (token_id, subject, expires_at, blacklisted)
VALUES (?, ?, ?, FALSE)
ON DUPLICATE KEY UPDATE
    subject = VALUES(subject),
    expires_at = VALUES(expires_at),
    blacklisted = FALSE
"#,
        )
        .bind(token_id.to_string())
        .bind(subject)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(())
    }

    async fn is_valid(&self, token_id: &TokenId) -> Result<bool, StoreError> {
        // One conditional query, no read-then-check.
        let valid: i64 = sqlx::query_scalar(
            r#"
SELECT EXISTS (
    SELECT 1 FROM refresh_tokens
    WHERE token_id = ? AND blacklisted = FALSE AND expires_at > ?
)
"#,
        )
        .bind(token_id.to_string())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(valid != 0)
    }

    async fn remove(&self, token_id: &TokenId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM refresh_tokens WHERE token_id = ?")
            .bind(token_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;
        Ok(())
    }

    async fn blacklist(&self, token_id: &TokenId) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(unavailable)?;

        sqlx::query("UPDATE refresh_tokens SET blacklisted = TRUE WHERE token_id = ?")
            .bind(token_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(unavailable)?;

        tx.commit().await.map_err(unavailable)?;
        Ok(())
    }

    async fn consume(&self, token_id: &TokenId, handling: ReuseHandling) -> Result<bool, StoreError> {
        // The validity check lives in the WHERE clause, so only one caller can match.
        let statement = match handling {
            ReuseHandling::Remove => {
                "DELETE FROM refresh_tokens WHERE token_id = ? AND blacklisted = FALSE AND expires_at > ?"
            }
            ReuseHandling::Blacklist => {
                "UPDATE refresh_tokens SET blacklisted = TRUE WHERE token_id = ? AND blacklisted = FALSE AND expires_at > ?"
            }
        };

        let result = sqlx::query(statement)
            .bind(token_id.to_string())
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;

        Ok(result.rows_affected() == 1)
    }

    async fn cleanup(&self) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await.map_err(unavailable)?;

        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at <= ?")
            .bind(Utc::now())
            .execute(&mut *tx)
            .await
            .map_err(unavailable)?;

        tx.commit().await.map_err(unavailable)?;
        Ok(result.rows_affected())
    }

    async fn lookup(&self, token_id: &TokenId) -> Result<Option<RefreshTokenRecord>, StoreError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT token_id, subject, expires_at, blacklisted
FROM refresh_tokens
WHERE token_id = ?
"#,
        )
        .bind(token_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        row_opt.map(Self::row_to_record).transpose()
    }
}

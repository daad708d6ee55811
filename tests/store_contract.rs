//! Behaviour every refresh token backend must share.
//!
//! The MySQL and Redis cases need a live server:
//!
//! $ TOKENGATE_TEST_MYSQL_DSN=mysql://user:pw@127.0.0.1:3306/tokengate_test \
//!   TOKENGATE_TEST_REDIS_DSN=redis://127.0.0.1:6379 \
//!   cargo test --test store_contract -- --ignored

use chrono::{Duration, Utc};
use redis::aio::ConnectionManager;
use sqlx::MySqlPool;
use std::sync::Arc;
use tokengate::domain_model::*;
use tokengate::domain_port::*;
use tokengate::infra_memory::InMemoryRefreshTokenStore;
use tokengate::infra_mysql::MySqlRefreshTokenStore;
use tokengate::infra_redis::RedisRefreshTokenStore;

async fn store_contract(store: Arc<dyn RefreshTokenStore>) {
    let now = Utc::now();
    let live = TokenId::new_v4();
    let stale = TokenId::new_v4();
    let unknown = TokenId::new_v4();

    // store -> valid
    store.store(&live, "alice", now + Duration::minutes(5)).await.unwrap();
    assert!(store.is_valid(&live).await.unwrap());
    assert_eq!(store.state(&live).await.unwrap(), RefreshTokenState::Active);
    let record = store.lookup(&live).await.unwrap().unwrap();
    assert_eq!(record.subject, "alice");
    assert!(!record.blacklisted);

    // unknown ids are invalid, not errors
    assert!(!store.is_valid(&unknown).await.unwrap());
    assert_eq!(store.state(&unknown).await.unwrap(), RefreshTokenState::Absent);
    store.remove(&unknown).await.unwrap();
    store.blacklist(&unknown).await.unwrap();
    assert!(store.lookup(&unknown).await.unwrap().is_none());

    // blacklist -> invalid while the record stays
    store.blacklist(&live).await.unwrap();
    assert!(!store.is_valid(&live).await.unwrap());
    assert_eq!(store.state(&live).await.unwrap(), RefreshTokenState::Blacklisted);
    assert!(store.lookup(&live).await.unwrap().unwrap().blacklisted);

    // overwrite clears the blacklist flag
    store.store(&live, "alice", now + Duration::minutes(5)).await.unwrap();
    assert!(store.is_valid(&live).await.unwrap());

    // remove -> invalid and gone
    store.remove(&live).await.unwrap();
    assert!(!store.is_valid(&live).await.unwrap());
    assert!(store.lookup(&live).await.unwrap().is_none());

    // consume retires a valid record exactly once
    let removed = TokenId::new_v4();
    let flagged = TokenId::new_v4();
    store.store(&removed, "carol", now + Duration::minutes(5)).await.unwrap();
    store.store(&flagged, "dave", now + Duration::minutes(5)).await.unwrap();
    assert!(store.consume(&removed, ReuseHandling::Remove).await.unwrap());
    assert!(!store.consume(&removed, ReuseHandling::Remove).await.unwrap());
    assert!(store.lookup(&removed).await.unwrap().is_none());
    assert!(store.consume(&flagged, ReuseHandling::Blacklist).await.unwrap());
    assert!(!store.consume(&flagged, ReuseHandling::Blacklist).await.unwrap());
    assert!(!store.consume(&flagged, ReuseHandling::Remove).await.unwrap());
    assert_eq!(store.state(&flagged).await.unwrap(), RefreshTokenState::Blacklisted);
    assert!(!store.consume(&unknown, ReuseHandling::Remove).await.unwrap());
    assert!(!store.consume(&unknown, ReuseHandling::Blacklist).await.unwrap());

    // expired records are never valid, and cleanup is idempotent
    store.store(&stale, "bob", now - Duration::seconds(1)).await.unwrap();
    assert!(!store.is_valid(&stale).await.unwrap());
    store.cleanup().await.unwrap();
    assert_eq!(store.cleanup().await.unwrap(), 0);
    assert!(!store.is_valid(&stale).await.unwrap());
    assert_ne!(store.state(&stale).await.unwrap(), RefreshTokenState::Active);
    assert!(!store.consume(&stale, ReuseHandling::Remove).await.unwrap());
    assert!(!store.consume(&stale, ReuseHandling::Blacklist).await.unwrap());
}

#[tokio::test]
async fn in_memory_store_contract() {
    store_contract(Arc::new(InMemoryRefreshTokenStore::new())).await;
}

#[tokio::test]
#[ignore = "needs TOKENGATE_TEST_MYSQL_DSN"]
async fn mysql_store_contract() {
    let dsn = std::env::var("TOKENGATE_TEST_MYSQL_DSN").unwrap();
    let store = MySqlRefreshTokenStore::new(MySqlPool::connect(&dsn).await.unwrap());
    store.ensure_schema().await.unwrap();
    store_contract(Arc::new(store)).await;
}

#[tokio::test]
#[ignore = "needs TOKENGATE_TEST_REDIS_DSN"]
async fn redis_store_contract() {
    let dsn = std::env::var("TOKENGATE_TEST_REDIS_DSN").unwrap();
    let manager = redis::Client::open(dsn)
        .unwrap()
        .get_connection_manager()
        .await
        .unwrap();
    let prefix = format!("tokengate-test-{}", TokenId::new_v4());
    store_contract(Arc::new(RedisRefreshTokenStore::new(manager, prefix))).await;
}

async fn pttl(conn: &mut ConnectionManager, key: &str) -> i64 {
    redis::cmd("PTTL").arg(key).query_async(conn).await.unwrap()
}

#[tokio::test]
#[ignore = "needs TOKENGATE_TEST_REDIS_DSN"]
async fn redis_blacklist_marker_shares_the_record_ttl() {
    let dsn = std::env::var("TOKENGATE_TEST_REDIS_DSN").unwrap();
    let mut conn = redis::Client::open(dsn)
        .unwrap()
        .get_connection_manager()
        .await
        .unwrap();
    let prefix = format!("tokengate-test-{}", TokenId::new_v4());
    let store = RedisRefreshTokenStore::new(conn.clone(), prefix.clone());

    // live record: the marker expires together with the record
    let live = TokenId::new_v4();
    store.store(&live, "alice", Utc::now() + Duration::seconds(60)).await.unwrap();
    store.blacklist(&live).await.unwrap();

    let record_ttl = pttl(&mut conn, &format!("{prefix}:refresh:{live}")).await;
    let marker_ttl = pttl(&mut conn, &format!("{prefix}:blacklist:{live}")).await;
    assert!(record_ttl > 0 && record_ttl <= 60_000, "record ttl {record_ttl}");
    assert!(marker_ttl > 0, "marker ttl {marker_ttl}");
    assert!((record_ttl - marker_ttl).abs() < 1_000, "{record_ttl} vs {marker_ttl}");

    // elapsed record: blacklisting writes nothing
    let elapsed = TokenId::new_v4();
    store.store(&elapsed, "bob", Utc::now() - Duration::seconds(1)).await.unwrap();
    store.blacklist(&elapsed).await.unwrap();
    assert_eq!(pttl(&mut conn, &format!("{prefix}:refresh:{elapsed}")).await, -2);
    assert_eq!(pttl(&mut conn, &format!("{prefix}:blacklist:{elapsed}")).await, -2);

    // consume under the blacklist policy leaves a marker with the same ttl
    let rotated = TokenId::new_v4();
    store.store(&rotated, "carol", Utc::now() + Duration::seconds(60)).await.unwrap();
    assert!(store.consume(&rotated, ReuseHandling::Blacklist).await.unwrap());
    let record_ttl = pttl(&mut conn, &format!("{prefix}:refresh:{rotated}")).await;
    let marker_ttl = pttl(&mut conn, &format!("{prefix}:blacklist:{rotated}")).await;
    assert!(marker_ttl > 0 && (record_ttl - marker_ttl).abs() < 1_000);

    store.remove(&live).await.unwrap();
    store.remove(&rotated).await.unwrap();
}

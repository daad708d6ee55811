mod refresh_token_store_redis;

pub use refresh_token_store_redis::*;

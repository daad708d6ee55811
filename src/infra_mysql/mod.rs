mod refresh_token_store_mysql;

pub use refresh_token_store_mysql::*;

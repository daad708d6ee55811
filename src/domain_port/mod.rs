mod refresh_token_store;

pub use refresh_token_store::*;

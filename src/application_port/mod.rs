mod token_service;
mod user_resolver;

pub use token_service::*;
pub use user_resolver::*;

mod claims_profile_resolver;
mod jwt_codec;
mod token_service_fake;
mod token_service_impl;

pub use claims_profile_resolver::*;
pub use jwt_codec::*;
pub use token_service_fake::*;
pub use token_service_impl::*;

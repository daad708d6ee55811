mod policy;
mod principal;
mod refresh_token;
mod token;
mod user;

pub use policy::*;
pub use principal::*;
pub use refresh_token::*;
pub use token::*;
pub use user::*;

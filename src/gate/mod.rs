mod authentication_gate;
mod exemption;
mod filter;
mod path_pattern;

pub use authentication_gate::*;
pub use exemption::*;
pub use filter::*;
pub use path_pattern::*;

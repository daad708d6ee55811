//! Thin wrapper over `tracing-subscriber`; see `bin/logger_demo.rs` for a
//! binary that shows the bootstrap-then-reload sequence.

mod logger;
pub use logger::*;

pub use tracing::{debug, error, info, trace, warn};

mod cleanup_scheduler;
mod server;

pub use cleanup_scheduler::*;
pub use server::*;

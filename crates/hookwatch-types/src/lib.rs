//! Shared types for the hookwatch log monitor.

mod entry;
mod session;

pub use entry::*;
pub use session::*;

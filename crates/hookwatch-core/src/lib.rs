//! Discovery, live tailing, aggregation and rendering of hook event logs.

pub mod aggregator;
pub mod codec;
pub mod discovery;
mod error;
pub mod project;
pub mod render;
pub mod session_index;
pub mod tailer;

pub use aggregator::{Aggregator, EntrySink, MonitorOptions, Scope, StatusFilter};
pub use discovery::{LogKind, PrefixMatch};
pub use error::HookwatchError;
pub use render::RenderOptions;
pub use tailer::{LiveTailer, TailEvent, TailHandle, TailState};

/// Result type for hookwatch operations.
pub type Result<T> = std::result::Result<T, HookwatchError>;

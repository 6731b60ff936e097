/// Scan session aggregate
pub mod aggregate;

/// Commands
pub mod commands;

/// Events
pub mod events;

pub use aggregate::{ScanSession, ScanState, Services, AGGREGATE_TYPE, MAX_PROGRESS};
pub use commands::Command;
pub use events::Event;

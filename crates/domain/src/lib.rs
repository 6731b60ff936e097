//! Prescription Scanner Domain Models

/// Medication records and analysis payloads
pub mod medications;

/// Scan session aggregate
pub mod scans;

/// Domain errors
pub mod errors;

pub use errors::Error;

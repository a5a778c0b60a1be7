//! caretracker-core
//!
//! Pure domain types and calendar helpers. The shared vocabulary of the
//! CareTracker system; no HTTP and no storage here.

pub mod dates;
pub mod error;
pub mod models;

//! caretracker-storage
//!
//! In-memory repository of stations, patients and classifications, with
//! JSON snapshot persistence.

pub mod error;
pub mod locks;
pub mod state;
pub mod store;

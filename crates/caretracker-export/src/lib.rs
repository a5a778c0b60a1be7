//! caretracker-export
//!
//! Excel workbooks in both directions: analysis export and patient day
//! data import.

pub mod error;
pub mod import;
pub mod render;
pub mod styles;
pub mod xlsx;

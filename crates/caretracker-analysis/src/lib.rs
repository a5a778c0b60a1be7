//! caretracker-analysis
//!
//! Station-level summaries over already-scored patient-days: minutes per
//! day, month or quarter, and caregiver workload. Pure aggregation.

pub mod aggregate;
pub mod workload;

pub mod classification;
pub mod patient;
pub mod question;
pub mod station;
pub mod stay;
pub mod workload;

pub mod audit;
pub mod csrf;

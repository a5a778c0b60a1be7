use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("invalid {field} category {value}, expected 1 to 4")]
    InvalidCategory { field: &'static str, value: u8 },
}

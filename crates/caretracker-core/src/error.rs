use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid date '{input}', expected {expected}")]
    InvalidDate { input: String, expected: &'static str },

    #[error("invalid view mode: {0}. Use 'daily', 'monthly' or 'quarterly'")]
    InvalidViewMode(String),

    #[error("unknown care service option: {0}")]
    UnknownQuestion(i64),

    #[error("update must carry either a question selection or an isolation flag")]
    EmptyUpdate,
}

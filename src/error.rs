use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParameterError {
    #[error("failed to read rate source: {0}")]
    Source(String),

    #[error("malformed csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("rate sheet is missing required column `{0}`")]
    MissingColumn(&'static str),

    #[error("rate sheet row {row}: empty category")]
    EmptyCategory { row: usize },

    #[error("rate sheet row {row}: cannot parse `{value}` in column `{column}` as a number")]
    InvalidRate {
        row: usize,
        column: String,
        value: String,
    },

    #[error("rate sheet row {row}: negative rate `{value}` in column `{column}`")]
    NegativeRate {
        row: usize,
        column: String,
        value: String,
    },

    #[error("duplicate rate category `{0}`")]
    DuplicateCategory(String),

    #[error("rate sheet contains no categories")]
    Empty,
}

#[derive(Debug, Error)]
pub enum PricingError {
    #[error("invalid trip request: {0}")]
    InvalidRequest(String),

    #[error("unknown vehicle category `{0}`")]
    UnknownVehicle(String),
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to read template: {0}")]
    Source(String),

    #[error("empty placeholder at byte {0}")]
    EmptyPlaceholder(usize),

    #[error("unterminated placeholder at byte {0}")]
    UnterminatedPlaceholder(usize),

    #[error("template placeholder `{0}` does not match any quote field")]
    UnknownPlaceholder(String),
}

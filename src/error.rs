use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Please fill the following fields:\n\n{}", .0.join("\n"))]
    MissingFields(Vec<String>),

    #[error("{0}")]
    Backend(String),

    #[error("Unknown entity set: {0}")]
    UnknownEntitySet(String),

    #[error("No color assigned for category '{0}'")]
    MissingColor(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, ReportError>;

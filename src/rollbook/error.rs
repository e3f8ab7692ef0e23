use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecordsError {
    #[error("Student not found: {0}")]
    RecordNotFound(String),

    #[error("Roll number {0} is already taken")]
    DuplicateRollNo(u32),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Import error: {0}")]
    Import(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, RecordsError>;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Invalid analyzer configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown financial field: {0}")]
    UnknownField(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[cfg(feature = "gemini")]
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[cfg(feature = "gemini")]
    #[error("JSON patch error: {0}")]
    PatchError(#[from] json_patch::PatchError),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

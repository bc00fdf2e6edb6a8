use std::fmt;

#[derive(Debug)]
pub enum AnalysisError {
    IoError(String),
    DeserializationError(String),
    SerializationError(String),
    InvalidParameter(String),
    InsufficientData(String),
    NotFound(String),
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AnalysisError::IoError(msg) => write!(f, "IO error: {}", msg),
            AnalysisError::DeserializationError(msg) => {
                write!(f, "Deserialization error: {}", msg)
            }
            AnalysisError::SerializationError(msg) => {
                write!(f, "Serialization error: {}", msg)
            }
            AnalysisError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            AnalysisError::InsufficientData(msg) => write!(f, "Insufficient data: {}", msg),
            AnalysisError::NotFound(msg) => write!(f, "Not found: {}", msg),
        }
    }
}

impl std::error::Error for AnalysisError {}

impl From<serde_json::Error> for AnalysisError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() {
            AnalysisError::DeserializationError(err.to_string())
        } else {
            AnalysisError::SerializationError(err.to_string())
        }
    }
}

impl From<std::io::Error> for AnalysisError {
    fn from(err: std::io::Error) -> Self {
        AnalysisError::IoError(err.to_string())
    }
}

impl From<csv::Error> for AnalysisError {
    fn from(err: csv::Error) -> Self {
        AnalysisError::SerializationError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

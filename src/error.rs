use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatementError {
    #[error("{stage} collaborator not available")]
    CollaboratorUnavailable { stage: String },

    #[error("Data extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Dataset is empty")]
    EmptyDataset,

    #[error("No records could be normalized")]
    NoRecords,

    #[error("Statement rendering failed: {0}")]
    RenderFailed(String),

    #[error("Output generation failed: {0}")]
    OutputFailed(String),

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StatementError>;

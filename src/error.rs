use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("row {id} out of range (dataset has {len} rows)")]
    OutOfRange { id: usize, len: usize },

    #[error("annotator identity is required")]
    MissingIdentity,

    #[error("dataset source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("bad record at line {line}: {reason}")]
    BadRecord { line: usize, reason: String },

    #[error("export failed: {0}")]
    ExportFailed(String),

    #[error("workspace: {0}")]
    Workspace(String),
}

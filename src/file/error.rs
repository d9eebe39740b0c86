use thiserror::Error;

#[derive(Debug, Error)]
pub enum PageFileError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("File handle not initialized")]
    NotInitialized,

    #[error("Failed to create file: {0}")]
    CreateFailed(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Non-existing page: page_num={0}")]
    NonExistingPage(i64),

    #[error("Corrupt header: {0}")]
    CorruptHeader(String),

    #[error("Invalid page size: expected {expected}, got {actual}")]
    InvalidPageSize { expected: usize, actual: usize },
}

pub type PageFileResult<T> = Result<T, PageFileError>;

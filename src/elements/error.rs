use thiserror::Error;

#[derive(Debug, Error)]
pub enum ElementsError {
    #[error("No orbital elements found for satellite ({0})")]
    NotFound(u32),
    #[error("Element source request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Element source returned HTTP {0}")]
    Status(u16),
    #[error("Invalid TLE: {0}")]
    InvalidTle(String),
    #[error("TLE directory not found: {0}")]
    DirectoryNotFound(String),
    #[error("TLE file read error: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Element source timed out")]
    Timeout,
}

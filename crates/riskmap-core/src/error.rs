use thiserror::Error;

#[derive(Debug, Error)]
pub enum PortfolioError {
    #[error("portfolio file not found: {0}")]
    NotFound(std::path::PathBuf),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("duplicate location id: {0}")]
    DuplicateId(String),
}

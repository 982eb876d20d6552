use thiserror::Error;

#[derive(Debug, Error)]
pub enum StockServiceError {
    #[error("fetch failed: {0}")]
    FetchFailed(String),
    #[error("malformed archive: {0}")]
    MalformedArchive(String),
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("stock {0} not found")]
    NotFound(i64),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("an ingestion run is already in progress")]
    IngestInProgress,
}

impl From<reqwest::Error> for StockServiceError {
    fn from(err: reqwest::Error) -> Self {
        StockServiceError::FetchFailed(err.to_string())
    }
}

impl From<zip::result::ZipError> for StockServiceError {
    fn from(err: zip::result::ZipError) -> Self {
        StockServiceError::MalformedArchive(err.to_string())
    }
}

impl From<diesel::result::Error> for StockServiceError {
    fn from(err: diesel::result::Error) -> Self {
        StockServiceError::StoreUnavailable(err.to_string())
    }
}

impl From<diesel::r2d2::PoolError> for StockServiceError {
    fn from(err: diesel::r2d2::PoolError) -> Self {
        StockServiceError::StoreUnavailable(err.to_string())
    }
}

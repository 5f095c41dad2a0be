use thiserror::Error;

/// Failures reported by a price lookup collaborator.
#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Invalid price data: {0}")]
    InvalidData(String),
}

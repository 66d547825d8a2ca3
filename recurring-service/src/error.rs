use ops_core::error::AppError;
use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by the document-creation entry points.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Product {name} is out of stock")]
    StockExhausted { product_id: Uuid, name: String },

    #[error(transparent)]
    Store(#[from] AppError),
}

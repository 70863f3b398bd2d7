use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Storage layer errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database connection failed: {message}")]
    Connection { message: String },

    #[error("Query failed: {message}")]
    Query { message: String },

    #[error("Snapshot not found: {key}")]
    SnapshotNotFound { key: String },

    #[error("Migration failed: {message}")]
    Migration { message: String },

    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Catalog provider errors
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog unavailable: {message} (retries: {retries})")]
    Unavailable { message: String, retries: u32 },

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Payment gateway errors
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Checkout session failed: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Empty cart: nothing to check out")]
    EmptyCart,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Tool dispatch errors, surfaced back over the voice transport as error
/// responses rather than thrown into the session loop.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Unsupported command: {name}")]
    UnsupportedCommand { name: String },

    #[error("Invalid parameters for {command}: {message}")]
    InvalidParameters { command: String, message: String },

    #[error("Product not found: {query}")]
    ProductNotFound { query: String },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Result type alias for payment operations
pub type PaymentResult<T> = Result<T, PaymentError>;

/// Result type alias for tool dispatch
pub type DispatchResult<T> = Result<T, DispatchError>;

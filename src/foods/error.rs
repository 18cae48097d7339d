use thiserror::Error;

pub type FoodResult<T> = Result<T, FoodError>;

/// Failures surfaced by the food catalog.
///
/// "Nothing matched" is never an error: read paths return `Ok(None)` or an
/// empty page instead.
#[derive(Debug, Error)]
pub enum FoodError {
    /// Input rejected before reaching any datastore.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Write attempted without an actor.
    #[error("unauthorized")]
    Unauthorized,

    /// Custom food collides with an existing one (barcode is unique).
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Bulk dataset dump could not be read or parsed.
    #[error("dataset error: {0}")]
    Dataset(String),
}

impl FoodError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// True for errors produced locally from bad input, as opposed to upstream failures.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::Unauthorized | Self::Conflict(_)
        )
    }
}

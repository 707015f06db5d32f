//! Error taxonomy for session graph operations
//!
//! Store and client traits return `anyhow::Result`; the session layer
//! classifies their failures into one of these variants before handing
//! them to callers.

use thiserror::Error;

/// Result alias used by the session layer
pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Debug, Error)]
pub enum SessionError {
    /// A session, actor or address required by the operation does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// Input rejected before any I/O was issued
    #[error("invalid input: {0}")]
    Validation(String),

    /// Social API or holdings provider failure
    #[error("upstream request failed: {0:#}")]
    Upstream(anyhow::Error),

    /// Graph store failure; the unit of work was rolled back
    #[error("graph transaction failed: {0:#}")]
    Transaction(anyhow::Error),
}

impl SessionError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }
}

/// Reject empty or whitespace-only identifiers before any lookup.
pub(crate) fn require_non_empty(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SessionError::validation(format!("{} must not be empty", field)));
    }
    Ok(())
}

use thiserror::Error;

use crate::ItemId;

/// Errors surfaced by vault operations.
///
/// Metadata retrieval failures are deliberately absent: they degrade to an
/// empty or fallback result and are reported through
/// [`Enrichment`](crate::metadata::Enrichment) instead.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Lookup by ID matched no row.
    #[error("item {id} not found")]
    NotFound { id: ItemId },

    /// Required input was missing or blank; nothing was written.
    #[error("invalid input: {0}")]
    Validation(String),

    /// The backing store failed.
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),
}

impl VaultError {
    /// Returns `true` for errors caused by caller input rather than the
    /// environment.
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Validation(_))
    }
}

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, VaultError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_the_id() {
        let err = VaultError::NotFound { id: ItemId::new(9) };
        assert_eq!(err.to_string(), "item 9 not found");
        assert!(err.is_user_error());
    }

    #[test]
    fn store_errors_are_not_user_errors() {
        let err = VaultError::from(rusqlite::Error::QueryReturnedNoRows);
        assert!(!err.is_user_error());
        assert!(err.to_string().starts_with("store error"));
    }
}

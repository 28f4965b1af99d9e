use serde::{Deserialize, Serialize};

/// Provider-sourced enrichment for a link item.
///
/// Every field is independently optional. An all-`None` value means the
/// item is a note or that retrieval degraded to nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub author: Option<String>,
    pub site_name: Option<String>,
}

impl Metadata {
    /// Returns `true` when no field carries a value.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.thumbnail.is_none()
            && self.author.is_none()
            && self.site_name.is_none()
    }
}

/// Turns a provider string into an optional field, dropping blanks.
pub(crate) fn non_empty(value: impl Into<String>) -> Option<String> {
    let value = value.into();
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == value.len() {
        Some(value)
    } else {
        Some(trimmed.to_string())
    }
}

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::TagId;

/// Colour given to tags created without an explicit one.
pub const DEFAULT_TAG_COLOR: &str = "#8892b0";

/// A user-defined label.
///
/// The name is the business key: it is stored trimmed and lowercased, and
/// two names that differ only by case resolve to the same tag. The colour
/// is cosmetic and never affects identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    id: TagId,
    name: String,
    color: String,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
}

impl Tag {
    /// Creates a tag value.
    ///
    /// # Examples
    ///
    /// ```
    /// use vault::{Tag, TagId, DEFAULT_TAG_COLOR};
    /// use time::OffsetDateTime;
    ///
    /// let tag = Tag::new(TagId::new(1), "music", DEFAULT_TAG_COLOR, OffsetDateTime::UNIX_EPOCH);
    /// assert_eq!(tag.name(), "music");
    /// assert_eq!(tag.color(), "#8892b0");
    /// ```
    pub fn new(
        id: TagId,
        name: impl Into<String>,
        color: impl Into<String>,
        created_at: OffsetDateTime,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            color: color.into(),
            created_at,
        }
    }

    /// Returns the tag's unique identifier.
    pub fn id(&self) -> TagId {
        self.id
    }

    /// Returns the normalized tag name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the display colour.
    pub fn color(&self) -> &str {
        &self.color
    }

    /// Returns when the tag was first created.
    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }
}

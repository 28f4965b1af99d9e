use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{ContentKind, ItemId, Metadata, Tag};
use crate::utils::truncate_chars;

/// Length of the content fallback used by [`VaultItem::display_title`].
const DISPLAY_TITLE_CHARS: usize = 50;

/// A saved unit of content: a link enriched with provider metadata, or a
/// free-text note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultItem {
    /// Unique identifier from the database.
    pub id: ItemId,
    /// Classification assigned at ingestion. Never changes.
    pub kind: ContentKind,
    /// User-supplied display title; may be empty.
    pub title: String,
    /// The raw input: a URL or freeform text.
    pub content: String,
    /// Present only for link kinds, where it equals `content`.
    pub source_url: Option<String>,
    /// Provider enrichment; empty for notes.
    pub metadata: Metadata,
    pub pinned: bool,
    pub archived: bool,
    /// Attached tags, ordered by name.
    pub tags: Vec<Tag>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl VaultItem {
    /// Title to show in listings.
    ///
    /// Falls back from the user title to the metadata title and finally to
    /// the content truncated to 50 characters.
    pub fn display_title(&self) -> String {
        if !self.title.trim().is_empty() {
            return self.title.clone();
        }
        if let Some(title) = &self.metadata.title {
            return title.clone();
        }
        truncate_chars(&self.content, DISPLAY_TITLE_CHARS)
    }

    /// Names of the attached tags.
    pub fn tag_names(&self) -> Vec<&str> {
        self.tags.iter().map(Tag::name).collect()
    }
}

/// Input for creating a vault item.
///
/// Built by the ingestion pipeline after classification and metadata
/// retrieval; the store assigns ID and timestamps.
///
/// # Examples
///
/// ```
/// use vault::{ContentKind, Metadata, NewItem};
///
/// let note = NewItem::note("Remember to call Alex").pinned(true);
/// assert_eq!(note.kind, ContentKind::Note);
/// assert_eq!(note.title, "Remember to call Alex");
///
/// let link = NewItem::link(ContentKind::Article, "https://example.com", Metadata::default());
/// assert_eq!(link.source_url.as_deref(), Some("https://example.com"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub kind: ContentKind,
    pub title: String,
    pub content: String,
    pub source_url: Option<String>,
    pub metadata: Metadata,
    pub pinned: bool,
    pub archived: bool,
}

impl NewItem {
    /// A note whose title defaults to its content.
    pub fn note(content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            kind: ContentKind::Note,
            title: content.clone(),
            content,
            source_url: None,
            metadata: Metadata::default(),
            pinned: false,
            archived: false,
        }
    }

    /// A link item whose source URL is the raw content.
    pub fn link(kind: ContentKind, url: impl Into<String>, metadata: Metadata) -> Self {
        let url = url.into();
        Self {
            kind,
            title: String::new(),
            source_url: Some(url.clone()),
            content: url,
            metadata,
            pinned: false,
            archived: false,
        }
    }

    /// Sets the display title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the pinned flag.
    pub fn pinned(mut self, pinned: bool) -> Self {
        self.pinned = pinned;
        self
    }

    /// Sets the archived flag.
    pub fn archived(mut self, archived: bool) -> Self {
        self.archived = archived;
        self
    }
}

/// Full-field replacement of the mutable parts of an item.
///
/// Content kind and metadata are not part of an update.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ItemUpdate {
    pub title: String,
    pub content: String,
    pub pinned: bool,
    pub archived: bool,
}

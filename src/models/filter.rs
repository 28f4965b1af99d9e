use super::ContentKind;

/// Filtering and pagination for item listings.
///
/// All fields are optional with sensible defaults. When `archived` is
/// `None`, archived items are excluded.
///
/// # Examples
///
/// ```
/// use vault::{ContentKind, ItemFilter};
///
/// // Everything that is not archived
/// let all = ItemFilter::default();
///
/// // Pinned videos tagged music or live, ten at a time
/// let filter = ItemFilter {
///     kind: Some(ContentKind::YouTube),
///     tags: vec!["music".to_string(), "live".to_string()],
///     pinned: Some(true),
///     limit: 10,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFilter {
    /// Only items of this kind.
    pub kind: Option<ContentKind>,
    /// Items holding any of these tag names, case-insensitively.
    pub tags: Vec<String>,
    pub pinned: Option<bool>,
    /// `None` excludes archived items.
    pub archived: Option<bool>,
    /// Case-insensitive substring over title, content, metadata title and
    /// metadata description.
    pub search: Option<String>,
    /// Maximum rows to return; zero or negative means unbounded.
    pub limit: i64,
    /// Rows to skip from the ordered result.
    pub offset: i64,
}

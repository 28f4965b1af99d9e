//! Get-or-create tag resolution and item tag-set replacement.

use std::collections::HashSet;

use rusqlite::{Connection, OptionalExtension, Row};
use time::OffsetDateTime;
use tracing::warn;

use crate::db::timestamp_column;
use crate::{DEFAULT_TAG_COLOR, ItemId, Result, Tag, TagId, VaultError};

/// Normalizes a tag name: trimmed and lowercased.
///
/// # Examples
///
/// ```
/// use vault::tags::normalize_tag_name;
///
/// assert_eq!(normalize_tag_name("  Music "), "music");
/// assert_eq!(normalize_tag_name("Machine Learning"), "machine learning");
/// ```
#[must_use]
pub fn normalize_tag_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Normalizes a list of names, dropping blanks and duplicates.
///
/// Keeps the order of first occurrence.
///
/// # Examples
///
/// ```
/// use vault::tags::normalize_tag_names;
///
/// let names = normalize_tag_names(["ideas", " Ideas", "", "work"]);
/// assert_eq!(names, vec!["ideas", "work"]);
/// ```
#[must_use]
pub fn normalize_tag_names<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    names
        .into_iter()
        .map(|name| normalize_tag_name(name.as_ref()))
        .filter(|name| !name.is_empty() && seen.insert(name.clone()))
        .collect()
}

const TAG_COLUMNS: &str = "t.id, t.name, t.color, t.created_at";

fn tag_from_row(row: &Row<'_>) -> rusqlite::Result<Tag> {
    Ok(Tag::new(
        TagId::new(row.get(0)?),
        row.get::<_, String>(1)?,
        row.get::<_, String>(2)?,
        timestamp_column(row, 3)?,
    ))
}

/// Tag operations over a borrowed connection.
///
/// Obtained from [`VaultStore::tags`](crate::VaultStore::tags).
pub struct TagResolver<'a> {
    conn: &'a Connection,
}

impl<'a> TagResolver<'a> {
    /// Creates a resolver over `conn`.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Returns the tag for `name`, creating it with the default colour when
    /// no tag matches case-insensitively.
    pub fn get_or_create(&self, name: &str) -> Result<Tag> {
        self.get_or_create_with_color(name, None)
    }

    /// Like [`get_or_create`](Self::get_or_create), using `color` if the tag
    /// has to be created. An existing tag keeps its colour.
    pub fn get_or_create_with_color(&self, name: &str, color: Option<&str>) -> Result<Tag> {
        let normalized = normalize_tag_name(name);
        if normalized.is_empty() {
            return Err(VaultError::Validation("tag name cannot be empty".into()));
        }

        if let Some(tag) = self.find(&normalized)? {
            return Ok(tag);
        }

        let color = color
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_TAG_COLOR);
        let now = OffsetDateTime::now_utc().unix_timestamp();

        self.conn.execute(
            "INSERT INTO tags (name, color, created_at) VALUES (?1, ?2, ?3)",
            (&normalized, color, now),
        )?;

        let tag = self.conn.query_row(
            &format!("SELECT {TAG_COLUMNS} FROM tags t WHERE t.id = ?1"),
            [self.conn.last_insert_rowid()],
            tag_from_row,
        )?;
        Ok(tag)
    }

    /// Looks up a tag by name, case-insensitively.
    pub fn find(&self, name: &str) -> Result<Option<Tag>> {
        let normalized = normalize_tag_name(name);
        let tag = self
            .conn
            .query_row(
                &format!("SELECT {TAG_COLUMNS} FROM tags t WHERE t.name = ?1 COLLATE NOCASE"),
                [&normalized],
                tag_from_row,
            )
            .optional()?;
        Ok(tag)
    }

    /// Attaches an existing tag to an item. Linking twice is a no-op.
    pub fn link(&self, item_id: ItemId, tag_id: TagId) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO item_tags (item_id, tag_id) VALUES (?1, ?2)",
            (item_id.get(), tag_id.get()),
        )?;
        Ok(())
    }

    /// Get-or-creates and links each distinct non-blank name.
    ///
    /// Linking is at-most-effort per name: a failing name is logged and
    /// returned, the remaining names are still processed.
    pub fn attach_all<S: AsRef<str>>(&self, item_id: ItemId, names: &[S]) -> Vec<String> {
        let mut failed = Vec::new();
        for name in normalize_tag_names(names) {
            let result = self
                .get_or_create(&name)
                .and_then(|tag| self.link(item_id, tag.id()));
            if let Err(e) = result {
                warn!(item = %item_id, tag = %name, error = %e, "failed to attach tag");
                failed.push(name);
            }
        }
        failed
    }

    /// Replaces the item's tag set with `names`.
    ///
    /// Clears every existing association first, so names not in the new set
    /// are detached. Returns the names that failed to attach.
    pub fn set_tags_for_item<S: AsRef<str>>(
        &self,
        item_id: ItemId,
        names: &[S],
    ) -> Result<Vec<String>> {
        self.conn
            .execute("DELETE FROM item_tags WHERE item_id = ?1", [item_id.get()])?;
        Ok(self.attach_all(item_id, names))
    }

    /// Tags attached to an item, ordered by name.
    pub fn tags_for_item(&self, item_id: ItemId) -> Result<Vec<Tag>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TAG_COLUMNS}
             FROM tags t
             JOIN item_tags it ON it.tag_id = t.id
             WHERE it.item_id = ?1
             ORDER BY t.name"
        ))?;
        let tags = stmt
            .query_map([item_id.get()], tag_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tags)
    }

    /// Every known tag, ordered by name.
    pub fn all(&self) -> Result<Vec<Tag>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {TAG_COLUMNS} FROM tags t ORDER BY t.name"))?;
        let tags = stmt
            .query_map([], tag_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    fn insert_item(db: &Database) -> ItemId {
        db.connection()
            .execute(
                "INSERT INTO vault_items (content_kind, content, created_at, updated_at)
                 VALUES ('note', 'x', 0, 0)",
                [],
            )
            .unwrap();
        ItemId::new(db.connection().last_insert_rowid())
    }

    fn names(tags: &[Tag]) -> Vec<&str> {
        tags.iter().map(Tag::name).collect()
    }

    #[test]
    fn get_or_create_is_case_insensitive() {
        let db = Database::in_memory().unwrap();
        let tags = TagResolver::new(db.connection());

        let first = tags.get_or_create("Music").unwrap();
        let second = tags.get_or_create(" music ").unwrap();

        assert_eq!(first.id(), second.id());
        assert_eq!(first.name(), "music");
        assert_eq!(first.color(), DEFAULT_TAG_COLOR);
    }

    #[test]
    fn get_or_create_rejects_blank_names() {
        let db = Database::in_memory().unwrap();
        let tags = TagResolver::new(db.connection());

        let result = tags.get_or_create("   ");
        assert!(matches!(result, Err(VaultError::Validation(_))));
    }

    #[test]
    fn custom_color_applies_only_on_creation() {
        let db = Database::in_memory().unwrap();
        let tags = TagResolver::new(db.connection());

        let created = tags
            .get_or_create_with_color("work", Some("#ff0000"))
            .unwrap();
        let existing = tags
            .get_or_create_with_color("WORK", Some("#00ff00"))
            .unwrap();

        assert_eq!(created.color(), "#ff0000");
        assert_eq!(existing.color(), "#ff0000");
        assert_eq!(created.id(), existing.id());
    }

    #[test]
    fn set_tags_replaces_previous_set() {
        let db = Database::in_memory().unwrap();
        let tags = TagResolver::new(db.connection());
        let item = insert_item(&db);

        tags.set_tags_for_item(item, &["rust", "music", "ideas"])
            .unwrap();
        tags.set_tags_for_item(item, &["ideas"]).unwrap();

        assert_eq!(names(&tags.tags_for_item(item).unwrap()), vec!["ideas"]);
    }

    #[test]
    fn set_tags_is_idempotent() {
        let db = Database::in_memory().unwrap();
        let tags = TagResolver::new(db.connection());
        let item = insert_item(&db);

        let first = tags.set_tags_for_item(item, &["b", "a"]).unwrap();
        let second = tags.set_tags_for_item(item, &["b", "a"]).unwrap();

        assert!(first.is_empty());
        assert!(second.is_empty());
        assert_eq!(names(&tags.tags_for_item(item).unwrap()), vec!["a", "b"]);
    }

    #[test]
    fn set_tags_with_empty_set_clears_all() {
        let db = Database::in_memory().unwrap();
        let tags = TagResolver::new(db.connection());
        let item = insert_item(&db);

        tags.set_tags_for_item(item, &["a"]).unwrap();
        tags.set_tags_for_item::<&str>(item, &[]).unwrap();

        assert!(tags.tags_for_item(item).unwrap().is_empty());
        // The tag itself survives losing its last association.
        assert_eq!(names(&tags.all().unwrap()), vec!["a"]);
    }

    #[test]
    fn attach_all_reports_names_that_fail_to_link() {
        let db = Database::in_memory().unwrap();
        db.connection()
            .execute_batch(
                "CREATE TRIGGER reject_forbidden BEFORE INSERT ON tags
                 WHEN NEW.name = 'forbidden'
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .unwrap();
        let tags = TagResolver::new(db.connection());
        let item = insert_item(&db);

        let failed = tags.attach_all(item, &["ok", "Forbidden", "also-ok"]);

        assert_eq!(failed, vec!["forbidden"]);
        assert_eq!(
            names(&tags.tags_for_item(item).unwrap()),
            vec!["also-ok", "ok"]
        );
    }

    #[test]
    fn linking_to_missing_item_fails() {
        let db = Database::in_memory().unwrap();
        let tags = TagResolver::new(db.connection());
        let tag = tags.get_or_create("orphan").unwrap();

        assert!(tags.link(ItemId::new(404), tag.id()).is_err());
    }

    #[test]
    fn all_is_ordered_by_name() {
        let db = Database::in_memory().unwrap();
        let tags = TagResolver::new(db.connection());
        for name in ["zeta", "alpha", "mid"] {
            tags.get_or_create(name).unwrap();
        }

        assert_eq!(names(&tags.all().unwrap()), vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn normalize_tag_names_dedups_case_insensitively() {
        assert_eq!(
            normalize_tag_names(vec!["ideas".to_string(), "Ideas".to_string()]),
            vec!["ideas"]
        );
    }
}

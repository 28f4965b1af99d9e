//! Persistence of vault items: CRUD, filtered listing and random sampling.

use rand::Rng;
use rusqlite::types::Value;
use rusqlite::{OptionalExtension, Row, params_from_iter};
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::db::{FOLD_CASE_FN, timestamp_column};
use crate::tags::{TagResolver, normalize_tag_names};
use crate::{
    ContentKind, Database, ItemFilter, ItemId, ItemUpdate, Metadata, NewItem, Result, VaultError,
    VaultItem,
};

const ITEM_COLUMNS: &str = "id, content_kind, title, content, source_url, \
     meta_title, meta_description, meta_thumbnail, meta_author, meta_site_name, \
     pinned, archived, created_at, updated_at";

/// Listing order: pinned first, then newest, ties by newest ID.
const LIST_ORDER: &str = "pinned DESC, created_at DESC, id DESC";

/// An item that was persisted, plus any tag names that could not be linked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Created {
    pub item: VaultItem,
    /// Normalized names whose get-or-create or link failed. The item itself
    /// was stored regardless.
    pub failed_tags: Vec<String>,
}

/// Item storage over an owned [`Database`].
///
/// Every operation is a single statement or a short sequence of them; there
/// are no multi-operation transactions.
///
/// # Examples
///
/// ```
/// use vault::{Database, ItemFilter, NewItem, VaultStore};
///
/// # fn main() -> vault::Result<()> {
/// let store = VaultStore::new(Database::in_memory()?);
///
/// let created = store.create(NewItem::note("Read later"), &["ideas"])?;
/// assert!(created.failed_tags.is_empty());
///
/// let items = store.list(&ItemFilter::default())?;
/// assert_eq!(items.len(), 1);
/// assert_eq!(items[0].tag_names(), vec!["ideas"]);
/// # Ok(())
/// # }
/// ```
pub struct VaultStore {
    db: Database,
}

impl VaultStore {
    /// Creates a store that takes ownership of `db`.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Returns a reference to the underlying database.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Tag operations on the same connection.
    pub fn tags(&self) -> TagResolver<'_> {
        TagResolver::new(self.db.connection())
    }

    /// Persists a new item and attaches `tag_names`.
    ///
    /// Content is trimmed and must not be blank. Tag linking is
    /// at-most-effort: a failing name is reported in
    /// [`Created::failed_tags`] rather than failing the creation.
    pub fn create<S: AsRef<str>>(&self, item: NewItem, tag_names: &[S]) -> Result<Created> {
        let content = item.content.trim();
        if content.is_empty() {
            return Err(VaultError::Validation("content cannot be empty".into()));
        }

        let conn = self.db.connection();
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let meta = &item.metadata;

        conn.execute(
            "INSERT INTO vault_items (
                content_kind, title, content, source_url,
                meta_title, meta_description, meta_thumbnail, meta_author, meta_site_name,
                pinned, archived, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)",
            rusqlite::params![
                item.kind,
                item.title.trim(),
                content,
                item.source_url.as_deref().map(str::trim),
                meta.title,
                meta.description,
                meta.thumbnail,
                meta.author,
                meta.site_name,
                item.pinned,
                item.archived,
                now,
            ],
        )?;
        let id = ItemId::new(conn.last_insert_rowid());

        let failed_tags = self.tags().attach_all(id, tag_names);
        info!(item = %id, kind = %item.kind, "created vault item");

        Ok(Created {
            item: self.get(id)?,
            failed_tags,
        })
    }

    /// Loads an item with its tags.
    pub fn get(&self, id: ItemId) -> Result<VaultItem> {
        let row = self
            .db
            .connection()
            .query_row(
                &format!("SELECT {ITEM_COLUMNS} FROM vault_items WHERE id = ?1"),
                [id.get()],
                item_from_row,
            )
            .optional()?;

        let mut item = row.ok_or(VaultError::NotFound { id })?;
        item.tags = self.tags().tags_for_item(id)?;
        Ok(item)
    }

    /// Lists items matching `filter`, pinned first and newest first.
    pub fn list(&self, filter: &ItemFilter) -> Result<Vec<VaultItem>> {
        let mut clauses = Vec::new();
        let mut params: Vec<Value> = Vec::new();

        if let Some(kind) = filter.kind {
            clauses.push("content_kind = ?".to_string());
            params.push(Value::from(kind.as_str().to_string()));
        }

        let tags = normalize_tag_names(&filter.tags);
        if !tags.is_empty() {
            let placeholders = vec!["?"; tags.len()].join(", ");
            clauses.push(format!(
                "id IN (SELECT it.item_id
                        FROM item_tags it
                        JOIN tags t ON t.id = it.tag_id
                        WHERE t.name IN ({placeholders}))"
            ));
            params.extend(tags.into_iter().map(Value::from));
        }

        if let Some(pinned) = filter.pinned {
            clauses.push("pinned = ?".to_string());
            params.push(Value::from(pinned));
        }

        clauses.push("archived = ?".to_string());
        params.push(Value::from(filter.archived.unwrap_or(false)));

        let search = filter.search.as_deref().map(str::trim).unwrap_or_default();
        if !search.is_empty() {
            let columns = ["title", "content", "meta_title", "meta_description"];
            let matches: Vec<String> = columns
                .iter()
                .map(|column| format!(r"{FOLD_CASE_FN}({column}) LIKE ? ESCAPE '\'"))
                .collect();
            clauses.push(format!("({})", matches.join(" OR ")));
            let pattern = format!("%{}%", escape_like(&search.to_lowercase()));
            params.extend(std::iter::repeat_n(Value::from(pattern), columns.len()));
        }

        let limit = if filter.limit > 0 { filter.limit } else { -1 };
        params.push(Value::from(limit));
        params.push(Value::from(filter.offset.max(0)));

        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM vault_items
             WHERE {}
             ORDER BY {LIST_ORDER}
             LIMIT ? OFFSET ?",
            clauses.join(" AND ")
        );
        debug!(%sql, "listing vault items");

        let conn = self.db.connection();
        let mut stmt = conn.prepare(&sql)?;
        let mut items = stmt
            .query_map(params_from_iter(params), item_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let tags = self.tags();
        for item in &mut items {
            item.tags = tags.tags_for_item(item.id)?;
        }
        Ok(items)
    }

    /// Rewrites title, content, pinned and archived.
    ///
    /// The content kind is never changed; link kinds keep `source_url` equal
    /// to the new content.
    pub fn update(&self, id: ItemId, update: &ItemUpdate) -> Result<VaultItem> {
        let content = update.content.trim();
        if content.is_empty() {
            return Err(VaultError::Validation("content cannot be empty".into()));
        }

        let changed = self.db.connection().execute(
            "UPDATE vault_items
             SET title = ?1,
                 content = ?2,
                 source_url = CASE WHEN content_kind = 'note' THEN NULL ELSE ?2 END,
                 pinned = ?3,
                 archived = ?4,
                 updated_at = ?5
             WHERE id = ?6",
            rusqlite::params![
                update.title.trim(),
                content,
                update.pinned,
                update.archived,
                OffsetDateTime::now_utc().unix_timestamp(),
                id.get(),
            ],
        )?;
        if changed == 0 {
            return Err(VaultError::NotFound { id });
        }
        self.get(id)
    }

    pub fn set_pinned(&self, id: ItemId, pinned: bool) -> Result<VaultItem> {
        self.set_flag(id, "pinned", pinned)
    }

    pub fn set_archived(&self, id: ItemId, archived: bool) -> Result<VaultItem> {
        self.set_flag(id, "archived", archived)
    }

    fn set_flag(&self, id: ItemId, column: &'static str, value: bool) -> Result<VaultItem> {
        let changed = self.db.connection().execute(
            &format!("UPDATE vault_items SET {column} = ?1, updated_at = ?2 WHERE id = ?3"),
            (value, OffsetDateTime::now_utc().unix_timestamp(), id.get()),
        )?;
        if changed == 0 {
            return Err(VaultError::NotFound { id });
        }
        self.get(id)
    }

    /// Replaces the item's tags; see [`TagResolver::set_tags_for_item`].
    ///
    /// Returns the names that failed to attach.
    pub fn set_tags<S: AsRef<str>>(&self, id: ItemId, names: &[S]) -> Result<Vec<String>> {
        self.ensure_exists(id)?;
        let failed = self.tags().set_tags_for_item(id, names)?;
        self.touch(id)?;
        Ok(failed)
    }

    /// Deletes an item; its tag associations cascade.
    pub fn delete(&self, id: ItemId) -> Result<()> {
        let deleted = self
            .db
            .connection()
            .execute("DELETE FROM vault_items WHERE id = ?1", [id.get()])?;
        if deleted == 0 {
            return Err(VaultError::NotFound { id });
        }
        info!(item = %id, "deleted vault item");
        Ok(())
    }

    /// Number of items eligible for resurfacing.
    pub fn count_unarchived(&self) -> Result<i64> {
        let count = self.db.connection().query_row(
            "SELECT COUNT(*) FROM vault_items WHERE archived = 0",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Picks a non-archived item uniformly at random.
    ///
    /// Returns `None` when nothing is eligible.
    pub fn random_item(&self) -> Result<Option<VaultItem>> {
        self.random_item_with(&mut rand::thread_rng())
    }

    /// [`random_item`](Self::random_item) with a caller-supplied generator.
    ///
    /// Counts the eligible rows and draws an offset uniformly from
    /// `0..count`, so every call reflects the set as it is right now.
    pub fn random_item_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Option<VaultItem>> {
        let count = self.count_unarchived()?;
        if count == 0 {
            return Ok(None);
        }

        let offset = rng.gen_range(0..count);
        let id: i64 = self.db.connection().query_row(
            "SELECT id FROM vault_items WHERE archived = 0 ORDER BY id LIMIT 1 OFFSET ?1",
            [offset],
            |row| row.get(0),
        )?;
        self.get(ItemId::new(id)).map(Some)
    }

    fn ensure_exists(&self, id: ItemId) -> Result<()> {
        let exists: bool = self.db.connection().query_row(
            "SELECT EXISTS(SELECT 1 FROM vault_items WHERE id = ?1)",
            [id.get()],
            |row| row.get(0),
        )?;
        if exists {
            Ok(())
        } else {
            Err(VaultError::NotFound { id })
        }
    }

    fn touch(&self, id: ItemId) -> Result<()> {
        self.db.connection().execute(
            "UPDATE vault_items SET updated_at = ?1 WHERE id = ?2",
            (OffsetDateTime::now_utc().unix_timestamp(), id.get()),
        )?;
        Ok(())
    }
}

/// Escapes `LIKE` wildcards so user text matches literally under
/// `ESCAPE '\'`.
fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<VaultItem> {
    Ok(VaultItem {
        id: ItemId::new(row.get(0)?),
        kind: row.get::<_, ContentKind>(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        source_url: row.get(4)?,
        metadata: Metadata {
            title: row.get(5)?,
            description: row.get(6)?,
            thumbnail: row.get(7)?,
            author: row.get(8)?,
            site_name: row.get(9)?,
        },
        pinned: row.get(10)?,
        archived: row.get(11)?,
        tags: Vec::new(),
        created_at: timestamp_column(row, 12)?,
        updated_at: timestamp_column(row, 13)?,
    })
}

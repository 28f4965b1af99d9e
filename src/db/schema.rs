/// Complete database schema for the vault.
///
/// Uses CREATE TABLE/INDEX IF NOT EXISTS for idempotent execution.
/// Timestamps are Unix seconds.
pub const INITIAL_SCHEMA: &str = r#"
-- Vault items: links and notes with provider metadata
CREATE TABLE IF NOT EXISTS vault_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    content_kind TEXT NOT NULL,
    title TEXT NOT NULL DEFAULT '',
    content TEXT NOT NULL CHECK (length(trim(content)) > 0),
    source_url TEXT,
    meta_title TEXT,
    meta_description TEXT,
    meta_thumbnail TEXT,
    meta_author TEXT,
    meta_site_name TEXT,
    pinned INTEGER NOT NULL DEFAULT 0,
    archived INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

-- Tags table: unique names (case-insensitive), stored lowercase
CREATE TABLE IF NOT EXISTS tags (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE COLLATE NOCASE,
    color TEXT NOT NULL DEFAULT '#8892b0',
    created_at INTEGER NOT NULL
);

-- Junction table: links items to tags (many-to-many)
CREATE TABLE IF NOT EXISTS item_tags (
    item_id INTEGER NOT NULL,
    tag_id INTEGER NOT NULL,
    PRIMARY KEY (item_id, tag_id),
    FOREIGN KEY (item_id) REFERENCES vault_items(id) ON DELETE CASCADE,
    FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_vault_items_kind ON vault_items(content_kind);
CREATE INDEX IF NOT EXISTS idx_vault_items_pinned ON vault_items(pinned);
CREATE INDEX IF NOT EXISTS idx_vault_items_archived ON vault_items(archived);
CREATE INDEX IF NOT EXISTS idx_vault_items_created ON vault_items(created_at);

CREATE INDEX IF NOT EXISTS idx_item_tags_item ON item_tags(item_id);
CREATE INDEX IF NOT EXISTS idx_item_tags_tag ON item_tags(tag_id);
"#;

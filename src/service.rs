use tracing::{debug, info};

use crate::classifier::classify;
use crate::metadata::{Enrichment, MetadataFetcher};
use crate::store::Created;
use crate::{
    ContentKind, ItemFilter, ItemId, ItemUpdate, Metadata, NewItem, Result, Tag, VaultError,
    VaultItem, VaultStore,
};

/// Input to [`VaultService::ingest`].
///
/// # Examples
///
/// ```
/// use vault::IngestRequest;
///
/// let request = IngestRequest::new("https://youtu.be/abc")
///     .title("Live set")
///     .tags(["music", "live"])
///     .pinned(true);
/// assert_eq!(request.tags, vec!["music", "live"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestRequest {
    /// A URL or freeform text.
    pub content: String,
    /// Display title; notes default to their content when absent.
    pub title: Option<String>,
    pub tags: Vec<String>,
    pub pinned: bool,
}

impl IngestRequest {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn pinned(mut self, pinned: bool) -> Self {
        self.pinned = pinned;
        self
    }
}

/// Outcome of an ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ingested {
    /// The persisted item, tags included.
    pub item: VaultItem,
    /// How metadata retrieval went. Notes always report a complete, empty
    /// result.
    pub enrichment: Enrichment,
    /// Tag names that could not be attached.
    pub failed_tags: Vec<String>,
}

/// Outcome of a mutation that may replace tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Updated {
    pub item: VaultItem,
    pub failed_tags: Vec<String>,
}

/// Classification plus metadata preview, with nothing persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub kind: ContentKind,
    pub enrichment: Enrichment,
}

/// Ingestion and query operations over a [`VaultStore`].
///
/// Owns the store and a [`MetadataFetcher`]; UI-independent, so the CLI and
/// any other surface call the same methods.
///
/// # Examples
///
/// ```
/// use vault::metadata::MetadataFetcherBuilder;
/// use vault::{ContentKind, Database, IngestRequest, VaultService, VaultStore};
///
/// # fn main() -> anyhow::Result<()> {
/// let store = VaultStore::new(Database::in_memory()?);
/// let service = VaultService::new(store, MetadataFetcherBuilder::new().build()?);
///
/// // Notes never touch the network.
/// let ingested = service.ingest(IngestRequest::new("Call the plumber").tags(["home"]))?;
/// assert_eq!(ingested.item.kind, ContentKind::Note);
/// assert_eq!(ingested.item.title, "Call the plumber");
/// # Ok(())
/// # }
/// ```
pub struct VaultService {
    store: VaultStore,
    fetcher: MetadataFetcher,
}

impl VaultService {
    /// Creates a service that owns `store` and `fetcher`.
    pub fn new(store: VaultStore, fetcher: MetadataFetcher) -> Self {
        Self { store, fetcher }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &VaultStore {
        &self.store
    }

    /// Classifies, enriches and persists one piece of content.
    ///
    /// Runs `classify -> fetch metadata (links only) -> persist -> attach
    /// tags` to completion. Blank content fails before any network call.
    /// Metadata failures never abort ingestion; they show up in
    /// [`Ingested::enrichment`].
    pub fn ingest(&self, request: IngestRequest) -> Result<Ingested> {
        let content = validated_content(&request.content)?;
        let kind = classify(content);
        debug!(%kind, "classified content");

        if !kind.is_link() {
            return self.persist(NewItem::note(content), &request, note_enrichment());
        }

        let enrichment = self.fetcher.fetch(content, kind);
        let item = NewItem::link(kind, content, enrichment.metadata.clone());
        self.persist(item, &request, enrichment)
    }

    /// Saves `request.content` as a note without classifying it, so text
    /// that happens to be a URL is kept as plain text.
    pub fn ingest_note(&self, request: IngestRequest) -> Result<Ingested> {
        let content = validated_content(&request.content)?;
        self.persist(NewItem::note(content), &request, note_enrichment())
    }

    fn persist(
        &self,
        item: NewItem,
        request: &IngestRequest,
        enrichment: Enrichment,
    ) -> Result<Ingested> {
        let item = match request.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => item.title(title),
            _ => item,
        }
        .pinned(request.pinned);

        let Created { item, failed_tags } = self.store.create(item, &request.tags)?;
        info!(
            item = %item.id,
            kind = %item.kind,
            degraded = enrichment.is_degraded(),
            "ingested content"
        );

        Ok(Ingested {
            item,
            enrichment,
            failed_tags,
        })
    }

    /// Classifies `content` and previews its metadata without persisting.
    pub fn detect(&self, content: &str) -> Result<Detection> {
        let content = validated_content(content)?;
        let kind = classify(content);
        Ok(Detection {
            kind,
            enrichment: self.fetcher.fetch(content, kind),
        })
    }

    pub fn get(&self, id: ItemId) -> Result<VaultItem> {
        self.store.get(id)
    }

    /// Lists items; see [`VaultStore::list`].
    pub fn list(&self, filter: &ItemFilter) -> Result<Vec<VaultItem>> {
        self.store.list(filter)
    }

    /// Rewrites an item's editable fields, then replaces its tags when
    /// `tags` is given.
    pub fn update<S: AsRef<str>>(
        &self,
        id: ItemId,
        update: &ItemUpdate,
        tags: Option<&[S]>,
    ) -> Result<Updated> {
        let item = self.store.update(id, update)?;
        match tags {
            Some(names) => self.set_tags(id, names),
            None => Ok(Updated {
                item,
                failed_tags: Vec::new(),
            }),
        }
    }

    pub fn set_pinned(&self, id: ItemId, pinned: bool) -> Result<VaultItem> {
        self.store.set_pinned(id, pinned)
    }

    pub fn set_archived(&self, id: ItemId, archived: bool) -> Result<VaultItem> {
        self.store.set_archived(id, archived)
    }

    pub fn delete(&self, id: ItemId) -> Result<()> {
        self.store.delete(id)
    }

    /// Replaces an item's tag set. Not additive: omitted names are detached.
    pub fn set_tags<S: AsRef<str>>(&self, id: ItemId, names: &[S]) -> Result<Updated> {
        let failed_tags = self.store.set_tags(id, names)?;
        Ok(Updated {
            item: self.store.get(id)?,
            failed_tags,
        })
    }

    /// Every known tag, ordered by name.
    pub fn tags_catalog(&self) -> Result<Vec<Tag>> {
        self.store.tags().all()
    }

    /// Get-or-creates a tag; `color` only applies when the tag is new.
    pub fn create_tag(&self, name: &str, color: Option<&str>) -> Result<Tag> {
        self.store.tags().get_or_create_with_color(name, color)
    }

    /// A uniformly random non-archived item, or `None` when there is none.
    pub fn resurface(&self) -> Result<Option<VaultItem>> {
        self.store.random_item()
    }
}

fn validated_content(content: &str) -> Result<&str> {
    let content = content.trim();
    if content.is_empty() {
        return Err(VaultError::Validation("content cannot be empty".into()));
    }
    Ok(content)
}

fn note_enrichment() -> Enrichment {
    Enrichment::complete(Metadata::default())
}

//! End-to-end ingestion through the public API with a scripted transport.

use std::sync::{Arc, Mutex};

use tempfile::tempdir;
use vault::metadata::{
    FetchError, HttpClient, HttpRequest, HttpResponse, MetadataFetcherBuilder,
};
use vault::{
    Config, ContentKind, Database, IngestRequest, ItemFilter, VaultService, VaultStore,
};

/// Answers by URL prefix and records every URL requested.
struct ScriptedClient {
    routes: Vec<(&'static str, Result<HttpResponse, FetchError>)>,
    seen: Mutex<Vec<String>>,
}

impl ScriptedClient {
    fn new(routes: Vec<(&'static str, Result<HttpResponse, FetchError>)>) -> Arc<Self> {
        Arc::new(Self {
            routes,
            seen: Mutex::new(Vec::new()),
        })
    }

    fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

impl HttpClient for ScriptedClient {
    fn get(&self, request: &HttpRequest<'_>) -> Result<HttpResponse, FetchError> {
        self.seen.lock().unwrap().push(request.url.to_string());
        self.routes
            .iter()
            .find(|(prefix, _)| request.url.starts_with(prefix))
            .map(|(_, response)| response.clone())
            .unwrap_or(Err(FetchError::Http { status: 404 }))
    }
}

fn body(text: &str) -> Result<HttpResponse, FetchError> {
    Ok(HttpResponse {
        status: 200,
        body: text.as_bytes().to_vec(),
    })
}

fn service(db: Database, client: Arc<ScriptedClient>) -> VaultService {
    let fetcher = MetadataFetcherBuilder::new()
        .client(client)
        .build()
        .expect("failed to build fetcher");
    VaultService::new(VaultStore::new(db), fetcher)
}

fn in_memory(client: Arc<ScriptedClient>) -> VaultService {
    service(
        Database::in_memory().expect("failed to create in-memory database"),
        client,
    )
}

#[test]
fn each_kind_is_enriched_by_its_provider() {
    let client = ScriptedClient::new(vec![
        (
            "https://www.youtube.com/oembed",
            body(r#"{"title":"Song","author_name":"Band","thumbnail_url":"http://img"}"#),
        ),
        (
            "https://www.tiktok.com/oembed",
            body(r#"{"title":"Dance","author_name":"dancer"}"#),
        ),
        (
            "https://cdn.syndication.twimg.com/",
            body(r#"{"text":"hello from x","user":{"screen_name":"poster"}}"#),
        ),
        (
            "https://blog.example.com/",
            body(r#"<meta property="og:title" content="Blog Post"><meta name="description" content="About things">"#),
        ),
    ]);
    let service = in_memory(client.clone());

    let cases = [
        ("https://www.youtube.com/watch?v=abc", ContentKind::YouTube, "Song"),
        ("https://www.tiktok.com/@dancer/video/7", ContentKind::TikTok, "Dance"),
        ("https://x.com/poster/status/555", ContentKind::Tweet, "hello from x"),
        ("https://blog.example.com/post", ContentKind::Article, "Blog Post"),
    ];

    for (url, kind, title) in cases {
        let ingested = service.ingest(IngestRequest::new(url)).expect("ingest failed");
        assert_eq!(ingested.item.kind, kind, "{url}");
        assert_eq!(ingested.item.metadata.title.as_deref(), Some(title), "{url}");
        assert_eq!(ingested.item.source_url.as_deref(), Some(url));
        assert!(!ingested.enrichment.is_degraded(), "{url}");
    }

    let article = service
        .list(&ItemFilter {
            kind: Some(ContentKind::Article),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(
        article[0].metadata.description.as_deref(),
        Some("About things")
    );
    assert_eq!(client.seen().len(), 4);
}

#[test]
fn unreachable_providers_still_save_the_item() {
    let client = ScriptedClient::new(vec![("https://", Err(FetchError::Timeout))]);
    let service = in_memory(client);

    let ingested = service
        .ingest(IngestRequest::new("https://youtu.be/abc").tags(["music"]))
        .expect("ingest must survive provider failure");

    assert_eq!(ingested.item.kind, ContentKind::YouTube);
    assert!(ingested.item.metadata.is_empty());
    assert_eq!(ingested.enrichment.degradation, Some(FetchError::Timeout));
    assert_eq!(ingested.item.tag_names(), vec!["music"]);
    assert_eq!(
        ingested.item.display_title(),
        "https://youtu.be/abc"
    );
}

#[test]
fn post_failures_fall_back_to_placeholder() {
    let client = ScriptedClient::new(Vec::new());
    let service = in_memory(client.clone());

    // A profile URL has no /status/ segment, so it is an article.
    let ingested = service
        .ingest(IngestRequest::new("https://x.com/poster"))
        .unwrap();
    assert_eq!(ingested.item.kind, ContentKind::Article);

    let post = service
        .ingest(IngestRequest::new("https://twitter.com/poster/status/99"))
        .unwrap();
    assert_eq!(post.item.kind, ContentKind::Tweet);
    assert_eq!(post.item.metadata.title.as_deref(), Some("Tweet"));
    assert_eq!(post.item.metadata.site_name.as_deref(), Some("Twitter/X"));
    assert_eq!(client.seen().len(), 2);
}

#[test]
fn items_survive_reopening_the_database_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("vault.db");
    let client = ScriptedClient::new(Vec::new());

    let id = {
        let service = service(Database::open(&path).unwrap(), client.clone());
        service
            .ingest(IngestRequest::new("persist me").tags(["durable"]).pinned(true))
            .unwrap()
            .item
            .id
    };

    let service = service(Database::open(&path).unwrap(), client);
    let item = service.get(id).unwrap();
    assert_eq!(item.content, "persist me");
    assert!(item.pinned);
    assert_eq!(item.tag_names(), vec!["durable"]);
}

#[test]
fn huge_configured_timeout_does_not_abort_ingestion() {
    let config = Config::from_lookup(|key| match key {
        "VAULT_DB_PATH" => Some(":memory:".to_string()),
        "VAULT_FETCH_TIMEOUT_SECS" => Some(u64::MAX.to_string()),
        _ => None,
    })
    .unwrap();
    let client = ScriptedClient::new(vec![(
        "https://example.com/",
        body(r#"<meta property="og:title" content="Still Works">"#),
    )]);
    let fetcher = MetadataFetcherBuilder::new()
        .client(client)
        .config(config.fetch)
        .build()
        .unwrap();
    let service = VaultService::new(
        VaultStore::new(Database::in_memory().unwrap()),
        fetcher,
    );

    let ingested = service
        .ingest(IngestRequest::new("https://example.com/a"))
        .unwrap();

    assert_eq!(ingested.item.metadata.title.as_deref(), Some("Still Works"));
}

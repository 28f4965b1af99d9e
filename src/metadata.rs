//! Metadata retrieval for link items.
//!
//! [`MetadataFetcher::fetch`] never fails: a transport problem degrades to a
//! fallback or empty [`Metadata`], and the reason is kept on the returned
//! [`Enrichment`] so callers can tell a clean result from a degraded one.

mod client;
mod html;
mod providers;

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::{ContentKind, Metadata};

pub use client::{
    FetchError, HttpClient, HttpRequest, HttpResponse, ReqwestClient, ReqwestClientBuilder,
};
pub use html::{extract_metadata, meta_content, title_element};
pub use providers::{OEmbed, Provider, TIKTOK_OEMBED, YOUTUBE_OEMBED};

/// Overall budget for one retrieval, fallbacks included.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound on the retrieval budget; larger configured timeouts are
/// clamped to it.
pub const MAX_FETCH_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// User agent sent with every metadata request.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; Vault/1.0)";

/// Bytes of HTML read when scraping a page.
pub const SCRAPE_BODY_LIMIT: usize = 100 * 1024;

/// Bytes read from JSON endpoints.
pub const JSON_BODY_LIMIT: usize = 1024 * 1024;

/// Tunables for metadata retrieval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub user_agent: String,
    pub scrape_body_limit: usize,
    pub json_body_limit: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_FETCH_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            scrape_body_limit: SCRAPE_BODY_LIMIT,
            json_body_limit: JSON_BODY_LIMIT,
        }
    }
}

/// Best-effort metadata plus why it is incomplete, if it is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrichment {
    pub metadata: Metadata,
    /// The primary strategy's failure when a fallback or empty result was
    /// used instead.
    pub degradation: Option<FetchError>,
}

impl Enrichment {
    /// Result of a provider that succeeded.
    pub fn complete(metadata: Metadata) -> Self {
        Self {
            metadata,
            degradation: None,
        }
    }

    /// Result of a provider that failed and fell back.
    pub fn degraded(metadata: Metadata, reason: FetchError) -> Self {
        Self {
            metadata,
            degradation: Some(reason),
        }
    }

    /// Returns `true` when retrieval fell back.
    pub fn is_degraded(&self) -> bool {
        self.degradation.is_some()
    }
}

/// Builder for constructing `MetadataFetcher` instances.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use vault::metadata::{FetchConfig, MetadataFetcherBuilder};
///
/// let fetcher = MetadataFetcherBuilder::new()
///     .config(FetchConfig {
///         timeout: Duration::from_secs(5),
///         ..Default::default()
///     })
///     .build()
///     .expect("Failed to create fetcher");
/// assert_eq!(fetcher.config().timeout, Duration::from_secs(5));
/// ```
#[derive(Default)]
pub struct MetadataFetcherBuilder {
    client: Option<Arc<dyn HttpClient>>,
    config: Option<FetchConfig>,
}

impl MetadataFetcherBuilder {
    /// Creates a new builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the HTTP client. Defaults to a [`ReqwestClient`].
    pub fn client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Sets the retrieval configuration.
    pub fn config(mut self, config: FetchConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Builds the fetcher, creating the default HTTP client if none was set.
    pub fn build(self) -> Result<MetadataFetcher, FetchError> {
        let client: Arc<dyn HttpClient> = match self.client {
            Some(client) => client,
            None => Arc::new(ReqwestClientBuilder::new().build()?),
        };

        Ok(MetadataFetcher {
            client,
            config: self.config.unwrap_or_default(),
        })
    }
}

/// Selects and runs the retrieval strategy for a content kind.
pub struct MetadataFetcher {
    client: Arc<dyn HttpClient>,
    config: FetchConfig,
}

impl MetadataFetcher {
    /// Returns the active configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetches metadata for `url` using the provider for `kind`.
    ///
    /// Bounded by `config.timeout` overall. Never returns an error; see
    /// [`Enrichment::degradation`].
    pub fn fetch(&self, url: &str, kind: ContentKind) -> Enrichment {
        let provider = Provider::for_kind(kind);
        debug!(url, %kind, ?provider, "selecting metadata provider");
        providers::Session::new(self.client.as_ref(), &self.config).run(provider, url)
    }
}

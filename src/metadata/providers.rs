//! Retrieval strategies, one per content kind.
//!
//! Every strategy shares one deadline per [`MetadataFetcher::fetch`] call,
//! so a fallback only runs with whatever budget the primary left behind.
//!
//! [`MetadataFetcher::fetch`]: super::MetadataFetcher::fetch

use std::time::Instant;

use reqwest::Url;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::client::{FetchError, HttpClient, HttpRequest, HttpResponse};
use super::html::extract_metadata;
use super::{Enrichment, FetchConfig, MAX_FETCH_TIMEOUT};
use crate::classifier::extract_post_id;
use crate::models::non_empty;
use crate::utils::truncate_chars;
use crate::{ContentKind, Metadata};

/// Characters of post text kept for the title.
const POST_TITLE_CHARS: usize = 100;

const SYNDICATION_ENDPOINT: &str = "https://cdn.syndication.twimg.com/tweet-result";
const POST_SITE_NAME: &str = "Twitter/X";
const POST_PLACEHOLDER_TITLE: &str = "Tweet";

/// An oEmbed-style endpoint for a video platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OEmbed {
    pub endpoint: &'static str,
    pub site_name: &'static str,
    /// Whether the endpoint needs an explicit `format=json` parameter.
    pub explicit_json: bool,
}

pub const YOUTUBE_OEMBED: OEmbed = OEmbed {
    endpoint: "https://www.youtube.com/oembed",
    site_name: "YouTube",
    explicit_json: true,
};

pub const TIKTOK_OEMBED: OEmbed = OEmbed {
    endpoint: "https://www.tiktok.com/oembed",
    site_name: "TikTok",
    explicit_json: false,
};

/// Retrieval strategy selected by content kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// Notes carry no metadata.
    Skip,
    /// Embed-info JSON endpoint; falls back to [`Provider::OpenGraph`].
    OEmbed(OEmbed),
    /// Post syndication endpoint keyed by numeric post ID; falls back to a
    /// placeholder.
    Syndication,
    /// Generic HTML scrape of Open Graph tags.
    OpenGraph,
}

impl Provider {
    /// The fixed kind-to-strategy mapping.
    pub fn for_kind(kind: ContentKind) -> Self {
        match kind {
            ContentKind::Note => Self::Skip,
            ContentKind::YouTube => Self::OEmbed(YOUTUBE_OEMBED),
            ContentKind::TikTok => Self::OEmbed(TIKTOK_OEMBED),
            ContentKind::Tweet => Self::Syndication,
            ContentKind::Article => Self::OpenGraph,
        }
    }
}

/// One metadata retrieval: client, configuration and shared deadline.
pub(super) struct Session<'a> {
    client: &'a dyn HttpClient,
    config: &'a FetchConfig,
    deadline: Instant,
}

impl<'a> Session<'a> {
    pub(super) fn new(client: &'a dyn HttpClient, config: &'a FetchConfig) -> Self {
        let now = Instant::now();
        let deadline = now
            .checked_add(config.timeout.min(MAX_FETCH_TIMEOUT))
            .unwrap_or(now);
        Self {
            client,
            config,
            deadline,
        }
    }

    /// Runs `provider` for `url`, applying its fallback on failure.
    pub(super) fn run(&self, provider: Provider, url: &str) -> Enrichment {
        match provider {
            Provider::Skip => Enrichment::complete(Metadata::default()),
            Provider::OEmbed(oembed) => self.video(oembed, url),
            Provider::Syndication => self.post(url),
            Provider::OpenGraph => match self.open_graph(url) {
                Ok(meta) => Enrichment::complete(meta),
                Err(e) => {
                    warn!(url, error = %e, "page metadata unavailable");
                    Enrichment::degraded(Metadata::default(), e)
                }
            },
        }
    }

    fn video(&self, oembed: OEmbed, url: &str) -> Enrichment {
        let error = match self.oembed(oembed, url) {
            Ok(meta) => return Enrichment::complete(meta),
            Err(e) => e,
        };

        warn!(url, site = oembed.site_name, error = %error, "embed info unavailable, scraping page");
        let meta = self.open_graph(url).unwrap_or_else(|e| {
            debug!(url, error = %e, "page scrape fallback failed");
            Metadata::default()
        });
        Enrichment::degraded(meta, error)
    }

    fn oembed(&self, oembed: OEmbed, url: &str) -> Result<Metadata, FetchError> {
        let mut params = vec![("url", url)];
        if oembed.explicit_json {
            params.push(("format", "json"));
        }
        let endpoint = Url::parse_with_params(oembed.endpoint, &params)
            .map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

        let info: OEmbedResponse = self.get_json(endpoint.as_str())?;
        Ok(Metadata {
            title: info.title.and_then(non_empty),
            description: None,
            thumbnail: info.thumbnail_url.and_then(non_empty),
            author: info.author_name.and_then(non_empty),
            site_name: Some(oembed.site_name.to_string()),
        })
    }

    fn post(&self, url: &str) -> Enrichment {
        let Some(post_id) = extract_post_id(url) else {
            debug!(url, "no post ID, using placeholder");
            return Enrichment::degraded(post_placeholder(), FetchError::MissingPostId);
        };

        let result = Url::parse_with_params(SYNDICATION_ENDPOINT, &[("id", post_id), ("token", "a")])
            .map_err(|e| FetchError::InvalidUrl(e.to_string()))
            .and_then(|endpoint| self.get_json::<SyndicationPost>(endpoint.as_str()));

        match result {
            Ok(post) => Enrichment::complete(post.into_metadata()),
            Err(e) => {
                warn!(url, error = %e, "post syndication unavailable, using placeholder");
                Enrichment::degraded(post_placeholder(), e)
            }
        }
    }

    fn open_graph(&self, url: &str) -> Result<Metadata, FetchError> {
        let response = self.get(url, self.config.scrape_body_limit)?;
        let html = String::from_utf8_lossy(&response.body);
        Ok(extract_metadata(&html))
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let response = self.get(url, self.config.json_body_limit)?;
        serde_json::from_slice(&response.body).map_err(|e| FetchError::Malformed(e.to_string()))
    }

    fn get(&self, url: &str, max_body_bytes: usize) -> Result<HttpResponse, FetchError> {
        let remaining = self
            .deadline
            .checked_duration_since(Instant::now())
            .filter(|d| !d.is_zero())
            .ok_or(FetchError::Timeout)?;

        debug!(url, ?remaining, "fetching metadata");
        let headers = [("User-Agent", self.config.user_agent.as_str())];
        let response = self.client.get(&HttpRequest {
            url,
            headers: &headers,
            timeout: remaining,
            max_body_bytes,
        })?;

        if !response.is_success() {
            return Err(FetchError::Http {
                status: response.status,
            });
        }
        Ok(response)
    }
}

fn post_placeholder() -> Metadata {
    Metadata {
        title: Some(POST_PLACEHOLDER_TITLE.to_string()),
        site_name: Some(POST_SITE_NAME.to_string()),
        ..Default::default()
    }
}

/// Fields read from an oEmbed body; all optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OEmbedResponse {
    title: Option<String>,
    author_name: Option<String>,
    thumbnail_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SyndicationPost {
    text: Option<String>,
    user: Option<SyndicationUser>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SyndicationUser {
    screen_name: Option<String>,
}

impl SyndicationPost {
    fn into_metadata(self) -> Metadata {
        let text = self.text.and_then(non_empty);
        let author = self
            .user
            .and_then(|u| u.screen_name)
            .and_then(non_empty)
            .map(|name| format!("@{name}"));

        Metadata {
            title: text.as_deref().map(|t| truncate_chars(t, POST_TITLE_CHARS)),
            description: text,
            thumbnail: None,
            author,
            site_name: Some(POST_SITE_NAME.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_maps_to_a_provider() {
        assert_eq!(Provider::for_kind(ContentKind::Note), Provider::Skip);
        assert_eq!(
            Provider::for_kind(ContentKind::YouTube),
            Provider::OEmbed(YOUTUBE_OEMBED)
        );
        assert_eq!(
            Provider::for_kind(ContentKind::TikTok),
            Provider::OEmbed(TIKTOK_OEMBED)
        );
        assert_eq!(Provider::for_kind(ContentKind::Tweet), Provider::Syndication);
        assert_eq!(Provider::for_kind(ContentKind::Article), Provider::OpenGraph);
    }

    #[test]
    fn long_post_text_is_truncated_for_title_only() {
        let text = "word ".repeat(40);
        let post = SyndicationPost {
            text: Some(text.clone()),
            user: Some(SyndicationUser {
                screen_name: Some("rustlang".to_string()),
            }),
        };
        let meta = post.into_metadata();

        let title = meta.title.unwrap();
        assert_eq!(title.chars().count(), POST_TITLE_CHARS);
        assert!(title.ends_with("..."));
        assert_eq!(meta.description.as_deref(), Some(text.trim()));
        assert_eq!(meta.author.as_deref(), Some("@rustlang"));
    }

    #[test]
    fn post_without_user_has_no_author() {
        let meta = SyndicationPost {
            text: Some("hello".to_string()),
            user: None,
        }
        .into_metadata();

        assert_eq!(meta.title.as_deref(), Some("hello"));
        assert_eq!(meta.author, None);
        assert_eq!(meta.site_name.as_deref(), Some("Twitter/X"));
    }

    #[test]
    fn oembed_body_tolerates_missing_and_null_fields() {
        let info: OEmbedResponse =
            serde_json::from_str(r#"{"title": null, "version": "1.0"}"#).unwrap();
        assert!(info.title.is_none());
        assert!(info.author_name.is_none());
    }
}

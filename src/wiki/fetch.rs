// src/wiki/fetch.rs
// =============================================================================
// This module fetches the outbound article links of one Wikipedia page.
//
// How it works:
// 1. Ask the API for the page's links (pllimit=max)
// 2. If the response carries a `plcontinue` token, ask again with it
// 3. Repeat until a response comes back without a token
// 4. Merge every page of results into one ordered, de-duplicated set
//
// Failure contract:
// - Any failed request fails the whole fetch. We never hand back half a link
//   list, because the graph would silently miss edges.
//
// Rust concepts:
// - Traits + async_trait: the crawl engine only knows `LinkSource`
// - thiserror: one error enum with a variant per failure mode
// - Arc: clones of the client share one politeness pacer
// =============================================================================

use async_trait::async_trait;
use indexmap::IndexSet;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

use super::pacer::Pacer;
use super::wire::{decode_batch, DecodeError};

pub const DEFAULT_API_URL: &str = "https://en.wikipedia.org/w/api.php";
pub const DEFAULT_USER_AGENT: &str =
    "wiki-graph-crawler/0.1 (https://github.com/vswaroop04/wiki-graph-crawler)";

/// The complete link listing of one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageLinks {
    /// Source-assigned page identifier, if the source reported one.
    pub page_id: Option<u64>,
    /// Article titles in the order they were discovered.
    pub links: IndexSet<String>,
}

/// Errors from fetching one page. All of them are transient from the
/// crawler's point of view: the page is skipped for this session.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("fetching links for '{title}' failed: HTTP {status}")]
    Status { title: String, status: StatusCode },

    #[error("fetching links for '{title}' failed: {source}")]
    Transport {
        title: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Wikipedia API error for '{title}': {code} ({info})")]
    Api {
        title: String,
        code: String,
        info: String,
    },

    #[error("malformed response for '{title}': {reason}")]
    Malformed { title: String, reason: String },

    #[error("page '{title}' does not exist")]
    MissingPage { title: String },

    #[error("page id for '{title}' changed during pagination ({first} then {later})")]
    InconsistentPageId { title: String, first: u64, later: u64 },
}

/// Anything that can list the outbound links of a page.
#[async_trait]
pub trait LinkSource: Send + Sync {
    async fn fetch(&self, title: &str) -> Result<PageLinks, FetchError>;
}

/// Settings for the Wikipedia client.
#[derive(Debug, Clone)]
pub struct WikiConfig {
    pub api_url: Url,
    pub user_agent: String,
    pub delay: Duration,
    pub timeout: Duration,
}

impl Default for WikiConfig {
    fn default() -> Self {
        Self {
            // The default is a constant we control, so parsing cannot fail
            api_url: Url::parse(DEFAULT_API_URL).expect("default API URL is valid"),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            delay: Duration::from_millis(100),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Link source backed by the MediaWiki action API.
#[derive(Debug, Clone)]
pub struct WikiClient {
    client: Client,
    api_url: Url,
    pacer: Arc<Pacer>,
}

impl WikiClient {
    pub fn new(config: WikiConfig) -> reqwest::Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url,
            pacer: Arc::new(Pacer::new(config.delay)),
        })
    }

    // Requests one page of results and decodes it
    async fn request_batch(
        &self,
        title: &str,
        continuation: Option<&str>,
    ) -> Result<super::wire::LinkBatch, FetchError> {
        let mut query = vec![
            ("action", "query"),
            ("format", "json"),
            ("formatversion", "2"),
            ("prop", "links"),
            ("titles", title),
            ("pllimit", "max"),
        ];
        if let Some(token) = continuation {
            query.push(("plcontinue", token));
        }

        let transport = |source| FetchError::Transport {
            title: title.to_string(),
            source,
        };

        let response = self
            .client
            .get(self.api_url.clone())
            .query(&query)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                title: title.to_string(),
                status,
            });
        }

        let body = response.bytes().await.map_err(transport)?;
        decode_batch(&body).map_err(|e| match e {
            DecodeError::Api { code, info } => FetchError::Api {
                title: title.to_string(),
                code,
                info,
            },
            DecodeError::Malformed(reason) => FetchError::Malformed {
                title: title.to_string(),
                reason,
            },
        })
    }
}

#[async_trait]
impl LinkSource for WikiClient {
    async fn fetch(&self, title: &str) -> Result<PageLinks, FetchError> {
        let mut result = PageLinks::default();
        let mut continuation: Option<String> = None;
        let mut requests = 0usize;

        loop {
            let slot = self.pacer.wait().await;
            let batch = self.request_batch(title, continuation.as_deref()).await;
            // The next request is timed from here, after the body was read
            drop(slot);
            let batch = batch?;
            requests += 1;

            if batch.missing {
                return Err(FetchError::MissingPage {
                    title: title.to_string(),
                });
            }

            match (result.page_id, batch.page_id) {
                (Some(first), Some(later)) if first != later => {
                    return Err(FetchError::InconsistentPageId {
                        title: title.to_string(),
                        first,
                        later,
                    });
                }
                (None, Some(id)) => result.page_id = Some(id),
                _ => {}
            }

            result.links.extend(batch.links);

            match batch.continuation {
                // A token that does not move forward would loop forever
                Some(token) if continuation.as_deref() == Some(token.as_str()) => {
                    return Err(FetchError::Malformed {
                        title: title.to_string(),
                        reason: format!("continuation token '{}' repeated", token),
                    });
                }
                Some(token) => continuation = Some(token),
                None => break,
            }
        }

        debug!(title, requests, links = result.links.len(), "fetched link listing");
        Ok(result)
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why IndexSet instead of HashSet?
//    - Both drop duplicates, but IndexSet remembers insertion order
//    - The crawler enqueues links in that order, so BFS order stays
//      deterministic across runs
//
// 2. Why does the closure `transport` work for two different calls?
//    - It only captures `title` by reference and is Fn, so we can call it
//      for both `send()` and `bytes()` errors
//
// 3. Why is the Pacer behind an Arc?
//    - WikiClient derives Clone; every clone must share the same "last
//      request finished" clock, otherwise the delay would not bound the
//      total rate
//
// 4. Why is the pacer slot dropped by hand?
//    - Dropping it stamps the finish time. It has to happen after
//      request_batch returns and before `?` can leave the loop early
// -----------------------------------------------------------------------------

// src/wiki/wire.rs
// =============================================================================
// This module decodes the MediaWiki "query + prop=links" JSON response.
//
// We ask for formatversion=2, which gives us a page *array* instead of the
// legacy object keyed by page id:
//
//   {
//     "continue": { "plcontinue": "736|0|Water", "continue": "||" },
//     "query": {
//       "pages": [
//         { "pageid": 736, "ns": 0, "title": "Hydrogen",
//           "links": [ { "ns": 0, "title": "Oxygen" }, ... ] }
//       ]
//     }
//   }
//
// Everything else in the crate only sees `LinkBatch`, never the raw shape.
//
// Rust concepts:
// - serde derive: turning JSON into typed structs
// - #[serde(default)]: tolerate fields the API leaves out
// =============================================================================

use serde::Deserialize;

/// Namespace of ordinary article pages in MediaWiki.
pub const ARTICLE_NAMESPACE: i64 = 0;

// Raw response types. These mirror the API and are private to this module.

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(rename = "continue")]
    continuation: Option<Continuation>,
    query: Option<Query>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct Continuation {
    plcontinue: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Query {
    #[serde(default)]
    pages: Vec<RawPage>,
}

#[derive(Debug, Deserialize)]
struct RawPage {
    pageid: Option<u64>,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    invalid: bool,
    #[serde(default)]
    links: Vec<RawLink>,
}

#[derive(Debug, Deserialize)]
struct RawLink {
    ns: i64,
    title: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: String,
    #[serde(default)]
    info: String,
}

/// One page of a (possibly paginated) link listing, already filtered to
/// article links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkBatch {
    pub page_id: Option<u64>,
    /// The source says the requested title does not exist (or is invalid).
    pub missing: bool,
    pub links: Vec<String>,
    /// Cursor for the next request; `None` on the last page.
    pub continuation: Option<String>,
}

/// Why a response body could not be turned into a `LinkBatch`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The API answered with an `error` object instead of results.
    Api { code: String, info: String },
    /// The body was not the JSON shape we expect.
    Malformed(String),
}

/// Decodes one response body into a `LinkBatch`.
pub fn decode_batch(body: &[u8]) -> Result<LinkBatch, DecodeError> {
    let response: QueryResponse =
        serde_json::from_slice(body).map_err(|e| DecodeError::Malformed(e.to_string()))?;

    if let Some(error) = response.error {
        return Err(DecodeError::Api {
            code: error.code,
            info: error.info,
        });
    }

    let query = response
        .query
        .ok_or_else(|| DecodeError::Malformed("response has no 'query' object".to_string()))?;

    // We only ever request one title, so there is exactly one page entry
    let page = query
        .pages
        .into_iter()
        .next()
        .ok_or_else(|| DecodeError::Malformed("response lists no pages".to_string()))?;

    let links = page
        .links
        .into_iter()
        .filter(|link| link.ns == ARTICLE_NAMESPACE)
        .map(|link| link.title)
        .collect();

    Ok(LinkBatch {
        page_id: page.pageid,
        missing: page.missing || page.invalid,
        links,
        continuation: response.continuation.and_then(|c| c.plcontinue),
    })
}

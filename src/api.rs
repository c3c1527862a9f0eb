//! External collaborator boundaries: the search API and the accessibility
//! announcer. Wire shapes are strict serde structs validated here, so the
//! rest of the crate never sees loosely-typed payloads.
use crate::error::{Result, SearchError};
use crate::model::Artist;
use crate::query::{LocationFilter, SearchQuery};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Outgoing request shape for the remote search API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Comma-joined style names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub styles: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postcode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    pub page: u32,
    pub limit: u32,
}

impl SearchRequest {
    pub fn from_query(query: &SearchQuery) -> Self {
        let (postcode, city) = match &query.location {
            Some(LocationFilter::Postcode(pc)) => (Some(pc.clone()), None),
            Some(LocationFilter::City(c)) => (None, Some(c.clone())),
            // The API takes named locations only; coordinates stay client-side
            // for radius filtering.
            Some(LocationFilter::Coordinates { .. }) | None => (None, None),
        };

        Self {
            query: (!query.text.is_empty()).then(|| query.text.clone()),
            styles: (!query.styles.is_empty()).then(|| query.styles.join(",")),
            postcode,
            city,
            page: query.page,
            limit: query.limit,
        }
    }
}

/// Incoming response shape. `items` accepts the legacy `artists` key.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchResponse {
    #[serde(alias = "artists")]
    pub items: Vec<Artist>,
    #[serde(alias = "totalCount")]
    pub total_count: usize,
    #[serde(default)]
    pub facets: Option<HashMap<String, HashMap<String, usize>>>,
}

impl SearchResponse {
    /// Decode a raw payload, failing fast on malformed shapes.
    pub fn from_json(payload: &str) -> Result<Self> {
        serde_json::from_str(payload)
            .map_err(|e| SearchError::Network(format!("malformed search response: {e}")))
    }
}

/// The remote search API. Owns its own hard request timeout; this layer only
/// classifies slowness after completion.
#[async_trait]
pub trait SearchApi: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse>;
}

/// Fire-and-forget accessibility announcement channel.
pub trait Announcer: Send + Sync {
    fn announce(&self, message: &str);
}

/// Default announcer: routes announcements to the log.
#[derive(Debug, Default)]
pub struct LogAnnouncer;

impl Announcer for LogAnnouncer {
    fn announce(&self, message: &str) {
        log::info!("announce: {message}");
    }
}

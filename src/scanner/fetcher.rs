//! HTTP page fetcher implementation
//!
//! This module handles every request the scanner makes, including:
//! - Building the HTTP client with the marketplace's browser headers
//! - POSTing the pagination cursor to the listing endpoint
//! - Decoding the `{"data": {"nextId", "data": [...]}}` envelope
//! - Classifying failures into retryable and session-fatal kinds

use crate::config::ApiConfig;
use crate::ScanError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, COOKIE};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Browser identification sent with every listing request
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/134.0.0.0 Safari/537.36 Edg/134.0.0.0";

/// Static headers the listing endpoint expects from its own web front-end
const STATIC_HEADERS: [(&str, &str); 12] = [
    ("authority", "mall.bilibili.com"),
    ("accept", "application/json, text/plain, */*"),
    (
        "accept-language",
        "zh-CN,zh;q=0.9,en;q=0.8,en-GB;q=0.7,en-US;q=0.6,zh-TW;q=0.5,ja;q=0.4",
    ),
    ("content-type", "application/json"),
    ("origin", "https://mall.bilibili.com"),
    (
        "referer",
        "https://mall.bilibili.com/neul-next/index.html?page=magic-market_index",
    ),
    (
        "sec-ch-ua",
        "\"Chromium\";v=\"134\", \"Not:A-Brand\";v=\"24\", \"Microsoft Edge\";v=\"134\"",
    ),
    ("sec-ch-ua-mobile", "?0"),
    ("sec-ch-ua-platform", "\"Windows\""),
    ("sec-fetch-dest", "empty"),
    ("sec-fetch-mode", "cors"),
    ("sec-fetch-site", "same-origin"),
];

/// Opaque pagination token handed out by the server
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single listed item as returned by the server
///
/// Only the fields the scanner works with are typed; everything else the
/// server sends is kept verbatim in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Display name
    #[serde(rename = "c2cItemsName", default, deserialize_with = "null_as_empty")]
    pub name: String,

    /// Price as formatted by the server (number or string)
    #[serde(rename = "showPrice", default, skip_serializing_if = "Option::is_none")]
    pub show_price: Option<Value>,

    /// Server-side identifier (number or string)
    #[serde(rename = "c2cItemsId", default)]
    pub id: Value,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Item {
    /// Creates an item with the given id, name and price
    pub fn new(id: impl Into<Value>, name: impl Into<String>, show_price: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            show_price: Some(show_price.into()),
            id: id.into(),
            extra: Map::new(),
        }
    }

    /// Canonical identity of the item, `None` if the server sent no id
    ///
    /// String ids are used verbatim; any other JSON value by its JSON text,
    /// so `123` and `"123"` are the same item.
    pub fn key(&self) -> Option<String> {
        match &self.id {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// The price normalized to a number, if `showPrice` holds one
    pub fn price_value(&self) -> Option<f64> {
        match self.show_price.as_ref()? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok().filter(|p| p.is_finite()),
            _ => None,
        }
    }

    /// `showPrice` rendered for display
    pub fn price_label(&self) -> String {
        match &self.show_price {
            None | Some(Value::Null) => "N/A".to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// One decoded listing page
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub items: Vec<Item>,

    /// Cursor of the following page, `None` once the listing is exhausted
    pub next_cursor: Option<Cursor>,
}

/// Inner `data` object of the response envelope
#[derive(Debug, Deserialize)]
struct PageData {
    #[serde(rename = "nextId", default)]
    next_id: Option<Cursor>,

    #[serde(default)]
    data: Option<Vec<Item>>,
}

/// Request body of the listing endpoint
#[derive(Debug, Serialize)]
struct ListingRequest<'a> {
    #[serde(rename = "nextId")]
    next_id: Option<&'a Cursor>,
}

/// Failure of a single page fetch
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// HTTP 412, the site's anti-abuse signal
    #[error("Rate limited by server (HTTP 412)")]
    RateLimited,

    /// Any other non-200 status
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// 200 response that is not JSON or lacks the data envelope
    #[error("Malformed response ({reason}): {body}")]
    MalformedResponse { reason: String, body: String },

    /// Timeout, connection reset, DNS failure and the like
    #[error("Transport failure: {0}")]
    Transport(String),
}

impl FetchError {
    /// Returns true if the same cursor should be requested again
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited | Self::Transport(_))
    }
}

/// Source of listing pages
///
/// The scan loop only talks to this trait, so tests can script page
/// sequences without a server.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetches the page at `cursor`, or the first page when `cursor` is `None`
    async fn fetch(&self, cursor: Option<&Cursor>) -> Result<Page, FetchError>;
}

/// Builds an HTTP client carrying the browser headers and the session token
///
/// The token is forwarded verbatim in the `cookie` header and is never
/// parsed. It is marked sensitive so it does not show up in debug output.
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(ScanError)` - The token is not a valid header value, or the
///   client could not be built
pub fn build_http_client(config: &ApiConfig, session_token: &str) -> Result<Client, ScanError> {
    let mut headers = HeaderMap::new();
    for (name, value) in STATIC_HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }

    let mut cookie =
        HeaderValue::from_str(session_token).map_err(|_| ScanError::InvalidHeader {
            name: COOKIE.to_string(),
        })?;
    cookie.set_sensitive(true);
    headers.insert(COOKIE, cookie);

    let client = Client::builder()
        .user_agent(BROWSER_USER_AGENT)
        .default_headers(headers)
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

/// Fetches listing pages from the marketplace over HTTP
#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    client: Client,
    endpoint: String,
}

impl HttpPageFetcher {
    /// Creates a fetcher for `config.endpoint` authenticated with `session_token`
    pub fn new(config: &ApiConfig, session_token: &str) -> Result<Self, ScanError> {
        Ok(Self {
            client: build_http_client(config, session_token)?,
            endpoint: config.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl PageSource for HttpPageFetcher {
    /// # Status Handling
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | HTTP 200 + envelope | `Ok(Page)` |
    /// | HTTP 200, bad body | `MalformedResponse` |
    /// | HTTP 412 | `RateLimited` |
    /// | Other status | `HttpStatus` |
    /// | Timeout / connect / body read | `Transport` |
    async fn fetch(&self, cursor: Option<&Cursor>) -> Result<Page, FetchError> {
        tracing::debug!(
            "POST {} (nextId: {})",
            self.endpoint,
            cursor.map(Cursor::as_str).unwrap_or("null")
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(&ListingRequest { next_id: cursor })
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();

        if status == StatusCode::PRECONDITION_FAILED {
            return Err(FetchError::RateLimited);
        }

        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(classify_transport_error)?;
        parse_page(&body)
    }
}

/// Decodes a listing response body into a [`Page`]
///
/// A missing or `null` item list is an empty page; a missing `nextId` is
/// the end of the listing.
pub fn parse_page(body: &str) -> Result<Page, FetchError> {
    let malformed = |reason: String| FetchError::MalformedResponse {
        reason,
        body: body.to_string(),
    };

    let value: Value =
        serde_json::from_str(body).map_err(|e| malformed(format!("invalid JSON: {}", e)))?;

    let data = match value.get("data") {
        Some(data @ Value::Object(_)) => data.clone(),
        _ => return Err(malformed("missing data envelope".to_string())),
    };

    let page: PageData = serde_json::from_value(data)
        .map_err(|e| malformed(format!("unexpected data shape: {}", e)))?;

    Ok(Page {
        items: page.data.unwrap_or_default(),
        next_cursor: page.next_id,
    })
}

fn classify_transport_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Transport("Request timeout".to_string())
    } else if e.is_connect() {
        FetchError::Transport(format!("Connection failed: {}", e))
    } else {
        FetchError::Transport(e.to_string())
    }
}

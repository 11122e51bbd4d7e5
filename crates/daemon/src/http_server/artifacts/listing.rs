use askama::Template;
use axum::body::Body;
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;

use common::prelude::{Listing, Principal, StorePath};
use url::Url;

use crate::http_server::error::StoreError;
use crate::http_server::handlers::wants_json;
use crate::http_server::STORE_PREFIX;
use crate::ServiceState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Html,
}

impl Format {
    pub fn negotiate(headers: &HeaderMap) -> Self {
        if wants_json(headers) {
            Format::Json
        } else {
            Format::Html
        }
    }
}

/// Row of the HTML listing
#[derive(Debug, Clone)]
pub struct EntryDisplayInfo {
    pub name: String,
    pub href: String,
    pub size_formatted: String,
    pub is_dir: bool,
}

#[derive(Template)]
#[template(path = "pages/listing.html")]
pub struct ListingTemplate {
    pub directory: String,
    pub parent_href: Option<String>,
    pub entries: Vec<EntryDisplayInfo>,
    pub size_formatted: String,
}

impl ListingTemplate {
    fn new(listing: &Listing, path: &StorePath) -> Result<Self, StoreError> {
        let here: Vec<&str> = segments(path).collect();

        let mut entries = Vec::with_capacity(listing.directories.len() + listing.files.len());
        for name in &listing.directories {
            entries.push(EntryDisplayInfo {
                name: format!("{}/", name),
                href: store_href(here.iter().copied().chain([name.as_str()]), true)?,
                size_formatted: String::new(),
                is_dir: true,
            });
        }
        for (name, size) in &listing.files {
            entries.push(EntryDisplayInfo {
                name: name.clone(),
                href: store_href(here.iter().copied().chain([name.as_str()]), false)?,
                size_formatted: format_bytes(*size),
                is_dir: false,
            });
        }

        let parent_href = match path.parent() {
            Some(parent) => Some(store_href(segments(&parent), true)?),
            None => None,
        };

        Ok(Self {
            directory: listing.directory.clone(),
            parent_href,
            entries,
            size_formatted: format_bytes(listing.size),
        })
    }
}

fn segments(path: &StorePath) -> impl Iterator<Item = &str> {
    path.as_str().split('/').filter(|segment| !segment.is_empty())
}

/// Percent-encoded link to `segments` under the store prefix.
fn store_href<'a>(
    segments: impl IntoIterator<Item = &'a str>,
    directory: bool,
) -> Result<String, StoreError> {
    let mut url =
        Url::parse("http://localhost/").map_err(|e| StoreError::Internal(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| StoreError::Internal("listing link base has no path".to_string()))?
        .clear()
        .push(STORE_PREFIX.trim_start_matches('/'))
        .extend(segments)
        .extend(directory.then_some(""));
    Ok(url.path().to_string())
}

pub async fn respond(
    state: &ServiceState,
    path: &StorePath,
    principal: &Principal,
    format: Format,
    head: bool,
) -> Result<Response, StoreError> {
    let listing = state.catalog().list(path, principal).await?;

    let (content_type, body) = match format {
        Format::Json => (
            "application/json",
            serde_json::to_vec(&listing).map_err(|e| StoreError::Internal(e.to_string()))?,
        ),
        Format::Html => (
            "text/html; charset=utf-8",
            ListingTemplate::new(&listing, path)?
                .render()
                .map_err(|e| StoreError::Internal(e.to_string()))?
                .into_bytes(),
        ),
    };

    let length = body.len();
    let body = if head { Body::empty() } else { Body::from(body) };

    let mut response = Response::new(body);
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
    Ok(response)
}

/// Human readable size, binary units.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

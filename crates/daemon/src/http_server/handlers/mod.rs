mod not_found;

use axum::http::header::ACCEPT;
use axum::http::HeaderMap;

pub use not_found::not_found_handler;

/// Whether the client prefers JSON over HTML.
///
/// Simple heuristic: `application/json` present and listed before
/// `text/html` (or `text/html` absent).
pub fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(ACCEPT)
        .and_then(|h| h.to_str().ok())
        .map(|accept| {
            let json_pos = accept.find("application/json");
            let html_pos = accept.find("text/html");
            match (json_pos, html_pos) {
                (Some(j), Some(h)) => j < h,
                (Some(_), None) => true,
                _ => false,
            }
        })
        .unwrap_or(false)
}

use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, Uri};

const TOKEN_PARAM: &str = "token";

/// The token secret a request carries, if any.
///
/// The `token` query parameter wins over an `Authorization: Bearer` header.
/// Malformed input is treated as no token at all.
pub fn from_request(uri: &Uri, headers: &HeaderMap) -> Option<String> {
    from_query(uri.query()).or_else(|| from_authorization(headers))
}

fn from_query(query: Option<&str>) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == TOKEN_PARAM)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn from_authorization(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, secret) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(secret.trim().to_string()).filter(|secret| !secret.is_empty())
}

use axum::body::Body;
use axum::extract::Request;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::Response;
use tower::ServiceExt;
use tower_http::services::ServeFile;

use common::blobs::content_type;
use common::prelude::{Principal, StorePath};

use crate::http_server::error::StoreError;
use crate::ServiceState;

pub const CONTENT_MD5: HeaderName = HeaderName::from_static("content-md5");

/// Stream one artifact.
///
/// Ranges, conditional requests and HEAD are handled by [`ServeFile`]. The
/// checksum covers the whole blob, so it is only attached to full responses.
pub async fn respond(
    state: &ServiceState,
    path: &StorePath,
    principal: &Principal,
    request: Request,
) -> Result<Response, StoreError> {
    let artifact = state.catalog().locate(path, principal).await?;
    let blobs = state.blobs();
    let blob = blobs.open(&artifact).await?;
    let mime = content_type(artifact.key());

    let response = ServeFile::new_with_mime(blob.path(), &mime)
        .with_buf_chunk_size(blobs.chunk_size())
        .oneshot(request)
        .await
        .map_err(|e| StoreError::Internal(e.to_string()))?;

    match response.status() {
        // removed between open and serve
        StatusCode::NOT_FOUND => Err(StoreError::Inconsistent(artifact.key().to_string())),
        StatusCode::OK => {
            let checksum = blobs.checksum(&blob).await?;
            let (mut parts, body) = response.into_parts();
            let value = HeaderValue::from_str(&checksum.to_base64())
                .map_err(|e| StoreError::Internal(e.to_string()))?;
            parts.headers.insert(CONTENT_MD5, value);
            Ok(Response::from_parts(parts, Body::new(body)))
        }
        _ => Ok(response.map(Body::new)),
    }
}

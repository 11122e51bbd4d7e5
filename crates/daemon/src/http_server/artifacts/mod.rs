use axum::extract::rejection::PathRejection;
use axum::extract::{Path, Request, State};
use axum::response::Response;
use http::Method;

use common::prelude::RequestTarget;

use super::error::StoreError;
use crate::ServiceState;

mod download;
mod listing;
mod token;

/// Handler for the store root (`/artifacts` and `/artifacts/`)
pub async fn root_handler(
    State(state): State<ServiceState>,
    request: Request,
) -> Result<Response, StoreError> {
    serve(&state, Ok(""), request).await
}

pub async fn handler(
    State(state): State<ServiceState>,
    path: Result<Path<String>, PathRejection>,
    request: Request,
) -> Result<Response, StoreError> {
    match path {
        Ok(Path(path)) => serve(&state, Ok(&path), request).await,
        Err(rejection) => serve(&state, Err(rejection), request).await,
    }
}

async fn serve(
    state: &ServiceState,
    raw_path: Result<&str, PathRejection>,
    request: Request,
) -> Result<Response, StoreError> {
    let method = request.method().clone();
    if method != Method::GET && method != Method::HEAD {
        return Err(StoreError::MethodNotAllowed);
    }

    // percent-decoding to invalid UTF-8 names nothing in the store
    let raw_path = raw_path.map_err(|rejection| {
        tracing::debug!(%rejection, "undecodable store path");
        StoreError::NotFound
    })?;
    let target = RequestTarget::parse(raw_path)?;
    let token = token::from_request(request.uri(), request.headers());
    let principal = state.catalog().resolve_principal(token.as_deref()).await;
    tracing::debug!(
        path = %target.path(),
        anonymous = principal.is_anonymous(),
        "store request"
    );

    match target {
        RequestTarget::Listing(path) => {
            let format = listing::Format::negotiate(request.headers());
            listing::respond(state, &path, &principal, format, method == Method::HEAD).await
        }
        RequestTarget::File(path) => download::respond(state, &path, &principal, request).await,
    }
}

//! Request dispatcher.
//!
//! # Flow per request
//! ```text
//! /{domain}{path}?{query}
//!     → ProxyTarget (scheme from the inbound connection)
//!     → cache hit?  yes → cached body, done
//!     → forward: same method, headers, body → upstream (bounded timeout)
//!     → copy upstream headers
//!     → text/html? rewrite links : pass through
//!     → cache store → respond
//! ```
//!
//! Nothing is cached unless the whole body was read and, for HTML,
//! rewritten successfully. No retries.

use std::time::Instant;

use axum::{
    body::{Body, Bytes},
    extract::{ConnectInfo, State},
    http::{
        header::{CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE, HOST, TRANSFER_ENCODING},
        HeaderMap, Request,
    },
    response::{IntoResponse, Response},
};

use crate::error::{ProxyError, ProxyResult};
use crate::http::server::AppState;
use crate::http::target::ProxyTarget;
use crate::net::{InboundConnection, Scheme};
use crate::observability::metrics::{self, ResponseSource};
use crate::rewrite::html::rewrite_html;

/// Entry point for every inbound request.
pub async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let scheme = request
        .extensions()
        .get::<ConnectInfo<InboundConnection>>()
        .map(|ConnectInfo(conn)| conn.scheme())
        .unwrap_or(Scheme::Http);
    let target = ProxyTarget::from_uri(request.uri(), scheme);
    let target_url = target.url();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        target_url = %target_url,
        "Proxying request"
    );

    if let Some(cached) = state.cache.get(&target_url) {
        metrics::record_cache_lookup(true);
        tracing::info!(request_id = %request_id, target_url = %target_url, "Cache hit");
        let response = Response::new(Body::from(cached));
        metrics::record_request(&method, response.status().as_u16(), ResponseSource::Cache, start_time);
        return response;
    }
    metrics::record_cache_lookup(false);

    match forward(&state, &target, request).await {
        Ok(response) => {
            metrics::record_request(&method, response.status().as_u16(), ResponseSource::Upstream, start_time);
            response
        }
        Err(e) => {
            if e.status_code().is_server_error() {
                tracing::error!(request_id = %request_id, target_url = %target_url, error = %e, "Upstream request failed");
            } else {
                tracing::warn!(request_id = %request_id, target_url = %target_url, error = %e, "Rejected request");
            }
            metrics::record_upstream_error(e.kind());
            let response = e.into_response();
            metrics::record_request(&method, response.status().as_u16(), ResponseSource::Upstream, start_time);
            response
        }
    }
}

/// Fetch `target` upstream, rewrite if HTML, store in the cache.
async fn forward(state: &AppState, target: &ProxyTarget, request: Request<Body>) -> ProxyResult<Response> {
    let url = target.upstream_url()?;
    let target_url = url.to_string();

    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, state.max_body_bytes)
        .await
        .map_err(ProxyError::RequestBody)?;

    tracing::info!(target_url = %target_url, "Fetching upstream");

    let upstream = state
        .client
        .request(parts.method, url)
        .headers(forwarded_headers(&parts.headers))
        .body(body)
        .send()
        .await
        .map_err(ProxyError::UpstreamUnavailable)?;

    let status = upstream.status();
    let headers = upstream.headers().clone();
    let mut response = Response::new(Body::empty());
    copy_response_headers(&headers, response.headers_mut());

    let raw = read_body(upstream, state.max_body_bytes).await?;

    let body = if is_html(&headers) {
        if is_encoded(&headers) {
            tracing::warn!(
                target_url = %target_url,
                content_encoding = ?headers.get(CONTENT_ENCODING),
                "HTML in an undecodable encoding passed through without rewriting"
            );
            raw
        } else {
            let document = rewrite_html(&raw, target.domain(), target.scheme())?;
            tracing::debug!(
                target_url = %target_url,
                links_rewritten = document.links_rewritten,
                "Rewrote HTML"
            );
            document.body
        }
    } else {
        raw
    };

    state.cache.set(target.url(), body.clone());
    tracing::debug!(target_url = %target_url, upstream_status = %status, bytes = body.len(), "Cached response");

    *response.body_mut() = Body::from(body);
    Ok(response)
}

/// Inbound headers to send upstream: every name and value in order. `Host`
/// is left to the client, which derives it from the target URL.
fn forwarded_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(inbound.len());
    for (name, value) in inbound.iter() {
        if name == HOST {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    headers
}

/// Copy upstream response headers, all values per name. Framing headers are
/// recomputed for the buffered (and possibly rewritten) body.
fn copy_response_headers(upstream: &HeaderMap, client: &mut HeaderMap) {
    for (name, value) in upstream.iter() {
        if name == CONTENT_LENGTH || name == TRANSFER_ENCODING {
            continue;
        }
        client.append(name.clone(), value.clone());
    }
}

fn is_html(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("text/html"))
}

/// Still encoded after the client's transparent gzip/brotli/deflate/zstd
/// decoding, which strips `Content-Encoding` from what it decodes.
fn is_encoded(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|enc| !enc.trim().eq_ignore_ascii_case("identity"))
}

/// Buffer the whole upstream body, bounded by `limit`.
async fn read_body(mut upstream: reqwest::Response, limit: usize) -> ProxyResult<Bytes> {
    if upstream.content_length().is_some_and(|len| len > limit as u64) {
        return Err(ProxyError::BodyTooLarge { limit });
    }

    let mut body = Vec::new();
    while let Some(chunk) = upstream.chunk().await.map_err(ProxyError::BodyRead)? {
        if body.len() + chunk.len() > limit {
            return Err(ProxyError::BodyTooLarge { limit });
        }
        body.extend_from_slice(&chunk);
    }
    Ok(Bytes::from(body))
}

//! Decoding of the path-prefix addressing scheme.
//!
//! An inbound request for `/{domain}/{rest}?{query}` targets
//! `{scheme}://{domain}/{rest}?{query}` upstream. This is the inverse of
//! what the link rewriter produces.

use axum::http::Uri;
use url::Url;

use crate::error::{ProxyError, ProxyResult};
use crate::net::Scheme;

/// Upstream target derived from one inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyTarget {
    domain: String,
    path: String,
    query: Option<String>,
    scheme: Scheme,
}

/// Split an inbound path into `(domain, path)`.
///
/// The domain is the first segment; the path is the remainder with its
/// leading slash, `/` when there is none. `/` alone gives an empty domain.
pub fn decode_path(path: &str) -> (&str, String) {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    match trimmed.split_once('/') {
        Some((domain, rest)) => (domain, format!("/{}", rest)),
        None => (trimmed, "/".to_string()),
    }
}

impl ProxyTarget {
    /// Build the target for an inbound request URI.
    pub fn from_uri(uri: &Uri, scheme: Scheme) -> Self {
        let (domain, path) = decode_path(uri.path());
        Self {
            domain: domain.to_string(),
            path,
            query: uri.query().map(str::to_string),
            scheme,
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// The resolved upstream URL as a string; also the cache key.
    pub fn url(&self) -> String {
        match &self.query {
            Some(query) => format!("{}://{}{}?{}", self.scheme, self.domain, self.path, query),
            None => format!("{}://{}{}", self.scheme, self.domain, self.path),
        }
    }

    /// Parse the upstream URL, rejecting targets that name no host.
    pub fn upstream_url(&self) -> ProxyResult<Url> {
        if self.domain.is_empty() {
            return Err(ProxyError::BadRequest("request path names no upstream domain".into()));
        }
        let target = self.url();
        Url::parse(&target)
            .map_err(|e| ProxyError::BadRequest(format!("invalid upstream URL {}: {}", target, e)))
    }
}

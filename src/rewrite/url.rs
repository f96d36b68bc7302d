//! Classification and rewriting of URLs found in markup.
//!
//! Every rewrite converges on the path-prefix form `/{host}{path}`, the one
//! addressing scheme the dispatcher knows how to decode.
//!
//! # Decision order (first match wins)
//! 1. empty, `javascript:` or `mailto:` → unchanged
//! 2. unparseable, or an invalid `%` escape outside the query → unchanged
//!    (logged)
//! 3. relative without a leading `/` → unchanged, the browser resolves it
//!    against the already-proxied page URL
//! 4. protocol-relative (`//host/...`) → re-parsed with the page scheme
//! 5. absolute → `/` + host + path [+ `?query`] [+ `#fragment`]
//! 6. root-relative (`/...`) → `/` + current domain + original
//! 7. anything else → unchanged

use std::fmt::Write;

use url::{ParseError, Url};

use crate::net::Scheme;

const IGNORED_PREFIXES: [&str; 2] = ["javascript:", "mailto:"];

/// How a link reference is treated by the rewriter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// Empty, `javascript:` or `mailto:`.
    Ignored,
    /// Relative link without a leading slash.
    Relative,
    ProtocolRelative,
    Absolute,
    RootRelative,
    /// Absolute URL without a host, e.g. `data:` or `tel:`.
    Opaque,
    /// Could not be parsed at all.
    Malformed,
}

impl LinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkKind::Ignored => "ignored",
            LinkKind::Relative => "relative",
            LinkKind::ProtocolRelative => "protocol_relative",
            LinkKind::Absolute => "absolute",
            LinkKind::RootRelative => "root_relative",
            LinkKind::Opaque => "opaque",
            LinkKind::Malformed => "malformed",
        }
    }
}

/// Outcome of rewriting a single link. A link that cannot be handled is
/// `Unchanged`; there is no error variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkRewrite {
    /// The proxied form, and the rule that produced it.
    Rewritten { link: String, kind: LinkKind },
    Unchanged,
}

impl LinkRewrite {
    pub fn is_rewritten(&self) -> bool {
        matches!(self, LinkRewrite::Rewritten { .. })
    }

    /// The final link text, falling back to `original` when unchanged.
    pub fn into_string(self, original: &str) -> String {
        match self {
            LinkRewrite::Rewritten { link, .. } => link,
            LinkRewrite::Unchanged => original.to_string(),
        }
    }
}

fn is_ignored(original: &str) -> bool {
    original.is_empty() || IGNORED_PREFIXES.iter().any(|p| original.starts_with(p))
}

/// A `%` not followed by two hex digits in the path or fragment. The query
/// is opaque and never checked.
fn has_invalid_escape(original: &str) -> bool {
    let (rest, fragment) = original.split_once('#').unwrap_or((original, ""));
    let path = rest.split_once('?').map_or(rest, |(path, _)| path);

    [path, fragment].iter().any(|part| {
        let bytes = part.as_bytes();
        bytes.iter().enumerate().any(|(i, &b)| {
            b == b'%'
                && !(bytes.get(i + 1).is_some_and(u8::is_ascii_hexdigit)
                    && bytes.get(i + 2).is_some_and(u8::is_ascii_hexdigit))
        })
    })
}

/// A classified link; the absolute kinds carry their parsed form.
struct Classified {
    kind: LinkKind,
    url: Option<Url>,
}

impl Classified {
    fn new(kind: LinkKind) -> Self {
        Self { kind, url: None }
    }
}

fn inspect(original: &str, scheme: Scheme) -> Classified {
    if is_ignored(original) {
        return Classified::new(LinkKind::Ignored);
    }
    if has_invalid_escape(original) {
        return Classified::new(LinkKind::Malformed);
    }

    match Url::parse(original) {
        Ok(url) if url.has_host() => Classified {
            kind: LinkKind::Absolute,
            url: Some(url),
        },
        Ok(_) => Classified::new(LinkKind::Opaque),
        Err(ParseError::RelativeUrlWithoutBase) if original.starts_with("//") => {
            match Url::parse(&format!("{}:{}", scheme, original)) {
                Ok(url) => Classified {
                    kind: LinkKind::ProtocolRelative,
                    url: Some(url),
                },
                Err(_) => Classified::new(LinkKind::Malformed),
            }
        }
        Err(ParseError::RelativeUrlWithoutBase) if original.starts_with('/') => {
            Classified::new(LinkKind::RootRelative)
        }
        Err(ParseError::RelativeUrlWithoutBase) => Classified::new(LinkKind::Relative),
        Err(_) => Classified::new(LinkKind::Malformed),
    }
}

/// Classify a link without rewriting it.
pub fn classify(original: &str) -> LinkKind {
    inspect(original, Scheme::Http).kind
}

/// Rewrite `original` so that following it re-enters the proxy.
///
/// `domain` is the upstream host of the page the link was found on and
/// anchors root-relative links; `scheme` resolves protocol-relative ones.
pub fn rewrite_link(original: &str, domain: &str, scheme: Scheme) -> LinkRewrite {
    let Classified { kind, url } = inspect(original, scheme);

    let link = match kind {
        LinkKind::RootRelative => Some(format!("/{}{}", domain, original)),
        LinkKind::Absolute | LinkKind::ProtocolRelative => url.as_ref().and_then(collapse),
        LinkKind::Malformed => {
            tracing::warn!(url = %original, "Failed to parse link");
            None
        }
        LinkKind::Ignored | LinkKind::Relative | LinkKind::Opaque => None,
    };

    match link {
        Some(link) => LinkRewrite::Rewritten { link, kind },
        None => LinkRewrite::Unchanged,
    }
}

/// String form of [`rewrite_link`]: the rewritten link, or the input as is.
pub fn rewrite_url(original: &str, domain: &str, scheme: Scheme) -> String {
    rewrite_link(original, domain, scheme).into_string(original)
}

/// `/host[:port]/path[?query][#fragment]` for an absolute URL with a host.
fn collapse(url: &Url) -> Option<String> {
    let host = url.host_str()?;

    let mut link = String::with_capacity(url.as_str().len());
    link.push('/');
    link.push_str(host);
    if let Some(port) = url.port() {
        let _ = write!(link, ":{}", port);
    }
    link.push_str(url.path());
    if let Some(query) = url.query().filter(|q| !q.is_empty()) {
        link.push('?');
        link.push_str(query);
    }
    if let Some(fragment) = url.fragment().filter(|f| !f.is_empty()) {
        link.push('#');
        link.push_str(fragment);
    }
    Some(link)
}

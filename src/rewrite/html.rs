//! Rewriting of link-bearing attributes in HTML documents.
//!
//! Only four element/attribute pairs are touched:
//!
//! | element  | attribute |
//! |----------|-----------|
//! | `a`      | `href`    |
//! | `link`   | `href`    |
//! | `img`    | `src`     |
//! | `script` | `src`     |
//!
//! Text, comments, every other attribute, inline CSS and `srcset` are
//! emitted exactly as received. The tokenizer is lenient, so any byte input
//! yields a document; errors are limited to the byte stream itself.

use std::cell::Cell;

use axum::body::Bytes;
use lol_html::html_content::Element;
use lol_html::{element, HandlerResult, HtmlRewriter, Settings};

use crate::error::ProxyError;
use crate::net::Scheme;
use crate::observability::metrics;
use crate::rewrite::url::{rewrite_link, LinkRewrite};

/// A rewritten document and how many links changed in it.
#[derive(Debug, Clone)]
pub struct RewrittenDocument {
    pub body: Bytes,
    pub links_rewritten: usize,
}

struct LinkContext<'a> {
    domain: &'a str,
    scheme: Scheme,
    rewritten: Cell<usize>,
}

fn rewrite_attribute(el: &mut Element<'_, '_>, attr: &str, ctx: &LinkContext<'_>) -> HandlerResult {
    let Some(original) = el.get_attribute(attr) else {
        return Ok(());
    };

    if let LinkRewrite::Rewritten { link, kind } = rewrite_link(&original, ctx.domain, ctx.scheme) {
        if link != original {
            tracing::trace!(attribute = attr, kind = kind.as_str(), from = %original, to = %link, "Rewrote link");
            el.set_attribute(attr, &link)?;
            metrics::record_link_rewritten(kind);
            ctx.rewritten.set(ctx.rewritten.get() + 1);
        }
    }
    Ok(())
}

/// Rewrite every link in `body` so it routes back through the proxy.
///
/// `domain` is the upstream host the page was fetched from, `scheme` the
/// scheme it was fetched with.
pub fn rewrite_html(body: &[u8], domain: &str, scheme: Scheme) -> Result<RewrittenDocument, ProxyError> {
    let ctx = LinkContext {
        domain,
        scheme,
        rewritten: Cell::new(0),
    };
    let mut output = Vec::with_capacity(body.len());

    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![
                element!("a[href]", |el| rewrite_attribute(el, "href", &ctx)),
                element!("link[href]", |el| rewrite_attribute(el, "href", &ctx)),
                element!("img[src]", |el| rewrite_attribute(el, "src", &ctx)),
                element!("script[src]", |el| rewrite_attribute(el, "src", &ctx)),
            ],
            ..Settings::new()
        },
        |chunk: &[u8]| output.extend_from_slice(chunk),
    );

    rewriter.write(body)?;
    rewriter.end()?;

    Ok(RewrittenDocument {
        body: Bytes::from(output),
        links_rewritten: ctx.rewritten.get(),
    })
}

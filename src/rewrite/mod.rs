//! Link rewriting subsystem.
//!
//! # Data Flow
//! ```text
//! upstream HTML body (fully buffered)
//!     → html.rs (tokenize, select a/link/img/script attributes)
//!     → url.rs (classify + rewrite each link, fail-open)
//!     → rewritten bytes, ready for the cache and the client
//! ```

pub mod html;
pub mod url;

pub use self::html::{rewrite_html, RewrittenDocument};
pub use self::url::{classify, rewrite_link, rewrite_url, LinkKind, LinkRewrite};

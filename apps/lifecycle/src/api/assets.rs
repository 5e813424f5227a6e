//! # Static Asset Server
//!
//! Serves the pre-built front-end bundle. A path that names a file under
//! the asset root gets that file verbatim, with its content type guessed
//! from the extension. Every other path gets the root's `index.html` so
//! client-side routes resolve to the app shell. Directories are never
//! listed or redirected: with or without a trailing slash they answer 200
//! with the app shell, and `/` is the shell itself.
//!
//! Paths with `..` or other non-normal components are rejected by `ServeDir`
//! before touching the filesystem and fall through to the app shell too.

use std::path::Path;
use tower_http::services::{ServeDir, ServeFile};

/// Name of the single-page application entry document.
pub const INDEX_DOCUMENT: &str = "index.html";

/// Build the asset service for `root`.
pub fn spa_service(root: &Path) -> ServeDir<ServeFile> {
    let index = root.join(INDEX_DOCUMENT);
    if !index.is_file() {
        tracing::warn!(
            "Asset root {:?} has no {}; unmatched paths will return 404",
            root,
            INDEX_DOCUMENT
        );
    }

    ServeDir::new(root)
        .append_index_html_on_directories(false)
        .fallback(ServeFile::new(index))
}

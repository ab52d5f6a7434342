//! Page retrieval and HTML preparation.
//!
//! [`ContentFetcher`] returns raw HTML; [`Page::parse`] turns it into a
//! title plus a boilerplate-stripped document ready for normalization.

pub mod boilerplate;
mod http;

use scraper::Html;

use crate::error::FetchError;

pub use boilerplate::TITLE_NOT_FOUND;
pub use http::{HttpFetcher, MAX_REDIRECTS};

/// Retrieves the raw HTML of a URL.
pub trait ContentFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// A fetched page after title extraction and boilerplate removal.
pub struct Page {
    pub title: String,
    pub document: Html,
}

impl Page {
    /// Parses `html`, extracts the title, then strips boilerplate.
    ///
    /// The title is read before stripping so that a `<h1>` inside a
    /// `<header>` still counts.
    pub fn parse(html: &str) -> Self {
        let mut document = Html::parse_document(html);
        let title = boilerplate::extract_title(&document);
        let removed = boilerplate::strip(&mut document);
        log::trace!("Stripped {} boilerplate elements", removed);

        Self { title, document }
    }
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page").field("title", &self.title).finish_non_exhaustive()
    }
}

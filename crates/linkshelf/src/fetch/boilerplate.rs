//! Heuristic boilerplate removal and title extraction on a parsed document.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Node, Selector};

/// Returned when neither `<title>` nor `<h1>` carries any text.
pub const TITLE_NOT_FOUND: &str = "title not found";

/// Elements dropped regardless of their attributes.
const ALWAYS_REMOVED: &[&str] = &["script", "style", "noscript", "iframe", "aside"];

/// Document skeleton elements. These are never removed by attribute matching,
/// otherwise `<body class="has-header">` would empty the page.
const STRUCTURAL: &[&str] = &["html", "head", "body", "title"];

static RE_BOILERPLATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)footer|header|navigation|nav|sidebar|menu").unwrap());

/// Best-effort page title: first non-empty `<title>`, then first non-empty
/// `<h1>`, else [`TITLE_NOT_FOUND`]. Never fails.
pub fn extract_title(document: &Html) -> String {
    first_text(document, "title")
        .or_else(|| first_text(document, "h1"))
        .unwrap_or_else(|| TITLE_NOT_FOUND.to_string())
}

fn first_text(document: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    document
        .select(&sel)
        .map(|el| {
            el.text()
                .collect::<Vec<_>>()
                .join(" ")
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .find(|text| !text.is_empty())
}

fn is_boilerplate(node: &Node) -> bool {
    let Some(element) = node.as_element() else {
        return false;
    };
    let name = element.name();

    if ALWAYS_REMOVED.contains(&name) {
        return true;
    }
    if STRUCTURAL.contains(&name) {
        return false;
    }

    let pattern = &*RE_BOILERPLATE;
    if pattern.is_match(name) {
        return true;
    }
    if element.id().is_some_and(|id| pattern.is_match(id)) {
        return true;
    }
    element.classes().any(|class| pattern.is_match(class))
}

/// Removes navigation-like and non-content elements in place.
///
/// Returns the number of subtrees detached. Matching is lossy: an element
/// whose class merely contains "nav" or "menu" is dropped with its children.
pub fn strip(document: &mut Html) -> usize {
    let ids: Vec<_> = document
        .tree
        .nodes()
        .filter(|node| is_boilerplate(node.value()))
        .map(|node| node.id())
        .collect();

    for id in &ids {
        if let Some(mut node) = document.tree.get_mut(*id) {
            node.detach();
        }
    }

    ids.len()
}

//! Title ↔ node-id normalization.
//!
//! Article titles travel in two spellings: the display form with spaces
//! (`Graph theory`) and the canonical id with underscores (`Graph_theory`),
//! which is also what the links backend and Wikipedia URLs expect.

use std::sync::OnceLock;

use regex::Regex;
use reqwest::Url;

use crate::types::NodeId;

const WIKIPEDIA_ARTICLE_BASE: &str = "https://en.wikipedia.org/wiki/";

fn whitespace_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("whitespace pattern is valid"))
}

/// Canonical node id for a title: every whitespace run becomes one `_`.
///
/// ```
/// use wikigraph::title::normalize_title;
/// assert_eq!(normalize_title("Graph theory"), "Graph_theory");
/// assert_eq!(normalize_title("Tree  (graph\ttheory)"), "Tree_(graph_theory)");
/// ```
pub fn normalize_title(title: &str) -> NodeId {
    whitespace_run().replace_all(title, "_").into_owned()
}

/// Display form of a node id: every `_` becomes a space.
pub fn denormalize_title(id: &str) -> String {
    id.replace('_', " ")
}

/// Public Wikipedia URL for an article, percent-encoded.
pub fn article_url(title: &str) -> String {
    let normalized = normalize_title(title);
    let Ok(mut url) = Url::parse(WIKIPEDIA_ARTICLE_BASE) else {
        return format!("{WIKIPEDIA_ARTICLE_BASE}{normalized}");
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push(&normalized);
    }
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("Graph theory", "Graph_theory" ; "single space")]
    #[test_case("Graph  theory", "Graph_theory" ; "space run collapses")]
    #[test_case("Edge\t(graph\ntheory)", "Edge_(graph_theory)" ; "tabs and newlines")]
    #[test_case("Graph_theory", "Graph_theory" ; "already normalized")]
    #[test_case("", "" ; "empty")]
    #[test_case(" padded ", "_padded_" ; "edges are kept as underscores")]
    fn normalize(input: &str, expected: &str) {
        assert_eq!(normalize_title(input), expected);
    }

    #[test]
    fn denormalize_restores_spaces() {
        assert_eq!(
            denormalize_title("Vertex_(graph_theory)"),
            "Vertex (graph theory)"
        );
        assert_eq!(denormalize_title("Plain"), "Plain");
    }

    #[test]
    fn normalize_then_denormalize_is_stable_for_single_spaces() {
        let title = "Tree (graph theory)";
        assert_eq!(denormalize_title(&normalize_title(title)), title);
    }

    #[test]
    fn article_url_uses_underscores() {
        assert_eq!(
            article_url("Graph theory"),
            "https://en.wikipedia.org/wiki/Graph_theory"
        );
    }

    #[test]
    fn article_url_percent_encodes() {
        let url = article_url("C# (programming language)");
        assert!(url.starts_with("https://en.wikipedia.org/wiki/C%23_"));
        assert!(!url.contains(' '));
    }
}

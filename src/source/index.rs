//! Anchor extraction from directory index pages.

use scraper::Html;

/// Returns the `href` of every `<a>` element in `html`, in depth-first
/// document order.
///
/// Malformed markup is tolerated; whatever the HTML5 parser recovers is walked.
pub(crate) fn anchor_targets(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);

    document
        .tree
        .root()
        .descendants()
        .filter_map(|node| node.value().as_element())
        .filter(|element| element.name() == "a")
        .filter_map(|element| element.attr("href"))
        .map(str::to_string)
        .collect()
}

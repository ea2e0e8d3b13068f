use cdp_adapter::BrowserDriver;
use serde_json::Value;
use tracing::debug;

use crate::errors::PerceptionError;
use crate::model::RawNode;

/// Marker the snapshot script carries so drivers and test doubles can recognise it.
pub const SNAPSHOT_MARKER: &str = "__smokeprobeDomSnapshot";

/// Walks `document.body` and returns the raw tree consumed by [`crate::DomSummarizer`].
///
/// Only attributes the summarizer renders or needs for its visibility decision are shipped
/// back. Blacklisted tags and anything deeper than ten levels below `body` are skipped here
/// already to keep the payload small.
pub const SNAPSHOT_SCRIPT: &str = r#"(function __smokeprobeDomSnapshot() {
    const MAX_DEPTH = 10;
    const SKIP = new Set(["script", "style", "svg", "path", "noscript", "meta", "link", "iframe"]);
    const KEEP = ["id", "class", "name", "type", "placeholder", "aria-label", "role", "href",
        "title", "data-testid", "data-cy", "alt", "hidden", "aria-hidden", "style"];
    function walk(node, depth) {
        if (node.nodeType === Node.TEXT_NODE) {
            return { text: node.textContent || "" };
        }
        if (node.nodeType !== Node.ELEMENT_NODE || depth > MAX_DEPTH) {
            return null;
        }
        const tag = node.tagName.toLowerCase();
        if (SKIP.has(tag)) {
            return null;
        }
        const attrs = {};
        for (const name of KEEP) {
            if (node.hasAttribute(name)) {
                attrs[name] = node.getAttribute(name) || "";
            }
        }
        const children = [];
        for (const child of node.childNodes) {
            const out = walk(child, depth + 1);
            if (out) {
                children.push(out);
            }
        }
        return { tag, attrs, children };
    }
    return document.body ? walk(document.body, 0) : null;
})()"#;

/// Evaluates the snapshot script on the driver's main tab.
pub async fn sample_dom(driver: &dyn BrowserDriver) -> Result<RawNode, PerceptionError> {
    let value = driver.evaluate(SNAPSHOT_SCRIPT).await?;
    if value.is_null() {
        return Err(PerceptionError::EmptyPage);
    }
    debug!(bytes = value.to_string().len(), "dom snapshot sampled");
    parse_snapshot(value)
}

pub fn parse_snapshot(value: Value) -> Result<RawNode, PerceptionError> {
    serde_json::from_value(value).map_err(|err| PerceptionError::malformed(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn script_carries_marker() {
        assert!(SNAPSHOT_SCRIPT.contains(SNAPSHOT_MARKER));
    }

    #[test]
    fn parses_nested_snapshot() {
        let node = parse_snapshot(json!({
            "tag": "body",
            "attrs": {},
            "children": [
                {"text": "hi"},
                {"tag": "a", "attrs": {"href": "/x"}, "children": []}
            ]
        }))
        .unwrap();
        assert_eq!(
            node,
            RawNode::element("body")
                .child(RawNode::text("hi"))
                .child(RawNode::element("a").attr("href", "/x"))
        );
    }

    #[test]
    fn rejects_non_tree_values() {
        assert!(matches!(
            parse_snapshot(json!([1, 2])),
            Err(PerceptionError::Malformed(_))
        ));
    }
}

use std::collections::BTreeMap;

use async_trait::async_trait;
use cdp_adapter::BrowserDriver;
use smokeprobe_core_types::PageContext;
use tracing::{debug, info};

use crate::api::StructuralPerceiver;
use crate::errors::PerceptionError;
use crate::judges::hidden_by;
use crate::model::RawNode;
use crate::policy::{is_blacklisted, is_interactive, SummaryPolicy, ALLOWED_ATTRIBUTES};
use crate::sampler::sample_dom;

const ELLIPSIS: &str = "...";

/// Renders the raw DOM tree into nested `<tag attr="v">…</tag>` tokens.
#[derive(Clone, Debug, Default)]
pub struct DomSummarizer {
    policy: SummaryPolicy,
}

impl DomSummarizer {
    pub fn new(policy: SummaryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &SummaryPolicy {
        &self.policy
    }

    /// Pure rendering of an already sampled tree. The root is treated as depth 0.
    pub fn render(&self, root: &RawNode) -> String {
        self.render_node(root, 0).unwrap_or_default()
    }

    fn render_node(&self, node: &RawNode, depth: usize) -> Option<String> {
        match node {
            RawNode::Text { text } => self.render_text(text),
            RawNode::Element {
                tag,
                attrs,
                children,
            } => self.render_element(tag, attrs, children, depth),
        }
    }

    fn render_text(&self, text: &str) -> Option<String> {
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            return None;
        }
        Some(escape_text(&truncate(&collapsed, self.policy.max_text_chars)))
    }

    fn render_element(
        &self,
        tag: &str,
        attrs: &BTreeMap<String, String>,
        children: &[RawNode],
        depth: usize,
    ) -> Option<String> {
        if depth > self.policy.max_depth {
            return None;
        }
        let tag = tag.to_ascii_lowercase();
        if is_blacklisted(&tag) {
            return None;
        }
        if let Some(reason) = hidden_by(&tag, attrs) {
            debug!(tag = %tag, reason = reason.label(), "dropping hidden element");
            return None;
        }

        let rendered_attrs = self.render_attributes(attrs);
        let inner: String = children
            .iter()
            .filter_map(|child| self.render_node(child, depth + 1))
            .collect();

        if rendered_attrs.is_empty() && inner.is_empty() && !is_interactive(&tag) {
            return None;
        }
        Some(format!("<{tag}{rendered_attrs}>{inner}</{tag}>"))
    }

    fn render_attributes(&self, attrs: &BTreeMap<String, String>) -> String {
        let mut out = String::new();
        for name in ALLOWED_ATTRIBUTES {
            let Some(raw) = attrs.get(*name) else {
                continue;
            };
            let value = if *name == "class" {
                raw.split_whitespace()
                    .take(self.policy.class_tokens)
                    .collect::<Vec<_>>()
                    .join(" ")
            } else {
                raw.trim().to_string()
            };
            if value.is_empty() {
                continue;
            }
            let value = truncate(&value, self.policy.max_attr_chars);
            out.push_str(&format!(" {name}=\"{}\"", escape_attr(&value)));
        }
        out
    }
}

#[async_trait]
impl StructuralPerceiver for DomSummarizer {
    async fn summarize(
        &self,
        driver: &dyn BrowserDriver,
        max_chars: usize,
    ) -> Result<PageContext, PerceptionError> {
        let tree = sample_dom(driver).await?;
        let summary = self.render(&tree);
        if summary.is_empty() {
            return Err(PerceptionError::EmptyPage);
        }
        let context = PageContext::new(summary, max_chars);
        info!(chars = context.char_len(), max_chars, "page context built");
        Ok(context)
    }
}

fn truncate(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{ELLIPSIS}", &value[..cut]),
        None => value.to_string(),
    }
}

fn escape_attr(value: &str) -> String {
    value.replace('"', "&quot;")
}

fn escape_text(value: &str) -> String {
    value.replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summarize(node: RawNode) -> String {
        DomSummarizer::default().render(&node)
    }

    #[test]
    fn keeps_allow_listed_attributes_in_fixed_order() {
        let node = RawNode::element("body").child(
            RawNode::element("input")
                .attr("placeholder", "Search")
                .attr("onclick", "evil()")
                .attr("id", "q")
                .attr("data-testid", "search-box"),
        );
        assert_eq!(
            summarize(node),
            r#"<body><input id="q" placeholder="Search" data-testid="search-box"></input></body>"#
        );
    }

    #[test]
    fn class_keeps_first_three_tokens() {
        let node = RawNode::element("div").attr("class", "a  b c d e");
        assert_eq!(summarize(node), r#"<div class="a b c"></div>"#);
    }

    #[test]
    fn long_values_are_truncated_with_ellipsis() {
        let long = "x".repeat(150);
        let node = RawNode::element("p")
            .attr("title", long.clone())
            .child(RawNode::text(long));
        let expected = format!(
            r#"<p title="{0}...">{0}...</p>"#,
            "x".repeat(100)
        );
        assert_eq!(summarize(node), expected);
    }

    #[test]
    fn text_whitespace_is_collapsed_and_blank_text_dropped() {
        let node = RawNode::element("h1")
            .child(RawNode::text("  Hello \n   world "))
            .child(RawNode::text("   \n"));
        assert_eq!(summarize(node), "<h1>Hello world</h1>");
    }

    #[test]
    fn blacklisted_and_hidden_subtrees_disappear() {
        let node = RawNode::element("body")
            .child(RawNode::element("script").child(RawNode::text("var a = 1;")))
            .child(
                RawNode::element("div")
                    .attr("aria-hidden", "true")
                    .child(RawNode::element("button").attr("id", "ghost")),
            )
            .child(RawNode::element("input").attr("type", "hidden").attr("name", "csrf"))
            .child(RawNode::element("button").attr("id", "real"));
        assert_eq!(
            summarize(node),
            r#"<body><button id="real"></button></body>"#
        );
    }

    #[test]
    fn empty_wrappers_are_pruned_but_interactive_tags_kept() {
        let node = RawNode::element("body")
            .child(RawNode::element("div").child(RawNode::element("span")))
            .child(RawNode::element("div").child(RawNode::element("a")));
        assert_eq!(summarize(node), "<body><div><a></a></div></body>");
    }

    #[test]
    fn elements_beyond_depth_limit_are_cut() {
        let mut node = RawNode::element("button").attr("id", "deep");
        for _ in 0..11 {
            node = RawNode::element("div").child(node);
        }
        let root = RawNode::element("body").child(node);
        let rendered = summarize(root);
        assert!(!rendered.contains("deep"));
        assert!(rendered.is_empty());
    }

    #[test]
    fn depth_ten_is_still_rendered() {
        let mut node = RawNode::element("button").attr("id", "edge");
        for _ in 0..9 {
            node = RawNode::element("div").child(node);
        }
        let rendered = summarize(RawNode::element("body").child(node));
        assert!(rendered.contains(r#"<button id="edge"></button>"#));
    }

    #[test]
    fn quotes_and_angle_brackets_are_escaped() {
        let node = RawNode::element("a")
            .attr("title", r#"say "hi""#)
            .child(RawNode::text("1 < 2"));
        assert_eq!(
            summarize(node),
            r#"<a title="say &quot;hi&quot;">1 &lt; 2</a>"#
        );
    }
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Node of the raw tree returned by the in-page snapshot script.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawNode {
    Element {
        tag: String,
        #[serde(default)]
        attrs: BTreeMap<String, String>,
        #[serde(default)]
        children: Vec<RawNode>,
    },
    Text {
        text: String,
    },
}

impl RawNode {
    pub fn element(tag: impl Into<String>) -> Self {
        RawNode::Element {
            tag: tag.into(),
            attrs: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        RawNode::Text { text: text.into() }
    }

    /// Builder helper; no-op on text nodes.
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let RawNode::Element { attrs, .. } = &mut self {
            attrs.insert(key.into(), value.into());
        }
        self
    }

    /// Builder helper; no-op on text nodes.
    pub fn child(mut self, node: RawNode) -> Self {
        if let RawNode::Element { children, .. } = &mut self {
            children.push(node);
        }
        self
    }
}

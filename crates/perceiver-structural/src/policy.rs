use serde::{Deserialize, Serialize};

/// Tags removed together with their subtree.
pub const BLACKLISTED_TAGS: &[&str] = &[
    "script", "style", "svg", "path", "noscript", "meta", "link", "iframe",
];

/// Tags kept even when they carry nothing else worth showing.
pub const INTERACTIVE_TAGS: &[&str] = &["a", "button", "input", "textarea", "select", "label"];

/// Attributes carried into the summary, in output order.
pub const ALLOWED_ATTRIBUTES: &[&str] = &[
    "id",
    "class",
    "name",
    "type",
    "placeholder",
    "aria-label",
    "role",
    "href",
    "title",
    "data-testid",
    "data-cy",
    "alt",
];

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryPolicy {
    /// Deepest element depth kept, counting `body` as 0.
    pub max_depth: usize,
    pub max_text_chars: usize,
    pub max_attr_chars: usize,
    pub class_tokens: usize,
}

impl Default for SummaryPolicy {
    fn default() -> Self {
        Self {
            max_depth: 10,
            max_text_chars: 100,
            max_attr_chars: 100,
            class_tokens: 3,
        }
    }
}

pub fn is_blacklisted(tag: &str) -> bool {
    BLACKLISTED_TAGS.contains(&tag)
}

pub fn is_interactive(tag: &str) -> bool {
    INTERACTIVE_TAGS.contains(&tag)
}

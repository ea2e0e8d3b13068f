//! Visibility judgement from explicit markup only. Computed styles and geometry are never
//! consulted, so the verdict is stable across runs and cheap to produce.

use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HiddenBy {
    HiddenAttribute,
    AriaHidden,
    InlineStyle,
    HiddenInput,
}

impl HiddenBy {
    pub fn label(&self) -> &'static str {
        match self {
            HiddenBy::HiddenAttribute => "hidden_attribute",
            HiddenBy::AriaHidden => "aria_hidden",
            HiddenBy::InlineStyle => "style_hidden",
            HiddenBy::HiddenInput => "hidden_input",
        }
    }
}

/// Returns why the element is hidden, or `None` when nothing in its markup hides it.
pub fn hidden_by(tag: &str, attrs: &BTreeMap<String, String>) -> Option<HiddenBy> {
    if attrs.contains_key("hidden") {
        return Some(HiddenBy::HiddenAttribute);
    }
    if attrs
        .get("aria-hidden")
        .is_some_and(|value| value.trim().eq_ignore_ascii_case("true"))
    {
        return Some(HiddenBy::AriaHidden);
    }
    if attrs
        .get("style")
        .is_some_and(|style| inline_style_hides(style))
    {
        return Some(HiddenBy::InlineStyle);
    }
    if tag == "input"
        && attrs
            .get("type")
            .is_some_and(|ty| ty.trim().eq_ignore_ascii_case("hidden"))
    {
        return Some(HiddenBy::HiddenInput);
    }
    None
}

fn inline_style_hides(style: &str) -> bool {
    style.split(';').any(|chunk| {
        let entry: String = chunk
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        entry.starts_with("display:none") || entry.starts_with("visibility:hidden")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn hidden_attribute_hides_regardless_of_value() {
        assert_eq!(
            hidden_by("div", &attrs(&[("hidden", "")])),
            Some(HiddenBy::HiddenAttribute)
        );
    }

    #[test]
    fn aria_hidden_only_when_true() {
        assert_eq!(
            hidden_by("nav", &attrs(&[("aria-hidden", " TRUE ")])),
            Some(HiddenBy::AriaHidden)
        );
        assert_eq!(hidden_by("nav", &attrs(&[("aria-hidden", "false")])), None);
    }

    #[test]
    fn inline_style_tolerates_spacing_and_case() {
        assert_eq!(
            hidden_by("p", &attrs(&[("style", "color: red; Display : None")])),
            Some(HiddenBy::InlineStyle)
        );
        assert_eq!(
            hidden_by("p", &attrs(&[("style", "visibility:hidden")])),
            Some(HiddenBy::InlineStyle)
        );
        assert_eq!(hidden_by("p", &attrs(&[("style", "display:block")])), None);
    }

    #[test]
    fn hidden_inputs_are_dropped_but_other_types_kept() {
        assert_eq!(
            hidden_by("input", &attrs(&[("type", "hidden")])),
            Some(HiddenBy::HiddenInput)
        );
        assert_eq!(hidden_by("input", &attrs(&[("type", "text")])), None);
        assert_eq!(hidden_by("button", &attrs(&[("type", "hidden")])), None);
    }
}

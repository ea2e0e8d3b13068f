//! On-page decorations that make the screen recording readable.

const OVERLAY_ID: &str = "__smokeprobe_overlay";
const HIGHLIGHT_ATTR: &str = "data-smokeprobe-highlight";

fn literal(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

/// Banner pinned to the top right naming the running case.
pub fn show_overlay(case_id: &str, title: &str) -> String {
    format!(
        r#"(() => {{
    let box = document.getElementById({id});
    if (!box) {{
        box = document.createElement("div");
        box.id = {id};
        box.style.cssText = "position:fixed;top:8px;right:8px;z-index:2147483647;padding:6px 10px;"
            + "background:rgba(20,20,20,0.85);color:#fff;font:13px/1.4 sans-serif;border-radius:4px;"
            + "pointer-events:none;max-width:40vw;";
        (document.body || document.documentElement).appendChild(box);
    }}
    box.textContent = {label};
    return true;
}})()"#,
        id = literal(OVERLAY_ID),
        label = literal(&format!("{case_id} {title}")),
    )
}

/// Outlines the first match and scrolls it into view. Resolves to `false` when nothing matches.
pub fn highlight(selector: &str) -> String {
    format!(
        r#"(() => {{
    let el = null;
    try {{ el = document.querySelector({selector}); }} catch (_) {{ return false; }}
    if (!el) {{ return false; }}
    el.setAttribute({attr}, el.style.outline || "");
    el.style.outline = "3px solid #ff2d55";
    el.scrollIntoView({{ block: "center", inline: "center" }});
    return true;
}})()"#,
        selector = literal(selector),
        attr = literal(HIGHLIGHT_ATTR),
    )
}

/// Restores the outline saved by [`highlight`].
pub fn unhighlight(selector: &str) -> String {
    format!(
        r#"(() => {{
    let el = null;
    try {{ el = document.querySelector({selector}); }} catch (_) {{ return false; }}
    if (!el || !el.hasAttribute({attr})) {{ return false; }}
    el.style.outline = el.getAttribute({attr});
    el.removeAttribute({attr});
    return true;
}})()"#,
        selector = literal(selector),
        attr = literal(HIGHLIGHT_ATTR),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_embeds_escaped_label() {
        let script = show_overlay("TC-001", "\"quoted\" 제목");
        assert!(script.contains(r#""TC-001 \"quoted\" 제목""#));
        assert!(script.contains(OVERLAY_ID));
    }

    #[test]
    fn highlight_pairs_share_marker() {
        assert!(highlight("#logo").contains(HIGHLIGHT_ATTR));
        assert!(unhighlight("#logo").contains(HIGHLIGHT_ATTR));
        assert!(highlight("a[href='/x']").contains(r#""a[href='/x']""#));
    }
}

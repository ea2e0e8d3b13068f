//! Page-context expressions used by the Chromium driver.

fn literal(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

/// Resolves to `"missing"`, `"hidden"` or `"visible"` for the first match of `selector`.
pub(crate) fn probe_element(selector: &str) -> String {
    format!(
        r#"(() => {{
    const el = document.querySelector({selector});
    if (!el) {{ return "missing"; }}
    const style = window.getComputedStyle(el);
    const rect = el.getBoundingClientRect();
    const shown = style.display !== "none"
        && style.visibility !== "hidden"
        && Number(style.opacity || "1") > 0
        && rect.width > 0
        && rect.height > 0;
    return shown ? "visible" : "hidden";
}})()"#,
        selector = literal(selector)
    )
}

/// Clicks the first match from script. Returns `false` when nothing matched.
pub(crate) fn force_click(selector: &str) -> String {
    format!(
        r#"(() => {{
    const el = document.querySelector({selector});
    if (!el) {{ return false; }}
    el.click();
    return true;
}})()"#,
        selector = literal(selector)
    )
}

/// Sets the value through the native setter so framework-controlled inputs notice it.
pub(crate) fn fill_value(selector: &str, text: &str) -> String {
    format!(
        r#"(() => {{
    const el = document.querySelector({selector});
    if (!el) {{ return false; }}
    el.focus();
    const proto = el instanceof HTMLTextAreaElement
        ? HTMLTextAreaElement.prototype
        : el instanceof HTMLSelectElement
            ? HTMLSelectElement.prototype
            : HTMLInputElement.prototype;
    const setter = Object.getOwnPropertyDescriptor(proto, "value");
    if (setter && setter.set && (el instanceof HTMLInputElement || el instanceof HTMLTextAreaElement || el instanceof HTMLSelectElement)) {{
        setter.set.call(el, {text});
    }} else if (el.isContentEditable) {{
        el.textContent = {text};
    }} else {{
        el.value = {text};
    }}
    el.dispatchEvent(new Event("input", {{ bubbles: true }}));
    el.dispatchEvent(new Event("change", {{ bubbles: true }}));
    return true;
}})()"#,
        selector = literal(selector),
        text = literal(text)
    )
}

pub(crate) const CLEAR_STORAGE: &str = r#"(() => {
    try { window.localStorage.clear(); } catch (_) {}
    try { window.sessionStorage.clear(); } catch (_) {}
    return true;
})()"#;

//! Check primitive - assert an element is visible

use tracing::debug;

use crate::{errors::ActionError, primitives::StepContext};

/// Selectors that mean "the document title" rather than a DOM query.
const TITLE_SELECTORS: &[&str] = &["title", "document.title", "head>title"];

pub fn is_title_selector(selector: &str) -> bool {
    let compact: String = selector
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    TITLE_SELECTORS.contains(&compact.as_str())
}

pub async fn execute_check(ctx: StepContext<'_>, selector: &str) -> Result<(), ActionError> {
    if is_title_selector(selector) {
        let title = ctx.driver.title().await?;
        debug!(title = %title, "checked document title");
        return if title.trim().is_empty() {
            Err(ActionError::EmptyTitle)
        } else {
            Ok(())
        };
    }

    ctx.highlight(selector).await;
    ctx.driver
        .wait_visible(selector, ctx.config.action_timeout())
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_title_aliases() {
        assert!(is_title_selector("title"));
        assert!(is_title_selector(" Document.Title "));
        assert!(is_title_selector("head > title"));
        assert!(!is_title_selector("h1.title"));
        assert!(!is_title_selector("[title]"));
    }
}

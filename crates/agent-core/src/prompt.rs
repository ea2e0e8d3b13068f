use smokeprobe_core_types::{ActionKind, PageContext};

const ROLE: &str = "You are a senior QA engineer designing automated smoke tests for a web page. \
You only see the page structure below and must design test cases that a browser robot can execute \
literally, step by step.";

const DESIGN_RULES: &str = "\
- Prefer stable selectors: #id, [data-testid], [data-cy], [name], [aria-label], then short class chains. Never use text-matching pseudo selectors (:has-text, :text, :contains, text=) or XPath.
- Every case that clicks anything (click or clickNewTab) must verify the outcome with at least one check step.
- A case must be an end-to-end flow of several steps; a single check on its own is not a test case.
- Spread the cases across the page regions: header and navigation, main content, forms, footer.
- Links that navigate away: click them, then use checkUrl with a distinctive fragment of the destination URL.
- Links with target=\"_blank\" or buttons that open popups: use clickNewTab instead of click.
- When an action probably redirects to a login page, expect that redirect with checkUrl instead of checking the protected content.
- Use check with selector \"title\" only to verify that the document title is present.
- Use wait (value in milliseconds) only after an action that triggers loading or animation.";

/// Assembles the generation prompt. Pure string construction.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    language: String,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new("Korean")
    }
}

impl PromptBuilder {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn build(
        &self,
        context: &PageContext,
        count: usize,
        start_id: &str,
        exclude_titles: &[String],
    ) -> String {
        let mut sections = Vec::new();
        sections.push(ROLE.to_string());
        sections.push(format!("Page structure:\n{}", context.as_str()));
        sections.push(format!(
            "Task: design exactly {count} new test cases. Number them sequentially starting at {start_id}."
        ));
        if !exclude_titles.is_empty() {
            let titles = exclude_titles
                .iter()
                .map(|title| format!("- {title}"))
                .collect::<Vec<_>>()
                .join("\n");
            sections.push(format!(
                "These cases already exist. Do not repeat them or write close variations:\n{titles}"
            ));
        }
        sections.push(format!("Design rules:\n{DESIGN_RULES}"));
        sections.push(format!(
            "Write title, precondition, testStep and expectedResults in {}. Selectors and action names stay as specified.",
            self.language
        ));
        sections.push(output_contract());
        sections.join("\n\n")
    }
}

fn output_contract() -> String {
    let actions = ActionKind::ALL
        .iter()
        .map(|kind| kind.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Output format (strict):\n\
Return only a JSON array, with nothing before or after it. Each element is an object:\n\
{{\"id\": \"TC-001\", \"title\": \"...\", \"precondition\": \"...\", \"testStep\": \"1. ...\\n2. ...\", \"expectedResults\": \"...\", \
\"steps\": [{{\"action\": \"check\", \"selector\": \"#logo\", \"desc\": \"...\"}}]}}\n\
Allowed step actions: {actions}.\n\
check, click, type and clickNewTab require \"selector\". type puts the text in \"value\". \
wait puts milliseconds in \"value\". checkUrl puts the expected URL fragment in \"value\"."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> PageContext {
        PageContext::new("<body><a id=\"home\"></a></body>", 1000)
    }

    #[test]
    fn embeds_inputs_and_contract() {
        let prompt = PromptBuilder::default().build(&context(), 7, "TC-004", &[]);
        assert!(prompt.contains("<body><a id=\"home\"></a></body>"));
        assert!(prompt.contains("exactly 7 new test cases"));
        assert!(prompt.contains("starting at TC-004"));
        assert!(prompt.contains("in Korean"));
        assert!(prompt.contains("check, click, type, wait, clickNewTab, checkUrl"));
        assert!(!prompt.contains("already exist"));
    }

    #[test]
    fn lists_excluded_titles() {
        let titles = vec!["로고 확인".to_string(), "검색 동작".to_string()];
        let prompt = PromptBuilder::new("English").build(&context(), 3, "TC-003", &titles);
        assert!(prompt.contains("- 로고 확인\n- 검색 동작"));
        assert!(prompt.contains("in English"));
    }

    #[test]
    fn is_deterministic() {
        let builder = PromptBuilder::default();
        let titles = vec!["a".to_string()];
        assert_eq!(
            builder.build(&context(), 2, "TC-002", &titles),
            builder.build(&context(), 2, "TC-002", &titles)
        );
    }
}

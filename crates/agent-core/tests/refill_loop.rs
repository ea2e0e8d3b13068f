use std::sync::Arc;

use agent_core::{
    CaseValidator, GenerationClient, GenerationConfig, PromptBuilder, RefillLoop, RefillState,
    ScriptedLlmProvider,
};
use serde_json::{json, Value};
use smokeprobe_core_types::PageContext;

/// Title built from a private block of Hangul syllables so no two titles overlap.
fn distinct_title(index: usize) -> String {
    (0..4)
        .filter_map(|k| char::from_u32(0xAC00 + (index * 4 + k) as u32))
        .collect()
}

fn case_json(index: usize) -> Value {
    json!({
        "id": format!("TC-{:03}", index + 1),
        "title": distinct_title(index),
        "precondition": "메인 페이지",
        "testStep": "요소 확인 후 클릭",
        "expectedResults": "정상 동작",
        "steps": [
            {"action": "check", "selector": format!("#el-{index}")},
            {"action": "click", "selector": format!("#el-{index}")},
            {"action": "check", "selector": "body"}
        ]
    })
}

fn batch(range: std::ops::Range<usize>) -> String {
    Value::Array(range.map(case_json).collect()).to_string()
}

fn refill(provider: Arc<ScriptedLlmProvider>) -> RefillLoop {
    let config = GenerationConfig::default();
    RefillLoop::new(
        PromptBuilder::default(),
        GenerationClient::new(provider, config.clone()),
        CaseValidator::new(),
        config.batch_size,
        config.max_attempts,
    )
}

fn context() -> PageContext {
    PageContext::new("<body><button id=\"el-0\"></button></body>", 30_000)
}

#[tokio::test]
async fn always_empty_responses_exhaust_budget() {
    let provider = Arc::new(ScriptedLlmProvider::default());
    let outcome = refill(provider.clone()).generate(&context(), 5).await;

    assert_eq!(outcome.state, RefillState::Exhausted);
    assert!(outcome.cases.is_empty());
    assert_eq!(outcome.attempts, 10);
    assert_eq!(outcome.shortfall, 5);
    assert_eq!(provider.requests().await.len(), 10);
    assert!(outcome.warning(5).is_some());
}

#[tokio::test]
async fn stops_once_target_is_met_and_never_overshoots() {
    let provider = Arc::new(ScriptedLlmProvider::new([batch(0..8)]));
    let outcome = refill(provider.clone()).generate(&context(), 3).await;

    assert_eq!(outcome.state, RefillState::Satisfied);
    assert_eq!(outcome.attempts, 1);
    assert_eq!(outcome.cases.len(), 3);
    assert_eq!(outcome.shortfall, 0);
    assert!(outcome.warning(3).is_none());
    let ids: Vec<_> = outcome.cases.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["TC-001", "TC-002", "TC-003"]);
}

#[tokio::test]
async fn requests_remaining_count_and_excludes_accepted_titles() {
    let provider = Arc::new(
        ScriptedLlmProvider::new([batch(0..10)])
            .then_fail("upstream 502")
            .then_respond(batch(10..14)),
    );
    let outcome = refill(provider.clone()).generate(&context(), 14).await;

    assert_eq!(outcome.state, RefillState::Satisfied);
    assert_eq!(outcome.cases.len(), 14);
    assert_eq!(outcome.attempts, 3);
    assert_eq!(outcome.cases[13].id, "TC-014");

    let requests = provider.requests().await;
    assert!(requests[0].prompt.contains("exactly 10 new test cases"));
    assert!(requests[1].prompt.contains("exactly 4 new test cases"));
    assert!(requests[1].prompt.contains("starting at TC-011"));
    assert!(requests[1].prompt.contains(&distinct_title(9)));
    assert!(requests[2].temperature > requests[0].temperature);
}

#[tokio::test]
async fn duplicates_only_leave_a_shortfall() {
    let provider = Arc::new(ScriptedLlmProvider::repeating(batch(0..10)));
    let outcome = refill(provider).generate(&context(), 25).await;

    assert_eq!(outcome.state, RefillState::Exhausted);
    assert_eq!(outcome.cases.len(), 10);
    assert_eq!(outcome.shortfall, 15);
    assert_eq!(outcome.attempts, 10);
    assert!(outcome.usage.total_tokens > 0);
    let warning = outcome.warning(25).expect("warning");
    assert!(warning.contains("25"));
}

use std::sync::Arc;
use std::time::Duration;

use action_primitives::{ActionExecutor, ExecutionConfig};
use cdp_adapter::{
    AdapterError, AdapterErrorKind, ClickEffect, ScriptedBrowser, ScriptedElement, ScriptedPage,
};
use smokeprobe_core_types::{CaseVerdict, FailureKind, Step, TestCaseDesign};

const HOME: &str = "https://site.test/";

fn config() -> ExecutionConfig {
    ExecutionConfig {
        highlight_ms: 0,
        ..ExecutionConfig::default()
    }
}

fn site() -> ScriptedBrowser {
    ScriptedBrowser::new()
        .with_page(
            HOME,
            ScriptedPage::new("Site")
                .with_element("#logo", ScriptedElement::visible())
                .with_element("#banner", ScriptedElement::hidden())
                .with_element(".language-selector", ScriptedElement::hidden())
                .with_element("#q", ScriptedElement::visible())
                .with_element(
                    "nav.home",
                    ScriptedElement::visible()
                        .on_click(ClickEffect::Navigate("https://site.test/main".into())),
                )
                .with_element(
                    "a.docs",
                    ScriptedElement::visible()
                        .on_click(ClickEffect::OpenTab("https://docs.site.test/guide".into())),
                ),
        )
        .with_page("https://site.test/main", ScriptedPage::new("Main"))
}

fn executor(browser: Arc<ScriptedBrowser>) -> ActionExecutor {
    ActionExecutor::new(browser, HOME, config())
}

fn case(steps: Vec<Step>) -> TestCaseDesign {
    TestCaseDesign::new("TC-001", "홈 이동 확인", steps)
}

#[tokio::test]
async fn check_click_wait_check_url_passes() {
    let browser = Arc::new(site());
    let result = executor(browser.clone())
        .run(&case(vec![
            Step::check("#logo"),
            Step::click("nav.home"),
            Step::wait(1000),
            Step::check_url("/main"),
        ]))
        .await;

    assert_eq!(result.result, CaseVerdict::Pass, "{}", result.details);
    assert!(result.details.is_empty());
    assert!(result.failure_type.is_none());
    assert!(result.code.contains("\"checkUrl\""));
    assert_eq!(browser.clicks().await, vec!["nav.home".to_string()]);
}

#[tokio::test]
async fn missing_click_target_is_a_selector_failure() {
    let browser = Arc::new(site());
    let result = executor(browser)
        .run(&case(vec![Step::check("#logo"), Step::click("button.absent")]))
        .await;

    assert_eq!(result.result, CaseVerdict::Fail);
    assert_eq!(result.failure_type, Some(FailureKind::Selector));
    assert!(result.details.starts_with("step 2 (click button.absent) failed"));
    assert!(result.screenshot.is_none());
}

#[tokio::test]
async fn hidden_element_is_an_assertion_failure() {
    let browser = Arc::new(site());
    let result = executor(browser)
        .run(&case(vec![Step::check("#banner"), Step::click("#logo")]))
        .await;

    assert_eq!(result.result, CaseVerdict::Fail);
    assert_eq!(result.failure_type, Some(FailureKind::Assertion));

    let result = executor(Arc::new(site()))
        .run(&case(vec![Step::check(".language-selector"), Step::click("#logo")]))
        .await;
    assert_eq!(result.failure_type, Some(FailureKind::Assertion), "{}", result.details);
}

#[tokio::test(start_paused = true)]
async fn oversized_wait_is_clamped() {
    let browser = Arc::new(site());
    let started = tokio::time::Instant::now();
    let result = executor(browser)
        .run(&case(vec![Step::check("#logo"), Step::wait(86_400_000)]))
        .await;

    assert_eq!(result.result, CaseVerdict::Pass, "{}", result.details);
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(10_000), "{elapsed:?}");
    assert!(elapsed < Duration::from_secs(60), "{elapsed:?}");
}

#[tokio::test]
async fn click_without_check_fails_after_running() {
    let browser = Arc::new(site());
    let result = executor(browser.clone())
        .run(&case(vec![Step::wait(5), Step::click("nav.home")]))
        .await;

    assert_eq!(result.result, CaseVerdict::Fail);
    assert_eq!(result.details, "no validation step");
    assert_eq!(result.failure_type, Some(FailureKind::General));
    assert_eq!(browser.clicks().await.len(), 1);
}

#[tokio::test]
async fn empty_case_fails_with_no_steps() {
    let browser = Arc::new(site());
    let result = executor(browser).run(&case(Vec::new())).await;
    assert_eq!(result.result, CaseVerdict::Fail);
    assert_eq!(result.details, "no steps");
}

#[tokio::test]
async fn new_tab_flow_and_title_check() {
    let browser = Arc::new(site());
    let result = executor(browser.clone())
        .run(&case(vec![
            Step::check("head > title"),
            Step::type_text("#q", "배송 조회"),
            Step::click_new_tab("a.docs"),
        ]))
        .await;

    assert_eq!(result.result, CaseVerdict::Pass, "{}", result.details);
    assert_eq!(browser.open_tab_count().await, 0);
    assert_eq!(
        browser.fills().await,
        vec![("#q".to_string(), "배송 조회".to_string())]
    );
}

#[tokio::test]
async fn check_url_scans_secondary_tabs() {
    // Plain click on a target=_blank link leaves the popup open for checkUrl to find.
    let browser = Arc::new(site());
    let result = executor(browser)
        .run(&case(vec![
            Step::check("#logo"),
            Step::click("a.docs"),
            Step::check_url("docs.site.test"),
        ]))
        .await;
    assert_eq!(result.result, CaseVerdict::Pass, "{}", result.details);
}

#[tokio::test]
async fn url_mismatch_is_an_assertion_failure() {
    let browser = Arc::new(site());
    let result = executor(browser)
        .run(&case(vec![Step::check("#logo"), Step::check_url("/checkout")]))
        .await;
    assert_eq!(result.result, CaseVerdict::Fail);
    assert_eq!(result.failure_type, Some(FailureKind::Assertion));
    assert!(result.details.contains("/checkout"));
}

#[tokio::test]
async fn every_case_starts_from_a_clean_reload() {
    let browser = Arc::new(site());
    let executor = executor(browser.clone());
    let steps = vec![Step::check("#logo"), Step::click("a.docs")];
    executor.run(&case(steps.clone())).await;
    executor.run(&case(steps)).await;

    assert_eq!(browser.clear_count().await, 2);
    assert_eq!(browser.navigations().await, vec![HOME.to_string(), HOME.to_string()]);
    // the tab opened by the first case was closed before the second one ran
    assert_eq!(browser.open_tab_count().await, 1);
    assert!(browser
        .evaluations()
        .await
        .iter()
        .any(|script| script.contains("TC-001 홈 이동 확인")));
}

#[tokio::test]
async fn failed_reload_blocks_the_case() {
    let browser = Arc::new(site().fail_navigation(
        HOME,
        AdapterError::new(AdapterErrorKind::NavFailed).with_hint("net::ERR_CONNECTION_RESET"),
    ));
    let result = executor(browser)
        .run(&case(vec![Step::check("#logo"), Step::click("nav.home")]))
        .await;
    assert_eq!(result.result, CaseVerdict::Blocked);
    assert!(result.details.contains("ERR_CONNECTION_RESET"));
    assert!(result.failure_type.is_none());
}

#[tokio::test]
async fn lost_browser_marks_case_not_applicable() {
    let browser = Arc::new(site());
    browser.disconnect().await;
    let result = executor(browser)
        .run(&case(vec![Step::check("#logo"), Step::click("nav.home")]))
        .await;
    assert_eq!(result.result, CaseVerdict::NotApplicable);
}

#[tokio::test]
async fn failure_screenshot_is_written_and_referenced() {
    let dir = tempfile::tempdir().unwrap();
    let shots = dir.path().join("screenshots");
    let browser = Arc::new(site());
    let result = executor(browser)
        .with_screenshot_dir(&shots)
        .run(&case(vec![Step::check("#nowhere"), Step::click("#logo")]))
        .await;

    assert_eq!(result.result, CaseVerdict::Fail);
    assert_eq!(result.screenshot.as_deref(), Some("screenshots/TC-001.png"));
    let bytes = std::fs::read(shots.join("TC-001.png")).unwrap();
    assert!(bytes.starts_with(b"\x89PNG"));
}

//! Result recording and the run report.

use std::time::Instant;

use chrono::Utc;
use smokeprobe_core_types::{
    CaseVerdict, RunId, RunReport, SuccessRateBasis, Summary, TestCaseResult, TokenUsage,
};
use tracing::{info, warn};

/// Maps low-level network errors onto messages an operator can act on.
const FATAL_MESSAGES: &[(&[&str], &str)] = &[
    (
        &["ERR_NAME_NOT_RESOLVED", "ENOTFOUND"],
        "URL을 찾을 수 없습니다. 주소를 확인해주세요.",
    ),
    (
        &["ERR_CONNECTION_REFUSED", "ECONNREFUSED"],
        "서버에 연결할 수 없습니다. 서버가 실행 중인지 확인해주세요.",
    ),
];

/// Returns the humanised form of a fatal error; unknown errors pass through verbatim.
pub fn humanize_fatal_error(raw: &str) -> String {
    FATAL_MESSAGES
        .iter()
        .find(|(needles, _)| needles.iter().any(|needle| raw.contains(needle)))
        .map(|(_, message)| message.to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// Accumulates per-case results and the fatal error of one run, then seals them into a
/// [`RunReport`].
pub struct ResultRecorder {
    run_id: RunId,
    url: String,
    basis: SuccessRateBasis,
    started: Instant,
    results: Vec<TestCaseResult>,
    error: Option<String>,
    usage: TokenUsage,
    warning: Option<String>,
}

impl ResultRecorder {
    pub fn new(run_id: RunId, url: impl Into<String>, basis: SuccessRateBasis) -> Self {
        Self {
            run_id,
            url: url.into(),
            basis,
            started: Instant::now(),
            results: Vec::new(),
            error: None,
            usage: TokenUsage::default(),
            warning: None,
        }
    }

    pub fn record(&mut self, result: TestCaseResult) {
        match result.result {
            CaseVerdict::Pass => info!(case = %result.id, "case passed"),
            verdict => info!(
                case = %result.id,
                verdict = %verdict,
                failure = ?result.failure_type,
                "case did not pass"
            ),
        }
        self.results.push(result);
    }

    /// Records the run-level error. Only the first one is kept.
    pub fn fail_run(&mut self, raw: impl AsRef<str>) {
        let raw = raw.as_ref();
        if self.error.is_some() {
            warn!(error = raw, "additional fatal error ignored");
            return;
        }
        let message = humanize_fatal_error(raw);
        warn!(error = raw, message = %message, "run failed");
        self.error = Some(message);
    }

    pub fn set_usage(&mut self, usage: TokenUsage) {
        self.usage = usage;
    }

    pub fn set_warning(&mut self, warning: Option<String>) {
        self.warning = warning;
    }

    pub fn results(&self) -> &[TestCaseResult] {
        &self.results
    }

    pub fn finish(self) -> RunReport {
        let summary = Summary::tally(&self.results, self.basis).with_warning(self.warning);
        RunReport {
            run_id: self.run_id.to_string(),
            url: self.url,
            timestamp: Utc::now(),
            duration_ms: self.started.elapsed().as_millis() as u64,
            error: self.error,
            usage: self.usage,
            test_cases: self.results,
            summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smokeprobe_core_types::{FailureKind, Step, TestCaseDesign};

    fn case(id: &str) -> TestCaseDesign {
        TestCaseDesign::new(id, format!("case {id}"), vec![Step::check("#app")])
    }

    #[test]
    fn network_errors_are_humanised() {
        assert_eq!(
            humanize_fatal_error("navigation failed: net::ERR_NAME_NOT_RESOLVED"),
            "URL을 찾을 수 없습니다. 주소를 확인해주세요."
        );
        assert_eq!(
            humanize_fatal_error("connect ECONNREFUSED 127.0.0.1:3000"),
            "서버에 연결할 수 없습니다. 서버가 실행 중인지 확인해주세요."
        );
        assert_eq!(humanize_fatal_error("page crashed"), "page crashed");
    }

    #[test]
    fn report_counts_match_recorded_results() {
        let mut recorder = ResultRecorder::new(RunId::new(), "https://site.test", SuccessRateBasis::ExcludeNa);
        recorder.record(TestCaseResult::pass(&case("TC-001")));
        recorder.record(TestCaseResult::fail(&case("TC-002"), Some(FailureKind::Selector), "x"));
        recorder.record(TestCaseResult::blocked(&case("TC-003"), "reload failed"));
        recorder.record(TestCaseResult::not_applicable(&case("TC-004"), "gone"));
        recorder.set_usage(TokenUsage::new(10, 5));

        let report = recorder.finish();
        let summary = &report.summary;
        assert_eq!(summary.total, report.test_cases.len());
        assert_eq!(
            summary.passed + summary.failed + summary.blocked + summary.na,
            summary.total
        );
        assert_eq!(summary.success_rate, 33.3);
        assert_eq!(report.usage.total_tokens, 15);
        assert!(report.error.is_none());
    }

    #[test]
    fn only_first_fatal_error_is_kept() {
        let mut recorder = ResultRecorder::new(RunId::new(), "https://x.test", SuccessRateBasis::All);
        recorder.fail_run("net::ERR_CONNECTION_REFUSED");
        recorder.fail_run("something else");
        let report = recorder.finish();
        assert_eq!(
            report.error.as_deref(),
            Some("서버에 연결할 수 없습니다. 서버가 실행 중인지 확인해주세요.")
        );
        assert_eq!(report.summary.total, 0);
        assert_eq!(report.summary.success_rate, 0.0);
    }
}

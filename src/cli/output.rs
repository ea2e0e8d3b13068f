use anyhow::Result;
use smokeprobe_cli::session::SessionOutcome;
use smokeprobe_core_types::CaseVerdict;

pub fn print_json(outcome: &SessionOutcome) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&outcome.report)?);
    Ok(())
}

pub fn print_human(outcome: &SessionOutcome) {
    let report = &outcome.report;
    let summary = &report.summary;

    println!("SmokeProbe report for {}", report.url);
    if let Some(error) = &report.error {
        println!("  error: {error}");
    }
    for case in &report.test_cases {
        let label = match (case.result, case.failure_type) {
            (CaseVerdict::Fail, Some(kind)) => kind.label().to_string(),
            (verdict, _) => verdict.to_string(),
        };
        println!("  [{label:<14}] {} {}", case.id, case.title);
    }
    println!(
        "  total {} | passed {} | failed {} | blocked {} | n/a {} | success {:.1}%",
        summary.total,
        summary.passed,
        summary.failed,
        summary.blocked,
        summary.na,
        summary.success_rate
    );
    if let Some(warning) = &summary.warning {
        println!("  warning: {warning}");
    }
    println!(
        "  tokens: {} (prompt {}, completion {})",
        report.usage.total_tokens, report.usage.prompt_tokens, report.usage.completion_tokens
    );
    println!("  report: {}", outcome.report_path.display());
    if let Some(video) = &outcome.video {
        println!("  recording: {}", video.display());
    }
}

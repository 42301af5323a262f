//! Partial-results report rendered from the record history.
//!
//! Used after any terminated run: only steps that actually ran appear,
//! never fabricated results for the ones that did not.

use crate::executor::PlanStatus;
use crate::record::ExecutionRecord;

pub fn render_report(run_id: &str, status: &PlanStatus, history: &[ExecutionRecord]) -> String {
    let mut report = format!("# Run {}\n\nOutcome: {}\n\n## Steps\n", run_id, status);

    for record in history {
        let glyph = if record.result.success { "✓" } else { "✗" };
        report.push_str(&format!(
            "{} {} [{}] ({:.3}s)\n",
            glyph, record.step.context_key, record.step.component, record.result.duration_seconds,
        ));
        if let Some(error) = &record.result.error {
            report.push_str(&format!(
                "  {} — {}\n",
                error.classification.severity, error.classification.user_message,
            ));
        }
    }

    let succeeded = history.iter().filter(|r| r.result.success).count();
    let wall: f64 = history.iter().map(|r| r.result.duration_seconds).sum();
    report.push_str(&format!(
        "\n## Totals\n- Steps attempted: {}\n- Succeeded: {}\n- Failed: {}\n- Wall: {:.3}s\n",
        history.len(),
        succeeded,
        history.len() - succeeded,
        wall,
    ));

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::PlannedStep;
    use crate::record::{ExecutionError, ExecutionResult};
    use chrono::Utc;
    use serde_json::json;
    use stagehand_core::ErrorClassification;

    #[test]
    fn report_lists_attempted_steps_and_totals() {
        let now = Utc::now();
        let history = vec![
            ExecutionRecord::new(
                PlannedStep::new("extract", "task-extractor"),
                ExecutionResult::succeeded(json!({}), now, now),
            ),
            ExecutionRecord::new(
                PlannedStep::new("reply", "respond"),
                ExecutionResult::failed(
                    ExecutionError {
                        message: "boom".into(),
                        classification: ErrorClassification::critical("respond failed: boom"),
                    },
                    now,
                    now,
                ),
            ),
        ];

        let report = render_report("run-1", &PlanStatus::Aborted, &history);
        assert!(report.contains("Outcome: aborted"));
        assert!(report.contains("✓ extract"));
        assert!(report.contains("✗ reply"));
        assert!(report.contains("critical — respond failed: boom"));
        assert!(report.contains("Steps attempted: 2"));
        assert!(report.contains("Succeeded: 1"));
    }
}

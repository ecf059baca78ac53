//! Report formatting utilities for audit exports.

use std::fmt::Write;

use serde::Serialize;

use crate::clock::Clock;
use crate::domain::{Audit, AuditDetail, Issue, Statistics};
use crate::format::{
    format_count, format_issue_location, format_issue_type, format_pr_number, format_status,
    progress_percent, relative_time,
};

/// Render a list of audits as a Markdown table.
pub fn render_audits_markdown(audits: &[Audit], clock: &dyn Clock) -> String {
    let now = clock.now();
    let mut output = String::new();
    let _ = writeln!(output, "# AutoDev Audits\n");
    if audits.is_empty() {
        let _ = writeln!(output, "No audits yet.");
        return output;
    }
    let _ = writeln!(
        output,
        "| Audit | Status | Progress | Issues | Fixes | PR | Created |"
    );
    let _ = writeln!(output, "|---|---|---|---|---|---|---|");
    for audit in audits {
        let _ = writeln!(
            output,
            "| #{} | {} | {}% | {} | {} | {} | {} |",
            audit.id,
            format_status(audit.status.as_str()),
            progress_percent(audit),
            audit.issues_found,
            audit.fixes_applied,
            format_pr_number(audit),
            relative_time(audit.created_at.as_datetime(), now),
        );
    }
    output
}

/// Render one audit with its issues as Markdown.
pub fn render_audit_markdown(detail: &AuditDetail, clock: &dyn Clock) -> String {
    let audit = &detail.audit;
    let mut output = String::new();
    let _ = writeln!(
        output,
        "# Audit #{}: {}\n",
        audit.id,
        detail.repository.full_name()
    );
    let _ = writeln!(output, "- Repository: {}", detail.repository.url);
    let _ = writeln!(output, "- Branch: `{}`", detail.repository.branch);
    let _ = writeln!(output, "- Status: {}", format_status(audit.status.as_str()));
    let _ = writeln!(
        output,
        "- Created: {}",
        relative_time(audit.created_at.as_datetime(), clock.now())
    );
    let _ = writeln!(
        output,
        "- Files: {} / {}",
        audit.processed_files, audit.total_files
    );
    let _ = writeln!(output, "- Issues found: {}", audit.issues_found);
    let _ = writeln!(output, "- Fixes applied: {}", audit.fixes_applied);
    match audit.pr_link() {
        Some((number, url)) => {
            let _ = writeln!(output, "- Pull request: [#{number}]({url})");
        }
        None => {
            let _ = writeln!(output, "- Pull request: -");
        }
    }
    if let Some(error) = audit.error_message.as_deref() {
        let _ = writeln!(output, "- Error: {error}");
    }
    let _ = writeln!(output);
    append_issues(&mut output, &detail.issues);
    output
}

/// Render dashboard statistics as Markdown.
pub fn render_statistics_markdown(stats: &Statistics) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# AutoDev Statistics\n");
    for (label, value) in statistic_rows(stats) {
        let _ = writeln!(output, "- {label}: {}", format_count(value));
    }
    output
}

/// Labelled counters in dashboard order.
pub fn statistic_rows(stats: &Statistics) -> [(&'static str, u64); 7] {
    [
        ("Total Audits", stats.total_audits),
        ("Completed", stats.completed_audits),
        ("Pending", stats.pending_audits),
        ("Failed", stats.failed_audits),
        ("Issues Found", stats.total_issues_found),
        ("Fixes Applied", stats.total_fixes_applied),
        ("Pull Requests", stats.total_prs_created),
    ]
}

/// Render any serializable payload as JSON.
pub fn render_json<T: Serialize + ?Sized>(payload: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(payload)
}

fn append_issues(output: &mut String, issues: &[Issue]) {
    let _ = writeln!(output, "## Detected Issues ({})\n", issues.len());
    if issues.is_empty() {
        let _ = writeln!(output, "No issues detected.\n");
        return;
    }
    for issue in issues {
        let _ = writeln!(
            output,
            "### [{}] {}\n",
            issue.severity,
            issue.description.trim()
        );
        let _ = writeln!(output, "- Type: {}", format_issue_type(&issue.issue_type));
        let _ = writeln!(output, "- Location: `{}`", format_issue_location(issue));
        let _ = writeln!(
            output,
            "- Fixed: {}",
            if issue.is_fixed { "yes" } else { "no" }
        );
        let _ = writeln!(output);
        if let Some(explanation) = issue.explanation.as_deref() {
            let _ = writeln!(output, "{}\n", explanation.trim());
        }
        if let (Some(original), Some(fixed)) =
            (issue.original_code.as_deref(), issue.fixed_code.as_deref())
        {
            append_code_block(output, "Original", original);
            append_code_block(output, "Fixed", fixed);
        }
    }
}

fn append_code_block(output: &mut String, title: &str, contents: &str) {
    let _ = writeln!(output, "**{title}**\n");
    let _ = writeln!(output, "```text\n{}\n```\n", contents.trim_end());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;
    use crate::domain::{AuditStatus, Repository, Severity, Timestamp};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 20, 12, 0, 0)
            .single()
            .expect("date")
    }

    fn clock() -> MockClock {
        let mut clock = MockClock::new();
        clock.expect_now().returning(now);
        clock
    }

    fn sample_audit() -> Audit {
        Audit {
            id: 4,
            repository_id: 2,
            status: AuditStatus::Completed,
            task_id: Some("task-4".to_string()),
            total_files: 8,
            processed_files: 8,
            issues_found: 2,
            fixes_applied: 1,
            pr_url: Some("https://github.com/acme/widgets/pull/9".to_string()),
            pr_number: Some(9),
            error_message: None,
            created_at: Timestamp::from(now() - Duration::hours(2)),
            started_at: None,
            completed_at: None,
            logs: None,
        }
    }

    fn sample_detail() -> AuditDetail {
        AuditDetail {
            audit: sample_audit(),
            repository: Repository {
                id: 2,
                url: "https://github.com/acme/widgets".to_string(),
                owner: "acme".to_string(),
                name: "widgets".to_string(),
                branch: "main".to_string(),
                created_at: Timestamp::from(now()),
            },
            issues: vec![Issue {
                id: 1,
                file_path: "app/db.py".to_string(),
                line_number: Some(3),
                issue_type: "security_vulnerability".to_string(),
                severity: Severity::Critical,
                description: "SQL built from user input".to_string(),
                original_code: Some("cursor.execute(f\"{q}\")".to_string()),
                fixed_code: Some("cursor.execute(q, params)".to_string()),
                explanation: Some("Use bound parameters.".to_string()),
                is_fixed: true,
                created_at: Timestamp::from(now()),
            }],
        }
    }

    #[test]
    fn renders_audit_table() {
        let output = render_audits_markdown(&[sample_audit()], &clock());
        assert!(output.contains("AutoDev Audits"));
        assert!(output.contains("| #4 | Completed | 100% | 2 | 1 | #9 | 2 hours ago |"));
    }

    #[test]
    fn renders_empty_audit_table() {
        let output = render_audits_markdown(&[], &clock());
        assert!(output.contains("No audits yet."));
    }

    #[test]
    fn renders_audit_detail_markdown() {
        let output = render_audit_markdown(&sample_detail(), &clock());
        assert!(output.contains("# Audit #4: acme/widgets"));
        assert!(output.contains("Pull request: [#9](https://github.com/acme/widgets/pull/9)"));
        assert!(output.contains("Detected Issues (1)"));
        assert!(output.contains("[critical] SQL built from user input"));
        assert!(output.contains("Type: security vulnerability"));
        assert!(output.contains("`app/db.py : Line 3`"));
        assert!(output.contains("cursor.execute(q, params)"));
    }

    #[test]
    fn renders_statistics_markdown() {
        let stats = Statistics {
            total_audits: 1200,
            completed_audits: 3,
            ..Statistics::default()
        };
        let output = render_statistics_markdown(&stats);
        assert!(output.contains("Total Audits: 1,200"));
        assert!(output.contains("Completed: 3"));
        assert!(output.contains("Pull Requests: 0"));
    }

    #[test]
    fn renders_json_payload() {
        let json = render_json(&vec![sample_audit()]).expect("json");
        let parsed: serde_json::Value = serde_json::from_str(&json).expect("parse");
        assert!(parsed.is_array());
        assert_eq!(parsed[0]["status"], "completed");
        assert!(parsed[0].get("logs").is_none());
    }
}

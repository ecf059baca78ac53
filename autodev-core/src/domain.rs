//! Domain entities exposed by the audit API.
//!
//! Every entity here is a read-through copy of server state. A fresh fetch
//! replaces the previous value wholesale; nothing is merged field by field.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Lifecycle status of an audit.
///
/// Unrecognized wire values map to [`AuditStatus::Unknown`], which keeps the raw
/// literal, renders like `Pending` and never counts as terminal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AuditStatus {
    /// Queued, not yet picked up by a worker.
    Pending,
    /// Repository is being cloned.
    Cloning,
    /// Source files are being analyzed.
    Analyzing,
    /// Fixes are being generated.
    Fixing,
    /// Generated fixes are being validated.
    Validating,
    /// A pull request is being opened.
    CreatingPr,
    /// The audit finished successfully.
    Completed,
    /// The audit stopped with an error.
    Failed,
    /// A status this client does not recognize, with its wire literal.
    Unknown(String),
}

impl AuditStatus {
    /// Every known status, in pipeline order.
    pub const ALL: [AuditStatus; 8] = [
        AuditStatus::Pending,
        AuditStatus::Cloning,
        AuditStatus::Analyzing,
        AuditStatus::Fixing,
        AuditStatus::Validating,
        AuditStatus::CreatingPr,
        AuditStatus::Completed,
        AuditStatus::Failed,
    ];

    /// Parse a wire literal, falling back to `Unknown`.
    pub fn parse(value: &str) -> Self {
        match value {
            "pending" => Self::Pending,
            "cloning" => Self::Cloning,
            "analyzing" => Self::Analyzing,
            "fixing" => Self::Fixing,
            "validating" => Self::Validating,
            "creating_pr" => Self::CreatingPr,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// The wire literal for this status.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Cloning => "cloning",
            Self::Analyzing => "analyzing",
            Self::Fixing => "fixing",
            Self::Validating => "validating",
            Self::CreatingPr => "creating_pr",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Unknown(raw) => raw,
        }
    }

    /// Whether polling should stop once this status is observed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl From<String> for AuditStatus {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<AuditStatus> for String {
    fn from(value: AuditStatus) -> Self {
        match value {
            AuditStatus::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a detected issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Severity {
    /// Cosmetic or low-risk finding.
    Low,
    /// Should be fixed.
    Medium,
    /// Likely to cause failures.
    High,
    /// Exploitable or data-losing.
    Critical,
    /// A severity this client does not recognize.
    Unknown,
}

impl Severity {
    /// Parse a wire literal, falling back to `Unknown`.
    pub fn parse(value: &str) -> Self {
        match value {
            "low" => Self::Low,
            "medium" => Self::Medium,
            "high" => Self::High,
            "critical" => Self::Critical,
            _ => Self::Unknown,
        }
    }

    /// The wire literal for this severity.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
            Self::Unknown => "unknown",
        }
    }
}

impl From<String> for Severity {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<Severity> for String {
    fn from(value: Severity) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Level of an audit log entry. Parsing ignores case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LogLevel {
    /// Progress information.
    Info,
    /// Recoverable problem.
    Warning,
    /// Step failure.
    Error,
    /// Step completed.
    Success,
    /// A level this client does not recognize.
    Unknown,
}

impl LogLevel {
    /// Parse a level, ignoring ASCII case and falling back to `Unknown`.
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "info" => Self::Info,
            "warning" => Self::Warning,
            "error" => Self::Error,
            "success" => Self::Success,
            _ => Self::Unknown,
        }
    }

    /// The wire literal for this level.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Success => "success",
            Self::Unknown => "unknown",
        }
    }
}

impl From<String> for LogLevel {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<LogLevel> for String {
    fn from(value: LogLevel) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A UTC instant as reported by the API.
///
/// Accepts RFC 3339 strings and naive ISO-8601 strings; the latter are read as
/// UTC because the audit worker stamps log entries without an offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Parse a timestamp string.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
            return Some(Self(parsed.with_timezone(&Utc)));
        }
        NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| Self(naive.and_utc()))
    }

    /// The underlying UTC date-time.
    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self(value)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_rfc3339())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }
}

/// A repository registered for auditing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    /// Server identifier.
    pub id: i64,
    /// Source URL as submitted.
    pub url: String,
    /// Owner derived from the URL.
    pub owner: String,
    /// Repository name derived from the URL.
    pub name: String,
    /// Branch under audit.
    pub branch: String,
    /// Registration time.
    pub created_at: Timestamp,
}

impl Repository {
    /// `owner/name` slug.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// One line of audit progress output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// When the worker emitted the entry.
    pub timestamp: Timestamp,
    /// Entry level.
    pub level: LogLevel,
    /// Human-readable text.
    pub message: String,
}

/// One analysis run against a repository/branch pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Audit {
    /// Server identifier.
    pub id: i64,
    /// Owning repository.
    pub repository_id: i64,
    /// Current lifecycle status.
    pub status: AuditStatus,
    /// Background task identifier, assigned once queued.
    #[serde(default)]
    pub task_id: Option<String>,
    /// Files selected for analysis.
    #[serde(default)]
    pub total_files: u32,
    /// Files analyzed so far.
    #[serde(default)]
    pub processed_files: u32,
    /// Issues detected so far.
    #[serde(default)]
    pub issues_found: u32,
    /// Fixes applied so far.
    #[serde(default)]
    pub fixes_applied: u32,
    /// Pull request URL, once opened.
    #[serde(default)]
    pub pr_url: Option<String>,
    /// Pull request number, once opened.
    #[serde(default)]
    pub pr_number: Option<u64>,
    /// Failure reason for failed audits.
    #[serde(default)]
    pub error_message: Option<String>,
    /// Creation time.
    pub created_at: Timestamp,
    /// Worker start time.
    #[serde(default)]
    pub started_at: Option<Timestamp>,
    /// Completion time.
    #[serde(default)]
    pub completed_at: Option<Timestamp>,
    /// Ordered log entries, when the payload carries them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs: Option<Vec<LogEntry>>,
}

impl Audit {
    /// Pull request number and URL, only when both are present.
    pub fn pr_link(&self) -> Option<(u64, &str)> {
        match (self.pr_number, self.pr_url.as_deref()) {
            (Some(number), Some(url)) if !url.is_empty() => Some((number, url)),
            _ => None,
        }
    }

    /// Whether the audit has reached a terminal status.
    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }
}

/// An audit with its repository and detected issues embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditDetail {
    /// Audit fields.
    #[serde(flatten)]
    pub audit: Audit,
    /// Audited repository.
    pub repository: Repository,
    /// Detected issues.
    #[serde(default)]
    pub issues: Vec<Issue>,
}

/// One detected defect within an audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Server identifier.
    pub id: i64,
    /// Path of the affected file, relative to the repository root.
    pub file_path: String,
    /// Affected line, when known.
    #[serde(default)]
    pub line_number: Option<u32>,
    /// Category literal such as `security_vulnerability`.
    pub issue_type: String,
    /// Severity.
    pub severity: Severity,
    /// Summary of the defect.
    pub description: String,
    /// Code before the fix.
    #[serde(default)]
    pub original_code: Option<String>,
    /// Code after the fix.
    #[serde(default)]
    pub fixed_code: Option<String>,
    /// Why the fix is correct.
    #[serde(default)]
    pub explanation: Option<String>,
    /// Whether the generated fix was applied.
    #[serde(default)]
    pub is_fixed: bool,
    /// Detection time.
    pub created_at: Timestamp,
}

/// Aggregate dashboard counters, recomputed by the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    /// All audits ever created.
    #[serde(default)]
    pub total_audits: u64,
    /// Audits in `completed`.
    #[serde(default)]
    pub completed_audits: u64,
    /// Audits in `failed`.
    #[serde(default)]
    pub failed_audits: u64,
    /// Audits in any non-terminal status.
    #[serde(default)]
    pub pending_audits: u64,
    /// Sum of issues found.
    #[serde(default)]
    pub total_issues_found: u64,
    /// Sum of fixes applied.
    #[serde(default)]
    pub total_fixes_applied: u64,
    /// Audits that opened a pull request.
    #[serde(default)]
    pub total_prs_created: u64,
}

/// Payload for `POST /api/audits/`.
///
/// Credentials that are absent are left out of the JSON body entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAuditRequest {
    /// Repository URL.
    pub url: String,
    /// Branch to audit.
    pub branch: String,
    /// GitHub token overriding the server default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_token: Option<String>,
    /// Gemini API key overriding the server default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini_api_key: Option<String>,
}

impl CreateAuditRequest {
    /// Build a request, dropping blank credentials.
    pub fn new(
        url: impl Into<String>,
        branch: impl Into<String>,
        github_token: Option<String>,
        gemini_api_key: Option<String>,
    ) -> Self {
        Self {
            url: url.into(),
            branch: branch.into(),
            github_token: non_blank(github_token),
            gemini_api_key: non_blank(gemini_api_key),
        }
    }
}

/// Acknowledgement returned when an audit is queued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditCreated {
    /// Identifier of the new audit.
    pub audit_id: i64,
    /// Background task identifier.
    #[serde(default)]
    pub task_id: Option<String>,
    /// Initial status.
    pub status: AuditStatus,
    /// Server confirmation text.
    pub message: String,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn detail_json() -> serde_json::Value {
        serde_json::json!({
            "id": 7,
            "repository_id": 3,
            "status": "analyzing",
            "task_id": "task-7",
            "total_files": 10,
            "processed_files": 4,
            "issues_found": 2,
            "fixes_applied": 1,
            "pr_url": null,
            "pr_number": null,
            "error_message": null,
            "created_at": "2024-05-01T12:00:00.123456+00:00",
            "started_at": "2024-05-01T12:00:05Z",
            "completed_at": null,
            "logs": [
                {"timestamp": "2024-05-01T12:00:06.5", "level": "INFO", "message": "Cloning"}
            ],
            "repository": {
                "id": 3,
                "url": "https://github.com/acme/widgets",
                "owner": "acme",
                "name": "widgets",
                "branch": "main",
                "created_at": "2024-05-01T11:59:00Z"
            },
            "issues": [{
                "id": 11,
                "file_path": "src/lib.py",
                "line_number": 42,
                "issue_type": "security_vulnerability",
                "severity": "critical",
                "description": "SQL injection",
                "original_code": "q = f\"{x}\"",
                "fixed_code": null,
                "explanation": null,
                "is_fixed": false,
                "created_at": "2024-05-01T12:01:00Z"
            }]
        })
    }

    #[test]
    fn status_parse_covers_known_literals() {
        for status in AuditStatus::ALL {
            assert_eq!(AuditStatus::parse(status.as_str()), status);
        }
        assert_eq!(
            AuditStatus::parse("bogus"),
            AuditStatus::Unknown("bogus".to_string())
        );
    }

    #[test]
    fn only_completed_and_failed_are_terminal() {
        let terminal: Vec<_> = AuditStatus::ALL
            .into_iter()
            .filter(|status| status.is_terminal())
            .collect();
        assert_eq!(terminal, vec![AuditStatus::Completed, AuditStatus::Failed]);
        assert!(!AuditStatus::parse("archived").is_terminal());
    }

    #[test]
    fn log_level_parse_ignores_case() {
        assert_eq!(LogLevel::parse("WARNING"), LogLevel::Warning);
        assert_eq!(LogLevel::parse("Success"), LogLevel::Success);
        assert_eq!(LogLevel::parse("debug"), LogLevel::Unknown);
    }

    #[test]
    fn timestamp_accepts_offset_and_naive_forms() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).single().expect("date");
        let with_offset = Timestamp::parse("2024-05-01T14:00:00+02:00").expect("rfc3339");
        let naive = Timestamp::parse("2024-05-01T12:00:00").expect("naive");
        assert_eq!(with_offset.as_datetime(), expected);
        assert_eq!(naive.as_datetime(), expected);
        assert!(Timestamp::parse("yesterday").is_none());
    }

    #[test]
    fn deserializes_audit_detail_payload() {
        let detail: AuditDetail = serde_json::from_value(detail_json()).expect("detail");
        assert_eq!(detail.audit.id, 7);
        assert_eq!(detail.audit.status, AuditStatus::Analyzing);
        assert_eq!(detail.audit.processed_files, 4);
        assert_eq!(detail.repository.full_name(), "acme/widgets");
        assert_eq!(detail.issues[0].severity, Severity::Critical);
        assert_eq!(detail.issues[0].line_number, Some(42));
        let logs = detail.audit.logs.as_ref().expect("logs");
        assert_eq!(logs[0].level, LogLevel::Info);
        assert!(detail.audit.pr_link().is_none());
    }

    #[test]
    fn missing_logs_stay_absent() {
        let mut payload = detail_json();
        payload.as_object_mut().expect("object").remove("logs");
        let detail: AuditDetail = serde_json::from_value(payload).expect("detail");
        assert!(detail.audit.logs.is_none());
    }

    #[test]
    fn unknown_status_deserializes_to_fallback() {
        let mut payload = detail_json();
        payload["status"] = serde_json::json!("queued_elsewhere");
        let detail: AuditDetail = serde_json::from_value(payload).expect("detail");
        assert_eq!(
            detail.audit.status,
            AuditStatus::Unknown("queued_elsewhere".to_string())
        );
    }

    #[test]
    fn unknown_status_serializes_back_to_its_literal() {
        let mut payload = detail_json();
        payload["status"] = serde_json::json!("queued_elsewhere");
        let detail: AuditDetail = serde_json::from_value(payload).expect("detail");

        let value = serde_json::to_value(&detail.audit).expect("json");

        assert_eq!(value["status"], "queued_elsewhere");
        assert_eq!(detail.audit.status.to_string(), "queued_elsewhere");
    }

    #[test]
    fn pr_link_requires_number_and_url() {
        let mut payload = detail_json();
        payload["pr_number"] = serde_json::json!(12);
        let detail: AuditDetail = serde_json::from_value(payload.clone()).expect("detail");
        assert!(detail.audit.pr_link().is_none());

        payload["pr_url"] = serde_json::json!("https://github.com/acme/widgets/pull/12");
        let detail: AuditDetail = serde_json::from_value(payload).expect("detail");
        assert_eq!(
            detail.audit.pr_link(),
            Some((12, "https://github.com/acme/widgets/pull/12"))
        );
    }

    #[test]
    fn create_request_omits_blank_credentials() {
        let request = CreateAuditRequest::new(
            "https://github.com/acme/widgets",
            "main",
            Some(String::new()),
            Some("gem-key".to_string()),
        );
        let body = serde_json::to_value(&request).expect("json");
        assert_eq!(
            body,
            serde_json::json!({
                "url": "https://github.com/acme/widgets",
                "branch": "main",
                "gemini_api_key": "gem-key"
            })
        );
    }

    #[test]
    fn status_serializes_as_wire_literal() {
        let value = serde_json::to_value(AuditStatus::CreatingPr).expect("json");
        assert_eq!(value, serde_json::json!("creating_pr"));
    }
}

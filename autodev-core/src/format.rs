//! Display derivations for audit data.
//!
//! Everything here is pure: statuses, severities and timestamps go in,
//! strings and categorical color tokens come out.

use chrono::{DateTime, Utc};

use crate::domain::{Audit, AuditStatus, Issue, LogLevel, Severity};

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const WEEK: i64 = 7 * DAY;

/// Categorical color token used to tint statuses, severities and log levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tone {
    /// Waiting states and warnings.
    Yellow,
    /// Informational.
    Blue,
    /// Analysis in progress.
    Purple,
    /// Fix generation in progress.
    Indigo,
    /// Validation in progress.
    Cyan,
    /// Pull request in progress.
    Pink,
    /// Success.
    Green,
    /// Failure.
    Red,
    /// Elevated severity.
    Orange,
}

impl Tone {
    /// Token name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Yellow => "yellow",
            Self::Blue => "blue",
            Self::Purple => "purple",
            Self::Indigo => "indigo",
            Self::Cyan => "cyan",
            Self::Pink => "pink",
            Self::Green => "green",
            Self::Red => "red",
            Self::Orange => "orange",
        }
    }
}

/// Color token for an audit status. Unknown statuses share the pending token.
pub fn status_tone(status: &AuditStatus) -> Tone {
    match status {
        AuditStatus::Pending | AuditStatus::Unknown(_) => Tone::Yellow,
        AuditStatus::Cloning => Tone::Blue,
        AuditStatus::Analyzing => Tone::Purple,
        AuditStatus::Fixing => Tone::Indigo,
        AuditStatus::Validating => Tone::Cyan,
        AuditStatus::CreatingPr => Tone::Pink,
        AuditStatus::Completed => Tone::Green,
        AuditStatus::Failed => Tone::Red,
    }
}

/// Color token for an issue severity. Unknown severities share the low token.
pub fn severity_tone(severity: Severity) -> Tone {
    match severity {
        Severity::Low | Severity::Unknown => Tone::Blue,
        Severity::Medium => Tone::Yellow,
        Severity::High => Tone::Orange,
        Severity::Critical => Tone::Red,
    }
}

/// Color token for a log level.
pub fn log_tone(level: LogLevel) -> Tone {
    match level {
        LogLevel::Error => Tone::Red,
        LogLevel::Warning => Tone::Yellow,
        LogLevel::Success => Tone::Green,
        LogLevel::Info | LogLevel::Unknown => Tone::Blue,
    }
}

/// Title-case each underscore-separated word: `creating_pr` becomes `Creating Pr`.
pub fn format_status(status: &str) -> String {
    status
        .split('_')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Bucket the time elapsed since `timestamp` into a short phrase.
///
/// Buckets are half-open on the lower bound and use floor division. Anything a
/// week or older prints as a calendar date.
pub fn relative_time(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = (now - timestamp).num_seconds();
    if elapsed < MINUTE {
        return "just now".to_string();
    }
    if elapsed < HOUR {
        return format!("{} minutes ago", elapsed / MINUTE);
    }
    if elapsed < DAY {
        return format!("{} hours ago", elapsed / HOUR);
    }
    if elapsed < WEEK {
        return format!("{} days ago", elapsed / DAY);
    }
    timestamp.format("%Y-%m-%d").to_string()
}

/// Percentage of files processed, 0 when nothing has been counted yet.
pub fn progress_percent(audit: &Audit) -> u8 {
    percent_of(audit.processed_files, audit.total_files)
}

/// `round(100 * part / whole)`, capped at 100 for inconsistent server data.
pub fn percent_of(part: u32, whole: u32) -> u8 {
    if whole == 0 {
        return 0;
    }
    let percent = (f64::from(part) * 100.0 / f64::from(whole)).round();
    percent.min(100.0) as u8
}

/// `#N` when a pull request exists, `-` otherwise.
pub fn format_pr_number(audit: &Audit) -> String {
    match audit.pr_link() {
        Some((number, _)) => format!("#{number}"),
        None => "-".to_string(),
    }
}

/// Issue category with underscores replaced by spaces.
pub fn format_issue_type(issue_type: &str) -> String {
    issue_type.replace('_', " ")
}

/// `path : Line N`, or just the path when the line is unknown.
pub fn format_issue_location(issue: &Issue) -> String {
    match issue.line_number {
        Some(line) if line > 0 => format!("{} : Line {line}", issue.file_path),
        _ => issue.file_path.clone(),
    }
}

/// Group digits in thousands: `12345` becomes `12,345`.
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

/// Cut `text` to `max_len` characters, appending `...` when shortened.
pub fn truncate(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_len).collect();
    cut.push_str("...");
    cut
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

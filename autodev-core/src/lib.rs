#![deny(missing_docs)]
//! AutoDev core library.
//!
//! This crate contains the domain types, display derivations and report
//! rendering shared by the AutoDev audit client.

pub mod clock;
pub mod domain;
pub mod error;
pub mod form;
pub mod format;
pub mod report;

pub use clock::{Clock, SystemClock};
pub use domain::{
    Audit, AuditCreated, AuditDetail, AuditStatus, CreateAuditRequest, Issue, LogEntry, LogLevel,
    Repository, Severity, Statistics, Timestamp,
};
pub use error::{AutodevError, Result};
pub use form::{AuditForm, DEFAULT_BRANCH};
pub use format::{
    Tone, format_count, format_issue_location, format_issue_type, format_pr_number,
    format_status, log_tone, percent_of, progress_percent, relative_time, severity_tone,
    status_tone, truncate,
};
pub use report::{
    render_audit_markdown, render_audits_markdown, render_json, render_statistics_markdown,
    statistic_rows,
};

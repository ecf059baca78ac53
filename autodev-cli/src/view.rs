//! Terminal rendering for the dashboard, detail and log views.

use crate::dashboard::{DashboardState, DashboardView, Flash};
use autodev_core::{
    Audit, AuditDetail, Clock, Issue, LogEntry, Statistics, SystemClock, Tone, format_count,
    format_issue_location, format_issue_type, format_pr_number, format_status, log_tone,
    progress_percent, relative_time, severity_tone, statistic_rows, status_tone, truncate,
};
use chrono::{DateTime, Local, Utc};
use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::style::{Color, Stylize, style};
use crossterm::terminal::{Clear, ClearType};
use log::warn;
use std::fmt::Write;
use std::io::{IsTerminal, Write as _};

const EMPTY_LIST: &str = "No audits yet. Submit a repository to get started.";
const PROGRESS_WIDTH: usize = 20;
const ERROR_PREVIEW_LEN: usize = 60;
const STATUS_COLUMN: usize = 12;

/// Applies tone colors when enabled.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Palette {
    enabled: bool,
}

impl Palette {
    pub(crate) fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub(crate) fn plain() -> Self {
        Self::new(false)
    }

    pub(crate) fn paint(&self, text: &str, tone: Tone) -> String {
        if !self.enabled {
            return text.to_string();
        }
        style(text).with(tone_color(tone)).to_string()
    }

    fn bold(&self, text: &str) -> String {
        if !self.enabled {
            return text.to_string();
        }
        style(text).bold().to_string()
    }
}

fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Yellow => Color::Yellow,
        Tone::Blue => Color::Blue,
        Tone::Purple => Color::DarkMagenta,
        Tone::Indigo => Color::DarkBlue,
        Tone::Cyan => Color::Cyan,
        Tone::Pink => Color::Magenta,
        Tone::Green => Color::Green,
        Tone::Red => Color::Red,
        Tone::Orange => Color::DarkYellow,
    }
}

/// Status label padded to `width` before painting, so escape codes never
/// count toward the column.
fn status_badge(audit: &Audit, width: usize, palette: Palette) -> String {
    let label = format!("{:<width$}", format_status(audit.status.as_str()));
    palette.paint(&label, status_tone(&audit.status))
}

fn progress_bar(percent: u8) -> String {
    let filled = usize::from(percent) * PROGRESS_WIDTH / 100;
    format!(
        "[{}{}] {percent}%",
        "#".repeat(filled),
        "-".repeat(PROGRESS_WIDTH - filled)
    )
}

pub(crate) fn render_statistics(stats: &Statistics, palette: Palette) -> String {
    let mut output = String::new();
    for (label, value) in statistic_rows(stats) {
        let _ = writeln!(output, "  {:<14} {}", label, palette.bold(&format_count(value)));
    }
    output
}

pub(crate) fn render_audit_list(audits: &[Audit], now: DateTime<Utc>, palette: Palette) -> String {
    let mut output = String::new();
    if audits.is_empty() {
        let _ = writeln!(output, "{EMPTY_LIST}");
        return output;
    }
    for audit in audits {
        let _ = writeln!(
            output,
            "  #{:<5} {} {:>4}%  files {}/{}  issues {}  fixes {}  PR {}  {}",
            audit.id,
            status_badge(audit, STATUS_COLUMN, palette),
            progress_percent(audit),
            audit.processed_files,
            audit.total_files,
            audit.issues_found,
            audit.fixes_applied,
            format_pr_number(audit),
            relative_time(audit.created_at.as_datetime(), now),
        );
        if let Some(error) = audit.error_message.as_deref() {
            let _ = writeln!(
                output,
                "         {}",
                palette.paint(&truncate(error, ERROR_PREVIEW_LEN), Tone::Red)
            );
        }
    }
    output
}

/// Full dashboard frame: statistics, the audit list, any fetch error and the
/// outcome of the last command.
pub(crate) fn render_dashboard(state: &DashboardState, now: DateTime<Utc>, palette: Palette) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "{}", palette.bold("AutoDev Audits"));
    if state.loading {
        let _ = writeln!(output, "Loading...");
        return output;
    }
    if state.refreshing {
        let _ = writeln!(output, "Refreshing...");
    }
    if let Some(stats) = &state.stats {
        let _ = writeln!(output);
        output.push_str(&render_statistics(stats, palette));
    }
    let _ = writeln!(output);
    output.push_str(&render_audit_list(&state.audits, now, palette));
    if let Some(error) = state.last_error.as_deref() {
        let _ = writeln!(output);
        let _ = writeln!(output, "{}", palette.paint(&format!("Last refresh failed: {error}"), Tone::Red));
    }
    match &state.flash {
        Some(Flash::Alert(message)) => {
            let _ = writeln!(output);
            let _ = writeln!(output, "{}", palette.paint(message, Tone::Red));
        }
        Some(Flash::Notice(message)) => {
            let _ = writeln!(output);
            let _ = writeln!(output, "{}", palette.paint(message, Tone::Green));
        }
        None => {}
    }
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "Commands: r = refresh, d <id> = delete, n <url> [branch] = new audit, q = quit"
    );
    output
}

/// One-line progress summary used while following an audit.
pub(crate) fn render_status_line(audit: &Audit, palette: Palette) -> String {
    format!(
        "#{} {} {} files {}/{} issues {} fixes {}",
        audit.id,
        status_badge(audit, 0, palette),
        progress_bar(progress_percent(audit)),
        audit.processed_files,
        audit.total_files,
        audit.issues_found,
        audit.fixes_applied,
    )
}

pub(crate) fn render_audit_detail(detail: &AuditDetail, now: DateTime<Utc>, palette: Palette) -> String {
    let audit = &detail.audit;
    let repository = &detail.repository;
    let mut output = String::new();
    let _ = writeln!(
        output,
        "{}",
        palette.bold(&format!("Audit #{}: {}", audit.id, repository.full_name()))
    );
    let _ = writeln!(output, "  Repository   {}", repository.url);
    let _ = writeln!(output, "  Branch       {}", repository.branch);
    let _ = writeln!(output, "  Status       {}", status_badge(audit, 0, palette));
    let _ = writeln!(output, "  Progress     {}", progress_bar(progress_percent(audit)));
    let _ = writeln!(
        output,
        "  Files        {} / {}",
        audit.processed_files, audit.total_files
    );
    let _ = writeln!(output, "  Issues       {}", audit.issues_found);
    let _ = writeln!(output, "  Fixes        {}", audit.fixes_applied);
    if let Some((number, url)) = audit.pr_link() {
        let _ = writeln!(output, "  Pull request #{number} {url}");
    }
    let _ = writeln!(
        output,
        "  Created      {}",
        relative_time(audit.created_at.as_datetime(), now)
    );
    if let Some(started) = audit.started_at {
        let _ = writeln!(output, "  Started      {}", relative_time(started.as_datetime(), now));
    }
    if let Some(completed) = audit.completed_at {
        let _ = writeln!(
            output,
            "  Completed    {}",
            relative_time(completed.as_datetime(), now)
        );
    }
    if let Some(error) = audit.error_message.as_deref() {
        let _ = writeln!(output, "  {}", palette.paint(&format!("Error: {error}"), Tone::Red));
    }
    let _ = writeln!(output);
    if detail.issues.is_empty() {
        let _ = writeln!(output, "No issues detected.");
    } else {
        let _ = writeln!(output, "Issues ({})", detail.issues.len());
        for issue in &detail.issues {
            append_issue(&mut output, issue, palette);
        }
    }
    output
}

fn append_issue(output: &mut String, issue: &Issue, palette: Palette) {
    let fixed = if issue.is_fixed {
        palette.paint("fixed", Tone::Green)
    } else {
        "not fixed".to_string()
    };
    let _ = writeln!(
        output,
        "  [{}] {}  {}  ({fixed})",
        palette.paint(&issue.severity.as_str().to_uppercase(), severity_tone(issue.severity)),
        format_issue_type(&issue.issue_type),
        format_issue_location(issue),
    );
    let _ = writeln!(output, "      {}", issue.description);
    if let Some(explanation) = issue.explanation.as_deref() {
        let _ = writeln!(output, "      Fix: {explanation}");
    }
}

/// `[HH:MM:SS] LEVEL message`, in local time.
pub(crate) fn render_log_entry(entry: &LogEntry, palette: Palette) -> String {
    let time = entry
        .timestamp
        .as_datetime()
        .with_timezone(&Local)
        .format("%H:%M:%S");
    format!(
        "[{time}] {} {}",
        palette.paint(&format!("{:<7}", entry.level.as_str().to_uppercase()), log_tone(entry.level)),
        entry.message
    )
}

/// Remembers how many log entries have already been printed.
#[derive(Debug, Default)]
pub(crate) struct LogPrinter {
    printed: usize,
}

impl LogPrinter {
    /// Entries not yet printed. A shorter sequence than last time starts over.
    pub(crate) fn take_new<'a>(&mut self, logs: &'a [LogEntry]) -> &'a [LogEntry] {
        if logs.len() < self.printed {
            self.printed = 0;
        }
        let fresh = &logs[self.printed..];
        self.printed = logs.len();
        fresh
    }
}

/// Dashboard view that redraws the whole frame on stdout.
pub(crate) struct TerminalDashboardView {
    palette: Palette,
    clock: SystemClock,
    clear: bool,
}

impl TerminalDashboardView {
    pub(crate) fn new(palette: Palette) -> Self {
        Self {
            palette,
            clock: SystemClock,
            clear: std::io::stdout().is_terminal(),
        }
    }
}

impl DashboardView for TerminalDashboardView {
    fn render(&mut self, state: &DashboardState) {
        let frame = render_dashboard(state, self.clock.now(), self.palette);
        let mut stdout = std::io::stdout();
        if self.clear {
            if let Err(err) = execute!(stdout, Clear(ClearType::All), MoveTo(0, 0)) {
                warn!("failed to clear terminal: {err}");
            }
        }
        let _ = write!(stdout, "{frame}");
        let _ = stdout.flush();
    }
}

#![deny(missing_docs)]
//! AutoDev command-line interface.
//!
//! Submits repositories for automated auditing and follows audit progress
//! against a running AutoDev API.

mod api;
mod dashboard;
mod detail;
mod logs;
mod poll;
mod submit;
#[cfg(test)]
mod testing;
mod view;

use api::{AuditApi, DEFAULT_API_URL};
use autodev_core::{
    AuditDetail, AuditForm, DEFAULT_BRANCH, SystemClock, render_audit_markdown,
    render_audits_markdown, render_json, render_statistics_markdown,
};
use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use dashboard::{Dashboard, DashboardEvent, delete_failure_message, run_dashboard};
use detail::{AuditTracker, DETAIL_LOAD_FALLBACK, run_tracker};
use log::info;
use logs::{LogPanel, run_log_panel};
use poll::{DASHBOARD_POLL_INTERVAL, DETAIL_POLL_INTERVAL, LOG_POLL_INTERVAL, PollHandle, Sleeper};
use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use submit::{SUBMIT_FALLBACK, submit_form};
use tokio::sync::mpsc;
use view::{LogPrinter, Palette, TerminalDashboardView};

pub(crate) type CliResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Parser)]
#[command(name = "autodev", version, about = "AutoDev audit client")]
struct Cli {
    /// Base URL of the AutoDev API.
    #[arg(long, env = "AUTODEV_API_URL", default_value = DEFAULT_API_URL, global = true)]
    api_url: String,
    /// When to color terminal output.
    #[arg(long, value_enum, default_value_t = ColorChoice::Auto, global = true)]
    color: ColorChoice,
    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Copy, Clone, Debug, Eq, PartialEq)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    fn palette(self) -> Palette {
        match self {
            Self::Auto => Palette::new(std::io::stdout().is_terminal()),
            Self::Always => Palette::new(true),
            Self::Never => Palette::plain(),
        }
    }
}

#[derive(Args, Clone)]
struct OutputArgs {
    /// Output format for report data.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Write the report to a file instead of stdout.
    #[arg(long = "report-output")]
    report_output: Option<PathBuf>,
}

#[derive(ValueEnum, Copy, Clone, Debug, Eq, PartialEq)]
enum OutputFormat {
    Text,
    Json,
    Markdown,
}

#[derive(Subcommand)]
enum Commands {
    /// Queue a repository for auditing.
    Submit {
        /// Repository URL.
        url: String,
        /// Branch to audit.
        #[arg(long, default_value = DEFAULT_BRANCH)]
        branch: String,
        /// GitHub token overriding the server default.
        #[arg(long)]
        github_token: Option<String>,
        /// Gemini API key overriding the server default.
        #[arg(long)]
        gemini_api_key: Option<String>,
        /// Follow the new audit until it finishes.
        #[arg(long)]
        watch: bool,
    },
    /// List audits, newest first.
    List {
        #[command(flatten)]
        report: OutputArgs,
    },
    /// Show one audit with its issues.
    Show {
        /// Audit ID.
        id: i64,
        #[command(flatten)]
        report: OutputArgs,
    },
    /// Delete an audit.
    Delete {
        /// Audit ID.
        id: i64,
    },
    /// Show aggregate statistics.
    Stats {
        #[command(flatten)]
        report: OutputArgs,
    },
    /// Live dashboard refreshed every 10 seconds.
    Watch,
    /// Follow one audit and its logs until it finishes.
    Follow {
        /// Audit ID.
        id: i64,
        /// Only print status changes.
        #[arg(long)]
        hide_logs: bool,
    },
    /// Print the log entries recorded for an audit.
    Logs {
        /// Audit ID.
        id: i64,
    },
}

#[cfg(not(test))]
#[tokio::main]
async fn main() -> CliResult<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let api = api::ReqwestAuditClient::new(&cli.api_url)?;
    let palette = cli.color.palette();
    run_command(cli.command, &api, palette).await
}

#[cfg(test)]
fn main() {}

/// Run a one-shot command against `api`.
async fn run_command<A: AuditApi>(command: Commands, api: &A, palette: Palette) -> CliResult<()> {
    match command {
        Commands::Submit {
            url,
            branch,
            github_token,
            gemini_api_key,
            watch,
        } => {
            let form = AuditForm::new(url)
                .with_branch(branch)
                .with_credentials(github_token, gemini_api_key);
            let id = run_submit(api, form).await?;
            if watch {
                run_follow(api, id, palette, false).await?;
            }
        }
        Commands::List { report } => {
            let audits = api
                .list_audits()
                .await
                .map_err(|err| err.user_message("Failed to load audits"))?;
            let contents = match report.format {
                OutputFormat::Text => {
                    view::render_audit_list(&audits, Utc::now(), report_palette(&report, palette))
                }
                OutputFormat::Json => render_json(&audits)?,
                OutputFormat::Markdown => render_audits_markdown(&audits, &SystemClock),
            };
            emit_output(&report, contents).await?;
        }
        Commands::Show { id, report } => {
            let detail = api
                .get_audit(id)
                .await
                .map_err(|err| err.user_message(DETAIL_LOAD_FALLBACK))?;
            let contents = match report.format {
                OutputFormat::Text => {
                    view::render_audit_detail(&detail, Utc::now(), report_palette(&report, palette))
                }
                OutputFormat::Json => render_json(&detail)?,
                OutputFormat::Markdown => render_audit_markdown(&detail, &SystemClock),
            };
            emit_output(&report, contents).await?;
        }
        Commands::Delete { id } => {
            api.delete_audit(id)
                .await
                .map_err(|err| delete_failure_message(id, &err))?;
            println!("Deleted audit #{id}");
        }
        Commands::Stats { report } => {
            let stats = api
                .get_statistics()
                .await
                .map_err(|err| err.user_message("Failed to load statistics"))?;
            let contents = match report.format {
                OutputFormat::Text => {
                    view::render_statistics(&stats, report_palette(&report, palette))
                }
                OutputFormat::Json => render_json(&stats)?,
                OutputFormat::Markdown => render_statistics_markdown(&stats),
            };
            emit_output(&report, contents).await?;
        }
        Commands::Logs { id } => {
            let detail = api
                .get_audit(id)
                .await
                .map_err(|err| err.user_message(DETAIL_LOAD_FALLBACK))?;
            let logs = detail.audit.logs.unwrap_or_default();
            if logs.is_empty() {
                println!("No logs recorded for audit #{id}.");
            }
            for entry in &logs {
                println!("{}", view::render_log_entry(entry, palette));
            }
        }
        Commands::Watch => run_watch(api, palette).await?,
        Commands::Follow { id, hide_logs } => run_follow(api, id, palette, hide_logs).await?,
    }
    Ok(())
}

/// Files never receive escape codes.
fn report_palette(report: &OutputArgs, palette: Palette) -> Palette {
    if report.report_output.is_some() {
        Palette::plain()
    } else {
        palette
    }
}

async fn run_submit<A: AuditApi>(api: &A, mut form: AuditForm) -> CliResult<i64> {
    let created = submit_form(api, &mut form)
        .await
        .map_err(|err| err.user_message(SUBMIT_FALLBACK))?;
    println!("{}", created.message);
    println!("Audit #{} queued ({})", created.audit_id, created.status);
    Ok(created.audit_id)
}

/// Live dashboard fed by the refresh timer, stdin commands and ctrl-c.
async fn run_watch<A: AuditApi>(api: &A, palette: Palette) -> CliResult<()> {
    let (events, mut commands) = mpsc::channel(16);
    let (tick_sender, mut ticks) = mpsc::channel(1);
    let ticker = poll::spawn_ticker(
        Arc::new(poll::TokioSleeper),
        DASHBOARD_POLL_INTERVAL,
        tick_sender,
        DashboardEvent::Tick,
    );
    let interrupt = {
        let events = events.clone();
        PollHandle::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = events.send(DashboardEvent::Quit).await;
            }
        })
    };
    dashboard::spawn_command_reader(events);

    let mut dashboard = Dashboard::new(api);
    let mut view = TerminalDashboardView::new(palette);
    run_dashboard(&mut dashboard, &mut commands, &mut ticks, &mut view).await;

    ticker.stop();
    interrupt.stop();
    Ok(())
}

/// Follow an audit until it finishes or ctrl-c arrives, then print its detail.
async fn run_follow<A: AuditApi>(
    api: &A,
    id: i64,
    palette: Palette,
    hide_logs: bool,
) -> CliResult<()> {
    let out = Mutex::new(std::io::stdout());
    tokio::select! {
        outcome = follow_audit(api, id, &poll::TokioSleeper, palette, hide_logs, &out) => {
            let detail = outcome?;
            println!();
            print!("{}", view::render_audit_detail(&detail, Utc::now(), palette));
        }
        _ = tokio::signal::ctrl_c() => {
            info!("stopped following audit #{id}");
        }
    }
    Ok(())
}

/// Run the detail tracker and the log panel side by side, writing progress to `out`.
///
/// Returns the last snapshot, or the load failure when none was ever fetched.
async fn follow_audit<A, S, W>(
    api: &A,
    id: i64,
    sleeper: &S,
    palette: Palette,
    hide_logs: bool,
    out: &Mutex<W>,
) -> Result<AuditDetail, String>
where
    A: AuditApi,
    S: Sleeper + ?Sized,
    W: Write,
{
    let mut tracker = AuditTracker::new(api, id);
    let mut panel = LogPanel::new(api, id);
    panel.set_collapsed(hide_logs);
    let mut last_line = String::new();
    let mut printer = LogPrinter::default();

    {
        let tracking = run_tracker(&mut tracker, sleeper, DETAIL_POLL_INTERVAL, |tracker| {
            let line = match (tracker.audit(), tracker.error()) {
                (_, Some(error)) => format!("! {error}"),
                (Some(detail), None) => view::render_status_line(&detail.audit, palette),
                (None, None) => return,
            };
            if line != last_line {
                write_line(out, &line);
                last_line = line;
            }
        });
        let tailing = run_log_panel(&mut panel, sleeper, LOG_POLL_INTERVAL, |panel| {
            if panel.is_collapsed() {
                return;
            }
            for entry in printer.take_new(panel.logs()) {
                write_line(out, &view::render_log_entry(entry, palette));
            }
        });
        tokio::pin!(tracking, tailing);

        // Without a first snapshot there is nothing to follow, so the log panel
        // is dropped with the tracker instead of polling on its own.
        let mut tailing_done = false;
        let loaded = loop {
            tokio::select! {
                biased;
                loaded = &mut tracking => break loaded,
                () = &mut tailing, if !tailing_done => tailing_done = true,
            }
        };
        if loaded && !tailing_done {
            tailing.await;
        }
    }

    match tracker.audit() {
        Some(detail) => Ok(detail.clone()),
        None => Err(tracker
            .error()
            .unwrap_or(DETAIL_LOAD_FALLBACK)
            .to_string()),
    }
}

fn write_line<W: Write>(out: &Mutex<W>, line: &str) {
    if let Ok(mut out) = out.lock() {
        let _ = writeln!(out, "{line}");
        let _ = out.flush();
    }
}

async fn emit_output(output: &OutputArgs, contents: String) -> CliResult<()> {
    if let Some(path) = &output.report_output {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, contents).await?;
    } else {
        print!("{contents}");
    }
    Ok(())
}

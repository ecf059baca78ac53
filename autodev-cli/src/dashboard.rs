//! Dashboard view state: the audit list and statistics, kept fresh by polling.

use crate::api::AuditApi;
use crate::submit::{SUBMIT_FALLBACK, submit_form};
use autodev_core::{Audit, AuditCreated, AuditForm, AutodevError, Statistics};
use log::{debug, info, warn};
use std::io::BufRead;
use tokio::sync::mpsc;

const DELETE_FALLBACK: &str = "Failed to delete audit";

/// Inputs that drive the dashboard loop.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DashboardEvent {
    /// Timer-driven refetch.
    Tick,
    /// Manual refetch, shown with a refreshing indicator.
    Refresh,
    /// Delete an audit, then refetch.
    Delete(i64),
    /// Submit a new audit, then refetch.
    Submit(AuditForm),
    /// Leave the dashboard.
    Quit,
}

/// Outcome of the last user action, shown until the next command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Flash {
    /// User-facing failure that must stay visible.
    Alert(String),
    Notice(String),
}

/// Snapshot rendered by the dashboard.
#[derive(Debug, Clone, Default)]
pub(crate) struct DashboardState {
    pub(crate) audits: Vec<Audit>,
    pub(crate) stats: Option<Statistics>,
    pub(crate) loading: bool,
    pub(crate) refreshing: bool,
    pub(crate) last_error: Option<String>,
    pub(crate) flash: Option<Flash>,
}

/// Output side of the dashboard loop.
pub(crate) trait DashboardView {
    fn render(&mut self, state: &DashboardState);
}

/// Dashboard controller holding the latest list and statistics snapshot.
pub(crate) struct Dashboard<'a, A: AuditApi> {
    api: &'a A,
    state: DashboardState,
}

impl<'a, A: AuditApi> Dashboard<'a, A> {
    pub(crate) fn new(api: &'a A) -> Self {
        Self {
            api,
            state: DashboardState {
                loading: true,
                ..DashboardState::default()
            },
        }
    }

    pub(crate) fn state(&self) -> &DashboardState {
        &self.state
    }

    /// Fetch the audit list and statistics concurrently.
    ///
    /// Both snapshots are replaced together or not at all.
    pub(crate) async fn fetch(&mut self) {
        let (audits, stats) = tokio::join!(self.api.list_audits(), self.api.get_statistics());
        match (audits, stats) {
            (Ok(audits), Ok(stats)) => {
                debug!("dashboard fetched {} audits", audits.len());
                self.state.audits = audits;
                self.state.stats = Some(stats);
                self.state.last_error = None;
            }
            (Err(err), _) | (_, Err(err)) => {
                warn!("failed to fetch dashboard data: {err}");
                self.state.last_error = Some(err.to_string());
            }
        }
        self.state.loading = false;
        self.state.refreshing = false;
    }

    /// Fetch outside the timer cadence.
    pub(crate) async fn refresh(&mut self) {
        self.state.refreshing = true;
        self.fetch().await;
    }

    /// Delete an audit and refetch whatever the outcome.
    pub(crate) async fn delete(&mut self, id: i64) -> autodev_core::Result<()> {
        let outcome = self.api.delete_audit(id).await;
        match &outcome {
            Ok(()) => info!("deleted audit #{id}"),
            Err(err) => warn!("failed to delete audit #{id}: {err}"),
        }
        self.fetch().await;
        outcome
    }

    fn set_flash(&mut self, flash: Option<Flash>) {
        self.state.flash = flash;
    }

    /// Submit a new audit and refetch on success.
    pub(crate) async fn submit(&mut self, form: &mut AuditForm) -> autodev_core::Result<AuditCreated> {
        let created = submit_form(self.api, form).await?;
        self.fetch().await;
        Ok(created)
    }
}

/// Run the dashboard until `Quit` arrives or both channels are closed.
///
/// User commands take precedence over timer ticks. A tick keeps the flash
/// message of the last command on screen; any other event replaces it.
pub(crate) async fn run_dashboard<A, V>(
    dashboard: &mut Dashboard<'_, A>,
    commands: &mut mpsc::Receiver<DashboardEvent>,
    ticks: &mut mpsc::Receiver<DashboardEvent>,
    view: &mut V,
) where
    A: AuditApi,
    V: DashboardView,
{
    dashboard.fetch().await;
    view.render(dashboard.state());

    loop {
        let event = tokio::select! {
            biased;
            Some(event) = commands.recv() => event,
            Some(event) = ticks.recv() => event,
            else => break,
        };
        if event != DashboardEvent::Tick {
            dashboard.set_flash(None);
        }
        match event {
            DashboardEvent::Tick => dashboard.fetch().await,
            DashboardEvent::Refresh => dashboard.refresh().await,
            DashboardEvent::Delete(id) => {
                let flash = match dashboard.delete(id).await {
                    Ok(()) => Flash::Notice(format!("Deleted audit #{id}")),
                    Err(err) => Flash::Alert(delete_failure_message(id, &err)),
                };
                dashboard.set_flash(Some(flash));
            }
            DashboardEvent::Submit(mut form) => {
                let flash = match dashboard.submit(&mut form).await {
                    Ok(created) => Flash::Notice(created.message),
                    Err(err) => Flash::Alert(err.user_message(SUBMIT_FALLBACK)),
                };
                dashboard.set_flash(Some(flash));
            }
            DashboardEvent::Quit => break,
        }
        view.render(dashboard.state());
    }
    info!("dashboard stopped");
}

pub(crate) fn delete_failure_message(id: i64, err: &AutodevError) -> String {
    format!("{DELETE_FALLBACK} #{id}: {}", err.user_message("please try again"))
}

/// Parse one line typed while the dashboard is live.
///
/// Blank lines are ignored.
pub(crate) fn parse_command(line: &str) -> Result<Option<DashboardEvent>, String> {
    let mut parts = line.split_whitespace();
    let Some(command) = parts.next() else {
        return Ok(None);
    };
    match command {
        "r" | "refresh" => Ok(Some(DashboardEvent::Refresh)),
        "q" | "quit" => Ok(Some(DashboardEvent::Quit)),
        "d" | "delete" => {
            let id = parts
                .next()
                .ok_or_else(|| "usage: d <audit id>".to_string())?;
            let id = id
                .parse::<i64>()
                .map_err(|_| format!("invalid audit id: {id}"))?;
            Ok(Some(DashboardEvent::Delete(id)))
        }
        "n" | "new" => {
            let url = parts.next().unwrap_or_default();
            let mut form = AuditForm::new(url);
            if let Some(branch) = parts.next() {
                form = form.with_branch(branch);
            }
            Ok(Some(DashboardEvent::Submit(form)))
        }
        other => Err(format!(
            "unknown command: {other} (r = refresh, d <id> = delete, n <url> [branch] = new audit, q = quit)"
        )),
    }
}

/// Forward commands typed on stdin into the dashboard loop.
///
/// Runs on a plain thread so a pending read never holds up runtime shutdown.
pub(crate) fn spawn_command_reader(events: mpsc::Sender<DashboardEvent>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            match parse_command(&line) {
                Ok(Some(event)) => {
                    let quit = event == DashboardEvent::Quit;
                    if events.blocking_send(event).is_err() || quit {
                        break;
                    }
                }
                Ok(None) => {}
                Err(message) => eprintln!("{message}"),
            }
        }
    });
}

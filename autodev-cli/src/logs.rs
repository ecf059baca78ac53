//! Live log panel: polls an audit on its own cadence and keeps only its logs.

use crate::api::AuditApi;
use crate::poll::Sleeper;
use autodev_core::{AuditStatus, LogEntry};
use log::{info, warn};
use std::time::Duration;

/// Log panel state for one audit.
pub(crate) struct LogPanel<'a, A: AuditApi> {
    api: &'a A,
    id: i64,
    logs: Vec<LogEntry>,
    status: Option<AuditStatus>,
    missing: bool,
    collapsed: bool,
}

impl<'a, A: AuditApi> LogPanel<'a, A> {
    pub(crate) fn new(api: &'a A, id: i64) -> Self {
        Self {
            api,
            id,
            logs: Vec::new(),
            status: None,
            missing: false,
            collapsed: false,
        }
    }

    pub(crate) fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    pub(crate) fn status(&self) -> Option<&AuditStatus> {
        self.status.as_ref()
    }

    pub(crate) fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    pub(crate) fn set_collapsed(&mut self, collapsed: bool) {
        self.collapsed = collapsed;
    }

    /// True while the audit runs and at least one entry has arrived.
    pub(crate) fn is_live(&self) -> bool {
        !self.logs.is_empty() && !self.status.as_ref().is_some_and(AuditStatus::is_terminal)
    }

    /// Fetch the audit and keep its log sequence.
    ///
    /// The held logs are only replaced when the payload carries a log array.
    pub(crate) async fn fetch(&mut self) {
        match self.api.get_audit(self.id).await {
            Ok(detail) => {
                self.status = Some(detail.audit.status);
                if let Some(logs) = detail.audit.logs {
                    self.logs = logs;
                }
            }
            Err(err) => {
                warn!("failed to fetch logs for audit #{}: {err}", self.id);
                if err.is_not_found() {
                    self.missing = true;
                }
            }
        }
    }

    pub(crate) fn should_poll(&self) -> bool {
        if self.missing {
            return false;
        }
        !self.status.as_ref().is_some_and(AuditStatus::is_terminal)
    }
}

/// Fetch once, then re-poll every `period` while the audit is in progress.
pub(crate) async fn run_log_panel<A, S, F>(
    panel: &mut LogPanel<'_, A>,
    sleeper: &S,
    period: Duration,
    mut on_update: F,
) where
    A: AuditApi,
    S: Sleeper + ?Sized,
    F: FnMut(&LogPanel<'_, A>),
{
    panel.fetch().await;
    on_update(panel);
    while panel.should_poll() {
        sleeper.sleep(period).await;
        panel.fetch().await;
        on_update(panel);
    }
    info!("stopped polling logs for audit #{}", panel.id);
}

//! Detail view state: one audit tracked until it reaches a terminal status.

use crate::api::AuditApi;
use crate::poll::Sleeper;
use autodev_core::AuditDetail;
use log::{info, warn};
use std::time::Duration;

pub(crate) const DETAIL_LOAD_FALLBACK: &str = "Failed to load audit details";

/// Tracks the latest snapshot of one audit.
pub(crate) struct AuditTracker<'a, A: AuditApi> {
    api: &'a A,
    id: i64,
    audit: Option<AuditDetail>,
    loading: bool,
    error: Option<String>,
}

impl<'a, A: AuditApi> AuditTracker<'a, A> {
    pub(crate) fn new(api: &'a A, id: i64) -> Self {
        Self {
            api,
            id,
            audit: None,
            loading: true,
            error: None,
        }
    }

    pub(crate) fn id(&self) -> i64 {
        self.id
    }

    pub(crate) fn audit(&self) -> Option<&AuditDetail> {
        self.audit.as_ref()
    }

    pub(crate) fn is_loading(&self) -> bool {
        self.loading
    }

    pub(crate) fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Fetch the audit, replacing the held snapshot on success.
    ///
    /// A failed fetch keeps the previous snapshot.
    pub(crate) async fn fetch(&mut self) {
        match self.api.get_audit(self.id).await {
            Ok(detail) => {
                self.audit = Some(detail);
                self.error = None;
            }
            Err(err) => {
                warn!("failed to fetch audit #{}: {err}", self.id);
                self.error = Some(if self.audit.is_none() {
                    DETAIL_LOAD_FALLBACK.to_string()
                } else {
                    err.to_string()
                });
            }
        }
        self.loading = false;
    }

    /// Whether another poll is due.
    ///
    /// Decided from the snapshot just fetched, so the poll that observes a
    /// terminal status is the last one issued. Without a snapshot there is
    /// nothing to track.
    pub(crate) fn should_poll(&self) -> bool {
        self.audit
            .as_ref()
            .is_some_and(|detail| !detail.audit.status.is_terminal())
    }
}

/// Fetch once, then re-poll every `period` while the audit is in progress.
///
/// Returns whether a snapshot was ever loaded.
pub(crate) async fn run_tracker<A, S, F>(
    tracker: &mut AuditTracker<'_, A>,
    sleeper: &S,
    period: Duration,
    mut on_update: F,
) -> bool
where
    A: AuditApi,
    S: Sleeper + ?Sized,
    F: FnMut(&AuditTracker<'_, A>),
{
    tracker.fetch().await;
    on_update(tracker);
    while tracker.should_poll() {
        sleeper.sleep(period).await;
        tracker.fetch().await;
        on_update(tracker);
    }
    info!("stopped polling audit #{}", tracker.id());
    tracker.audit.is_some()
}

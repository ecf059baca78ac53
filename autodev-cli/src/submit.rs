//! Submission flow for new audits.

use crate::api::AuditApi;
use autodev_core::{AuditCreated, AuditForm};
use log::info;

/// Message shown when a failed submission carries no server detail.
pub(crate) const SUBMIT_FALLBACK: &str =
    "Failed to create audit. Please check the URL and try again.";

/// Validate and submit `form`.
///
/// Invalid input never reaches the API. On failure the form is left untouched
/// so it can be resubmitted; on success it is reset.
pub(crate) async fn submit_form<A: AuditApi + ?Sized>(
    api: &A,
    form: &mut AuditForm,
) -> autodev_core::Result<AuditCreated> {
    let request = form.to_request()?;
    let created = api.create_audit(&request).await?;
    info!(
        "created audit #{} for {} ({})",
        created.audit_id, request.url, request.branch
    );
    form.reset();
    Ok(created)
}

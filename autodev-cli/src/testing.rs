//! Test doubles shared by the controller tests.

use crate::api::{ApiFuture, AuditApi};
use autodev_core::{
    Audit, AuditCreated, AuditDetail, AuditStatus, AutodevError, CreateAuditRequest, LogEntry,
    LogLevel, Repository, Statistics, Timestamp,
};
use chrono::{TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::Mutex;

pub(crate) fn timestamp() -> Timestamp {
    Timestamp::from(
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
            .single()
            .expect("date"),
    )
}

pub(crate) fn sample_audit(id: i64, status: AuditStatus) -> Audit {
    Audit {
        id,
        repository_id: 1,
        status,
        task_id: Some(format!("task-{id}")),
        total_files: 10,
        processed_files: 0,
        issues_found: 0,
        fixes_applied: 0,
        pr_url: None,
        pr_number: None,
        error_message: None,
        created_at: timestamp(),
        started_at: None,
        completed_at: None,
        logs: None,
    }
}

pub(crate) fn sample_detail(id: i64, status: AuditStatus) -> AuditDetail {
    AuditDetail {
        audit: sample_audit(id, status),
        repository: Repository {
            id: 1,
            url: "https://github.com/acme/widgets".to_string(),
            owner: "acme".to_string(),
            name: "widgets".to_string(),
            branch: "main".to_string(),
            created_at: timestamp(),
        },
        issues: Vec::new(),
    }
}

pub(crate) fn sample_log(level: LogLevel, message: &str) -> LogEntry {
    LogEntry {
        timestamp: timestamp(),
        level,
        message: message.to_string(),
    }
}

pub(crate) fn not_found(id: i64) -> AutodevError {
    AutodevError::Server {
        status: 404,
        detail: Some(format!("Audit with ID {id} not found")),
    }
}

/// Scripted API that records every call it receives.
pub(crate) struct FakeApi {
    audits: Mutex<autodev_core::Result<Vec<Audit>>>,
    stats: Mutex<autodev_core::Result<Statistics>>,
    details: Mutex<VecDeque<autodev_core::Result<AuditDetail>>>,
    delete_result: Mutex<autodev_core::Result<()>>,
    create_result: Mutex<autodev_core::Result<AuditCreated>>,
    calls: Mutex<Vec<String>>,
    created: Mutex<Vec<CreateAuditRequest>>,
}

impl FakeApi {
    pub(crate) fn new() -> Self {
        Self {
            audits: Mutex::new(Ok(Vec::new())),
            stats: Mutex::new(Ok(Statistics::default())),
            details: Mutex::new(VecDeque::new()),
            delete_result: Mutex::new(Ok(())),
            create_result: Mutex::new(Ok(AuditCreated {
                audit_id: 1,
                task_id: Some("task-1".to_string()),
                status: AuditStatus::Pending,
                message: "Audit job created for acme/widgets. Processing started.".to_string(),
            })),
            calls: Mutex::new(Vec::new()),
            created: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn set_audits(&self, audits: autodev_core::Result<Vec<Audit>>) {
        *self.audits.lock().expect("audits") = audits;
    }

    pub(crate) fn set_stats(&self, stats: autodev_core::Result<Statistics>) {
        *self.stats.lock().expect("stats") = stats;
    }

    pub(crate) fn push_detail(&self, detail: autodev_core::Result<AuditDetail>) {
        self.details.lock().expect("details").push_back(detail);
    }

    pub(crate) fn set_delete_result(&self, result: autodev_core::Result<()>) {
        *self.delete_result.lock().expect("delete") = result;
    }

    pub(crate) fn set_create_result(&self, result: autodev_core::Result<AuditCreated>) {
        *self.create_result.lock().expect("create") = result;
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls").clone()
    }

    pub(crate) fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|entry| *entry == call).count()
    }

    pub(crate) fn created(&self) -> Vec<CreateAuditRequest> {
        self.created.lock().expect("created").clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().expect("calls").push(call);
    }
}

impl AuditApi for FakeApi {
    fn create_audit<'a>(&'a self, request: &'a CreateAuditRequest) -> ApiFuture<'a, AuditCreated> {
        Box::pin(async move {
            self.record(format!("create {}", request.url));
            self.created.lock().expect("created").push(request.clone());
            self.create_result.lock().expect("create").clone()
        })
    }

    fn list_audits(&self) -> ApiFuture<'_, Vec<Audit>> {
        Box::pin(async move {
            self.record("list".to_string());
            self.audits.lock().expect("audits").clone()
        })
    }

    fn get_audit(&self, id: i64) -> ApiFuture<'_, AuditDetail> {
        Box::pin(async move {
            self.record(format!("get {id}"));
            self.details
                .lock()
                .expect("details")
                .pop_front()
                .expect("no more detail responses")
        })
    }

    fn delete_audit(&self, id: i64) -> ApiFuture<'_, ()> {
        Box::pin(async move {
            self.record(format!("delete {id}"));
            self.delete_result.lock().expect("delete").clone()
        })
    }

    fn get_statistics(&self) -> ApiFuture<'_, Statistics> {
        Box::pin(async move {
            self.record("stats".to_string());
            self.stats.lock().expect("stats").clone()
        })
    }
}

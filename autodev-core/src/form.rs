//! Submission form model for new audits.

use crate::domain::CreateAuditRequest;
use crate::error::{AutodevError, Result};

/// Branch used when the user does not pick one.
pub const DEFAULT_BRANCH: &str = "main";

/// User input for a new audit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditForm {
    /// Repository URL. Required.
    pub url: String,
    /// Branch to audit. Required.
    pub branch: String,
    /// Optional GitHub token override.
    pub github_token: Option<String>,
    /// Optional Gemini API key override.
    pub gemini_api_key: Option<String>,
}

impl Default for AuditForm {
    fn default() -> Self {
        Self {
            url: String::new(),
            branch: DEFAULT_BRANCH.to_string(),
            github_token: None,
            gemini_api_key: None,
        }
    }
}

impl AuditForm {
    /// Form for `url` on the default branch.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Replace the branch.
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    /// Set credential overrides; blank values are dropped on submit.
    pub fn with_credentials(
        mut self,
        github_token: Option<String>,
        gemini_api_key: Option<String>,
    ) -> Self {
        self.github_token = github_token;
        self.gemini_api_key = gemini_api_key;
        self
    }

    /// Validate the input and build the request payload.
    pub fn to_request(&self) -> Result<CreateAuditRequest> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(AutodevError::Validation(
                "Repository URL is required".to_string(),
            ));
        }
        let branch = self.branch.trim();
        if branch.is_empty() {
            return Err(AutodevError::Validation("Branch is required".to_string()));
        }
        Ok(CreateAuditRequest::new(
            url,
            branch,
            self.github_token.clone(),
            self.gemini_api_key.clone(),
        ))
    }

    /// Clear the URL and restore the default branch after a submission.
    pub fn reset(&mut self) {
        self.url.clear();
        self.branch = DEFAULT_BRANCH.to_string();
    }
}

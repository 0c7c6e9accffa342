use log::{error, info, warn};
use serde_json::Value;

use crate::config::JiraSettings;
use crate::data_quality::{validate_issues, validate_worklogs, ValidationError};
use crate::jira_client::IssueTracker;
use crate::models::{JiraIssue, JiraWorklog};
use crate::records::{Issue, WorklogEntry};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    /// Listing issues failed; pagination stopped at this offset.
    PageFetch { start_at: u64, reason: String },
    /// The issue was kept without worklogs.
    WorklogFetch { issue_key: String, reason: String },
    /// The issue was dropped.
    IssueProcessing {
        issue_key: Option<String>,
        reason: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchReport {
    pub pages_requested: u32,
    /// Offset of the page that ended pagination.
    pub last_start_at: u64,
    pub failures: Vec<FetchFailure>,
}

impl FetchReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub issues: Vec<Issue>,
    pub report: FetchReport,
}

impl FetchOutcome {
    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
    }
}

pub struct IssueFetcher<C> {
    client: C,
    project: String,
    page_size: u32,
}

impl<C: IssueTracker> IssueFetcher<C> {
    pub fn new(client: C, settings: &JiraSettings) -> Self {
        Self {
            client,
            project: settings.jira_project.clone(),
            page_size: settings.max_results,
        }
    }

    pub fn jql(&self) -> String {
        format!("project=\"{}\" ORDER BY created DESC", self.project)
    }

    pub fn fetch_all_issues_with_worklogs(&self) -> Result<FetchOutcome, ValidationError> {
        info!("Fetching issues from Jira project: {}", self.project);

        let jql = self.jql();
        let mut report = FetchReport::default();
        let mut issues = Vec::new();
        let mut start_at = 0;

        loop {
            report.pages_requested += 1;
            report.last_start_at = start_at;

            let page = match self.client.search_issues(&jql, start_at, self.page_size) {
                Ok(page) => page.issues,
                Err(e) => {
                    error!("Failed to fetch issues at offset {}: {}", start_at, e);
                    report.failures.push(FetchFailure::PageFetch {
                        start_at,
                        reason: e.to_string(),
                    });
                    Vec::new()
                }
            };

            if page.is_empty() {
                break;
            }

            // The offset always moves by the page size, so a short page may
            // leave records behind if the server counts differently.
            if page.len() < self.page_size as usize {
                warn!(
                    "Received {} of {} issues at offset {}; next request starts at {}",
                    page.len(),
                    self.page_size,
                    start_at,
                    start_at + u64::from(self.page_size)
                );
            }

            for raw in &page {
                match self.process_issue(raw, &mut report.failures) {
                    Ok(issue) => issues.push(issue),
                    Err(failure) => {
                        error!("Skipping issue: {:?}", failure);
                        report.failures.push(failure);
                    }
                }
            }

            start_at += u64::from(self.page_size);
        }

        validate_issues(&issues)?;
        for issue in &issues {
            validate_worklogs(issue.worklogs())?;
        }

        info!("Total issues fetched: {}", issues.len());
        Ok(FetchOutcome { issues, report })
    }

    fn process_issue(
        &self,
        raw: &Value,
        failures: &mut Vec<FetchFailure>,
    ) -> Result<Issue, FetchFailure> {
        let processing_failure = |reason: String| FetchFailure::IssueProcessing {
            issue_key: raw.get("key").and_then(Value::as_str).map(str::to_string),
            reason,
        };

        let raw_issue = JiraIssue::from_value(raw).map_err(|e| processing_failure(e.to_string()))?;
        let issue = Issue::from_jira(raw_issue, Vec::new())
            .map_err(|e| processing_failure(e.to_string()))?;
        let key = issue.key();

        info!("Fetching worklogs for issue: {}", key);
        let worklogs = match self.client.get_issue_worklogs(key.as_str()) {
            Ok(page) => page
                .worklogs
                .iter()
                .map(map_worklog)
                .collect::<Result<Vec<_>, _>>()
                .map_err(processing_failure)?,
            Err(e) => {
                error!("Failed to fetch worklogs for issue {}: {}", key, e);
                failures.push(FetchFailure::WorklogFetch {
                    issue_key: key.to_string(),
                    reason: e.to_string(),
                });
                Vec::new()
            }
        };

        Ok(issue.with_worklogs(worklogs))
    }
}

fn map_worklog(raw: &Value) -> Result<WorklogEntry, String> {
    let worklog = JiraWorklog::from_value(raw).map_err(|e| format!("malformed worklog: {e}"))?;
    WorklogEntry::from_jira(worklog).map_err(|e| e.to_string())
}

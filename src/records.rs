use std::fmt;

use chrono::{DateTime, FixedOffset};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::models::{JiraIssue, JiraWorklog};

pub const ISSUE_KEY_PATTERN: &str = r"^[A-Z]+-\d+$";

static ISSUE_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(ISSUE_KEY_PATTERN).unwrap());
static TIME_SPENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(\.\d+)?\s*[wdhm]\w*(\s*\d+(\.\d+)?\s*[wdhm]\w*)*$").unwrap());

/// Jira timestamps look like `2024-01-05T10:00:00.000+0000`.
const JIRA_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("issue key {0:?} is not of the form PROJECT-123")]
    InvalidIssueKey(String),
    #[error("time spent {0:?} has no w/d/h/m unit")]
    InvalidTimeSpent(String),
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("worklog timestamp {0:?} could not be parsed")]
    InvalidTimestamp(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IssueKey(String);

impl IssueKey {
    pub fn parse(value: impl Into<String>) -> Result<Self, RecordError> {
        let value = value.into();
        if ISSUE_KEY.is_match(&value) {
            Ok(Self(value))
        } else {
            Err(RecordError::InvalidIssueKey(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IssueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Duration text such as `2h`, `1w 2d`, `3h30m`, `1.5 hours`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSpent(String);

impl TimeSpent {
    pub fn parse(value: impl Into<String>) -> Result<Self, RecordError> {
        let value = value.into();
        if TIME_SPENT.is_match(value.trim()) {
            Ok(Self(value))
        } else {
            Err(RecordError::InvalidTimeSpent(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TimeSpent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorklogEntry {
    author: String,
    time_spent: TimeSpent,
    comment: Option<String>,
    created: Option<DateTime<FixedOffset>>,
}

impl WorklogEntry {
    pub fn new(
        author: impl Into<String>,
        time_spent: &str,
        comment: Option<String>,
        created: Option<DateTime<FixedOffset>>,
    ) -> Result<Self, RecordError> {
        let author = author.into();
        if author.trim().is_empty() {
            return Err(RecordError::Empty("author"));
        }
        Ok(Self {
            author,
            time_spent: TimeSpent::parse(time_spent)?,
            comment,
            created,
        })
    }

    pub fn from_jira(worklog: JiraWorklog) -> Result<Self, RecordError> {
        let created = worklog
            .created
            .as_deref()
            .map(parse_jira_timestamp)
            .transpose()?;
        Self::new(
            worklog.author.display_name,
            &worklog.time_spent,
            worklog.comment,
            created,
        )
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn time_spent(&self) -> &TimeSpent {
        &self.time_spent
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn created(&self) -> Option<&DateTime<FixedOffset>> {
        self.created.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    key: IssueKey,
    summary: String,
    worklogs: Vec<WorklogEntry>,
}

impl Issue {
    pub fn new(
        key: &str,
        summary: impl Into<String>,
        worklogs: Vec<WorklogEntry>,
    ) -> Result<Self, RecordError> {
        let summary = summary.into();
        if summary.trim().is_empty() {
            return Err(RecordError::Empty("summary"));
        }
        Ok(Self {
            key: IssueKey::parse(key)?,
            summary,
            worklogs,
        })
    }

    pub fn from_jira(issue: JiraIssue, worklogs: Vec<WorklogEntry>) -> Result<Self, RecordError> {
        Self::new(&issue.key, issue.fields.summary, worklogs)
    }

    pub fn with_worklogs(self, worklogs: Vec<WorklogEntry>) -> Self {
        Self { worklogs, ..self }
    }

    pub fn key(&self) -> &IssueKey {
        &self.key
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn worklogs(&self) -> &[WorklogEntry] {
        &self.worklogs
    }

    pub fn worklog_count(&self) -> usize {
        self.worklogs.len()
    }
}

fn parse_jira_timestamp(value: &str) -> Result<DateTime<FixedOffset>, RecordError> {
    DateTime::parse_from_str(value, JIRA_TIMESTAMP_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .map_err(|_| RecordError::InvalidTimestamp(value.to_string()))
}

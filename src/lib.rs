pub mod config;
pub mod data_quality;
pub mod expectations;
pub mod fetcher;
pub mod jira_client;
pub mod logging;
pub mod models;
pub mod records;

pub use config::{ConfigError, JiraSettings, SecretToken};
pub use data_quality::{validate_issues, validate_worklogs, ValidationError};
pub use fetcher::{FetchFailure, FetchOutcome, FetchReport, IssueFetcher};
pub use jira_client::{IssueTracker, JiraClient, JiraError};
pub use records::{Issue, IssueKey, RecordError, TimeSpent, WorklogEntry};

use itertools::Itertools;
use log::{error, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::expectations::{Batch, Expectation, ExpectationResult, ValidationReport, ValueKind};
use crate::records::{Issue, WorklogEntry, ISSUE_KEY_PATTERN};

static ISSUE_EXPECTATIONS: Lazy<Vec<Expectation>> = Lazy::new(|| {
    vec![
        Expectation::not_null("key"),
        Expectation::match_regex("key", Regex::new(ISSUE_KEY_PATTERN).unwrap()),
        Expectation::not_null("summary"),
        Expectation::between("worklog_count", Some(0), None),
    ]
});

static WORKLOG_EXPECTATIONS: Lazy<Vec<Expectation>> = Lazy::new(|| {
    vec![
        Expectation::not_null("author"),
        Expectation::of_type("author", ValueKind::Text),
        Expectation::not_null("time_spent"),
        Expectation::of_type("time_spent", ValueKind::Text),
    ]
});

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Jira {} data validation failed: {}", .report.batch, failed_rules(.report))]
pub struct ValidationError {
    pub report: ValidationReport,
}

impl ValidationError {
    pub fn failures(&self) -> impl Iterator<Item = &ExpectationResult> {
        self.report.failures()
    }
}

pub fn issue_batch(issues: &[Issue]) -> Batch {
    Batch::new("issues")
        .with_column("key", issues.iter().map(|i| i.key().as_str()))
        .with_column("summary", issues.iter().map(|i| i.summary()))
        .with_column(
            "worklog_count",
            issues.iter().map(|i| i64::try_from(i.worklog_count()).unwrap_or(i64::MAX)),
        )
}

pub fn worklog_batch(worklogs: &[WorklogEntry]) -> Batch {
    Batch::new("worklogs")
        .with_column("author", worklogs.iter().map(|w| w.author()))
        .with_column("time_spent", worklogs.iter().map(|w| w.time_spent().as_str()))
        .with_column("comment", worklogs.iter().map(|w| w.comment().unwrap_or_default()))
}

pub fn validate_issues(issues: &[Issue]) -> Result<(), ValidationError> {
    check_issue_batch(&issue_batch(issues))
}

pub fn validate_worklogs(worklogs: &[WorklogEntry]) -> Result<(), ValidationError> {
    if worklogs.is_empty() {
        warn!("No worklogs found, skipping validation.");
        return Ok(());
    }
    check_worklog_batch(&worklog_batch(worklogs))
}

pub fn check_issue_batch(batch: &Batch) -> Result<(), ValidationError> {
    info!("Validating {} rows of Jira {}", batch.row_count(), batch.name());
    conclude(batch.validate(&ISSUE_EXPECTATIONS))
}

pub fn check_worklog_batch(batch: &Batch) -> Result<(), ValidationError> {
    conclude(batch.validate(&WORKLOG_EXPECTATIONS))
}

fn failed_rules(report: &ValidationReport) -> String {
    report.failures().map(|f| f.expectation).join(", ")
}

fn conclude(report: ValidationReport) -> Result<(), ValidationError> {
    if report.success() {
        info!("Jira {} data validation passed.", report.batch);
        return Ok(());
    }
    error!(
        "Jira {} data validation failed. Details: {}",
        report.batch,
        report.failures().join("; ")
    );
    Err(ValidationError { report })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expectations::Value;

    fn worklog(author: &str, time_spent: &str) -> WorklogEntry {
        WorklogEntry::new(author, time_spent, Some("Worked on feature".into()), None).unwrap()
    }

    #[test]
    fn valid_issues_pass() {
        let issues = vec![
            Issue::new("TEST-1", "Valid Issue", Vec::new()).unwrap(),
            Issue::new("TEST-2", "Another", vec![worklog("John Doe", "1h")]).unwrap(),
        ];
        assert_eq!(validate_issues(&issues), Ok(()));
    }

    #[test]
    fn empty_issue_batch_passes() {
        assert_eq!(validate_issues(&[]), Ok(()));
    }

    #[test]
    fn malformed_key_fails_the_regex_rule() {
        let batch = Batch::new("issues")
            .with_column("key", ["invalid_key"])
            .with_column("summary", ["Missing Project Key"])
            .with_column("worklog_count", [0_i64]);

        let err = check_issue_batch(&batch).unwrap_err();
        let failed = err.failures().map(|f| f.expectation).collect::<Vec<_>>();
        assert_eq!(failed, vec!["expect_column_values_to_match_regex"]);
        assert_eq!(
            err.to_string(),
            "Jira issues data validation failed: expect_column_values_to_match_regex"
        );
    }

    #[test]
    fn null_summary_and_negative_count_are_both_reported() {
        let batch = Batch::new("issues")
            .with_column("key", ["TEST-1", "TEST-2"])
            .with_column("summary", [Some("ok"), None])
            .with_column("worklog_count", [1_i64, -1]);

        let err = check_issue_batch(&batch).unwrap_err();
        let failed = err
            .failures()
            .map(|f| (f.expectation, f.column.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(
            failed,
            vec![
                ("expect_column_values_to_not_be_null", "summary"),
                ("expect_column_values_to_be_between", "worklog_count"),
            ]
        );
    }

    #[test]
    fn valid_worklogs_pass() {
        let worklogs = vec![worklog("John Doe", "1h"), worklog("Jane Doe", "2h")];
        assert_eq!(validate_worklogs(&worklogs), Ok(()));
    }

    #[test]
    fn empty_worklogs_are_not_evaluated() {
        assert_eq!(validate_worklogs(&[]), Ok(()));
    }

    #[test]
    fn worklog_batch_projects_missing_comment_as_empty_text() {
        let entry = WorklogEntry::new("Jane", "1h", None, None).unwrap();
        let batch = worklog_batch(&[entry]);
        assert_eq!(
            batch.column("comment").unwrap().values,
            vec![Value::Text(String::new())]
        );
    }

    #[test]
    fn non_text_author_fails_type_rule() {
        let batch = Batch::new("worklogs")
            .with_column("author", [Value::Integer(7)])
            .with_column("time_spent", [Value::Null]);

        let err = check_worklog_batch(&batch).unwrap_err();
        let failed = err
            .failures()
            .map(|f| (f.expectation, f.column.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(
            failed,
            vec![
                ("expect_column_values_to_be_of_type", "author"),
                ("expect_column_values_to_not_be_null", "time_spent"),
            ]
        );
    }
}

//! Wire shapes of the Jira REST API v2 payloads this crate reads.
//!
//! Page envelopes are decoded eagerly, but the records inside them are kept
//! as raw JSON so that one malformed issue or worklog cannot poison a whole
//! page. Records are decoded one by one with [`JiraIssue::from_value`] and
//! [`JiraWorklog::from_value`].

use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct JiraUser {
    #[serde(rename = "displayName")]
    pub display_name: String,
}

/// One page of `/rest/api/2/search`.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct IssuePage {
    #[serde(rename = "startAt", default)]
    pub start_at: u64,
    #[serde(rename = "maxResults", default)]
    pub max_results: u64,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub issues: Vec<Value>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct JiraIssue {
    pub key: String,
    pub fields: JiraIssueFields,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct JiraIssueFields {
    pub summary: String,
}

impl JiraIssue {
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }
}

/// Response of `/rest/api/2/issue/{key}/worklog`.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct WorklogPage {
    #[serde(rename = "startAt", default)]
    pub start_at: u64,
    #[serde(rename = "maxResults", default)]
    pub max_results: u64,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub worklogs: Vec<Value>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct JiraWorklog {
    pub author: JiraUser,
    #[serde(rename = "timeSpent")]
    pub time_spent: String,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub created: Option<String>,
}

impl JiraWorklog {
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn issue_page_tolerates_missing_metadata() {
        let page: IssuePage = serde_json::from_value(json!({ "issues": [] })).unwrap();
        assert_eq!(page.start_at, 0);
        assert_eq!(page.total, 0);
        assert!(page.issues.is_empty());
    }

    #[test]
    fn issue_decodes_key_and_summary() {
        let raw = json!({ "key": "TEST-1", "fields": { "summary": "Fix bug", "status": {} } });
        let issue = JiraIssue::from_value(&raw).unwrap();
        assert_eq!(issue.key, "TEST-1");
        assert_eq!(issue.fields.summary, "Fix bug");
    }

    #[test]
    fn issue_without_fields_is_rejected() {
        assert!(JiraIssue::from_value(&json!({ "key": "TEST-1" })).is_err());
    }

    #[test]
    fn worklog_reads_nested_author_display_name() {
        let raw = json!({
            "author": { "displayName": "Jane", "accountId": "abc" },
            "timeSpent": "1h",
            "comment": null,
            "created": "2024-01-05T10:00:00.000+0000"
        });
        let worklog = JiraWorklog::from_value(&raw).unwrap();
        assert_eq!(worklog.author.display_name, "Jane");
        assert_eq!(worklog.time_spent, "1h");
        assert_eq!(worklog.comment, None);
        assert_eq!(worklog.created.as_deref(), Some("2024-01-05T10:00:00.000+0000"));
    }
}

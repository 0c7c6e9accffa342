use reqwest::blocking::{Client, Response};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::JiraSettings;
use crate::models::{IssuePage, WorklogPage};

#[derive(Error, Debug)]
pub enum JiraError {
    #[error("could not build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    #[error("invalid request URL: {0}")]
    Url(String),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("authentication rejected ({status}): {body}")]
    Authentication { status: StatusCode, body: String },
    #[error("http {status}: {body}")]
    Http { status: StatusCode, body: String },
    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// The two read operations the fetcher needs from an issue tracker.
pub trait IssueTracker {
    fn search_issues(
        &self,
        jql: &str,
        start_at: u64,
        max_results: u32,
    ) -> Result<IssuePage, JiraError>;

    fn get_issue_worklogs(&self, issue_key: &str) -> Result<WorklogPage, JiraError>;
}

impl<T: IssueTracker + ?Sized> IssueTracker for &T {
    fn search_issues(
        &self,
        jql: &str,
        start_at: u64,
        max_results: u32,
    ) -> Result<IssuePage, JiraError> {
        (**self).search_issues(jql, start_at, max_results)
    }

    fn get_issue_worklogs(&self, issue_key: &str) -> Result<WorklogPage, JiraError> {
        (**self).get_issue_worklogs(issue_key)
    }
}

pub struct JiraClient {
    client: Client,
    base_url: Url,
    username: String,
    api_token: String,
}

impl JiraClient {
    pub fn new(settings: &JiraSettings) -> Result<Self, JiraError> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(JiraError::ClientBuild)?;

        Ok(Self {
            client,
            base_url: settings.jira_url.clone(),
            username: settings.jira_username.clone(),
            api_token: settings.jira_api_token.expose_secret().to_string(),
        })
    }

    fn url(&self, path: &str) -> Result<Url, JiraError> {
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join(path.trim_start_matches('/'))
            .map_err(|e| JiraError::Url(e.to_string()))
    }

    fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, JiraError> {
        let response = self
            .client
            .get(self.url(path)?)
            .basic_auth(&self.username, Some(&self.api_token))
            .header(reqwest::header::ACCEPT, "application/json")
            .query(query)
            .send()?;
        parse_json(response)
    }
}

impl IssueTracker for JiraClient {
    fn search_issues(
        &self,
        jql: &str,
        start_at: u64,
        max_results: u32,
    ) -> Result<IssuePage, JiraError> {
        self.get(
            "rest/api/2/search",
            &[
                ("jql", jql.to_string()),
                ("startAt", start_at.to_string()),
                ("maxResults", max_results.to_string()),
                ("fields", "summary".to_string()),
            ],
        )
    }

    fn get_issue_worklogs(&self, issue_key: &str) -> Result<WorklogPage, JiraError> {
        self.get(&format!("rest/api/2/issue/{}/worklog", issue_key), &[])
    }
}

fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, JiraError> {
    let status = response.status();
    let body = response.text()?;
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(JiraError::Authentication { status, body });
    }
    if !status.is_success() {
        return Err(JiraError::Http { status, body });
    }
    Ok(serde_json::from_str(&body)?)
}

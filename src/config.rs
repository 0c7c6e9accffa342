use std::env;
use std::fmt;
use std::path::PathBuf;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use thiserror::Error;

pub const JIRA_URL: &str = "JIRA_URL";
pub const JIRA_USERNAME: &str = "JIRA_USERNAME";
pub const JIRA_API_TOKEN: &str = "JIRA_API_TOKEN";
pub const JIRA_PROJECT: &str = "JIRA_PROJECT";
pub const MAX_RESULTS: &str = "MAX_RESULTS";
pub const JIRA_LOG_FILE: &str = "JIRA_LOG_FILE";

pub const DEFAULT_MAX_RESULTS: u32 = 50;
const MAX_RESULTS_RANGE: std::ops::RangeInclusive<u32> = 1..=100;

static PROJECT_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]+$").unwrap());

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// API token whose formatted output never reveals the value.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretToken(String);

impl SecretToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretToken(\"**********\")")
    }
}

impl fmt::Display for SecretToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("**********")
    }
}

#[derive(Debug, Clone)]
pub struct JiraSettings {
    pub jira_url: Url,
    pub jira_username: String,
    pub jira_api_token: SecretToken,
    pub jira_project: String,
    pub max_results: u32,
    /// Copy of the log written here when set, rotated at 1 MiB.
    pub log_file: Option<PathBuf>,
}

impl JiraSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |var: &'static str| {
            lookup(var)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::Missing(var))
        };

        let jira_url = parse_url(&required(JIRA_URL)?)?;
        let jira_username = required(JIRA_USERNAME)?;
        let jira_api_token = SecretToken::new(required(JIRA_API_TOKEN)?);

        let jira_project = required(JIRA_PROJECT)?;
        if !PROJECT_KEY.is_match(&jira_project) {
            return Err(ConfigError::Invalid {
                var: JIRA_PROJECT,
                reason: format!("{jira_project:?} must match ^[A-Z]+$"),
            });
        }

        let max_results = match lookup(MAX_RESULTS).filter(|value| !value.trim().is_empty()) {
            Some(value) => parse_max_results(value.trim())?,
            None => DEFAULT_MAX_RESULTS,
        };

        let log_file = lookup(JIRA_LOG_FILE)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            jira_url,
            jira_username,
            jira_api_token,
            jira_project,
            max_results,
            log_file,
        })
    }
}

fn parse_url(value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::Invalid {
        var: JIRA_URL,
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url),
        scheme => Err(ConfigError::Invalid {
            var: JIRA_URL,
            reason: format!("expected an http(s) URL with a host, got scheme {scheme:?}"),
        }),
    }
}

fn parse_max_results(value: &str) -> Result<u32, ConfigError> {
    let invalid = || ConfigError::Invalid {
        var: MAX_RESULTS,
        reason: format!(
            "{value:?} is not an integer between {} and {}",
            MAX_RESULTS_RANGE.start(),
            MAX_RESULTS_RANGE.end()
        ),
    };
    value
        .parse::<u32>()
        .ok()
        .filter(|n| MAX_RESULTS_RANGE.contains(n))
        .ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn base() -> HashMap<String, String> {
        vars(&[
            (JIRA_URL, "https://example.atlassian.net"),
            (JIRA_USERNAME, "jane@example.com"),
            (JIRA_API_TOKEN, "s3cr3t"),
            (JIRA_PROJECT, "TEST"),
        ])
    }

    fn load(map: &HashMap<String, String>) -> Result<JiraSettings, ConfigError> {
        JiraSettings::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn loads_with_default_page_size() {
        let settings = load(&base()).unwrap();
        assert_eq!(settings.jira_url.as_str(), "https://example.atlassian.net/");
        assert_eq!(settings.jira_username, "jane@example.com");
        assert_eq!(settings.jira_api_token.expose_secret(), "s3cr3t");
        assert_eq!(settings.jira_project, "TEST");
        assert_eq!(settings.max_results, DEFAULT_MAX_RESULTS);
        assert_eq!(settings.log_file, None);
    }

    #[test]
    fn log_file_is_optional_path() {
        let mut map = base();
        map.insert(JIRA_LOG_FILE.into(), " logs/jira_fetcher.log ".into());
        assert_eq!(
            load(&map).unwrap().log_file,
            Some(PathBuf::from("logs/jira_fetcher.log"))
        );
    }

    #[test]
    fn reads_explicit_page_size() {
        let mut map = base();
        map.insert(MAX_RESULTS.into(), "100".into());
        assert_eq!(load(&map).unwrap().max_results, 100);
    }

    #[test]
    fn page_size_out_of_range_is_rejected() {
        for bad in ["0", "101", "-1", "fifty"] {
            let mut map = base();
            map.insert(MAX_RESULTS.into(), bad.into());
            assert!(
                matches!(load(&map), Err(ConfigError::Invalid { var: MAX_RESULTS, .. })),
                "{bad}"
            );
        }
    }

    #[test]
    fn each_required_variable_is_enforced() {
        for var in [JIRA_URL, JIRA_USERNAME, JIRA_API_TOKEN, JIRA_PROJECT] {
            let mut map = base();
            map.remove(var);
            assert_eq!(load(&map).unwrap_err(), ConfigError::Missing(var));

            map.insert(var.into(), "   ".into());
            assert_eq!(load(&map).unwrap_err(), ConfigError::Missing(var));
        }
    }

    #[test]
    fn project_key_must_be_uppercase_letters() {
        for bad in ["test", "TEST1", "TE-ST"] {
            let mut map = base();
            map.insert(JIRA_PROJECT.into(), bad.into());
            assert!(matches!(
                load(&map),
                Err(ConfigError::Invalid { var: JIRA_PROJECT, .. })
            ));
        }
    }

    #[test]
    fn url_must_be_http() {
        for bad in ["not a url", "ftp://example.com", "mailto:jane@example.com"] {
            let mut map = base();
            map.insert(JIRA_URL.into(), bad.into());
            assert!(matches!(
                load(&map),
                Err(ConfigError::Invalid { var: JIRA_URL, .. })
            ));
        }
    }

    #[test]
    fn token_is_redacted_when_formatted() {
        let settings = load(&base()).unwrap();
        let debug = format!("{settings:?}");
        assert!(!debug.contains("s3cr3t"));
        assert_eq!(settings.jira_api_token.to_string(), "**********");
    }
}

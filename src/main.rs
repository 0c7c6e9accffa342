use anyhow::Context;
use jira_worklog_fetcher::{logging, IssueFetcher, JiraClient, JiraSettings};
use log::{info, warn};

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let settings = JiraSettings::from_env().context("Invalid Jira configuration")?;
    logging::init(settings.log_file.as_deref()).context("Could not open log file")?;

    let client = JiraClient::new(&settings).context("Could not create Jira client")?;
    let fetcher = IssueFetcher::new(client, &settings);

    let outcome = fetcher
        .fetch_all_issues_with_worklogs()
        .context("Fetched data did not pass validation")?;

    for issue in &outcome.issues {
        info!(
            "{}: {} ({} worklogs)",
            issue.key(),
            issue.summary(),
            issue.worklog_count()
        );
    }
    if !outcome.report.is_clean() {
        warn!(
            "{} items failed during the fetch",
            outcome.report.failures.len()
        );
        for failure in &outcome.report.failures {
            warn!("{:?}", failure);
        }
    }

    Ok(())
}

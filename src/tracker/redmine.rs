use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::{
    error::{Error, Result},
    tracker::{IssueId, TrackerIssue, TrackerProvider},
};

#[derive(Deserialize)]
struct Envelope {
    issue: TrackerIssue,
}

/// Blocking client for a Redmine tracker's JSON API.
#[derive(Debug, Clone)]
pub struct RedmineClient {
    client: Client,
    base: String,
}

impl RedmineClient {
    pub fn new(base: &str) -> Result<Self> {
        let base = base.trim_end_matches('/').to_owned();
        let client = Client::builder()
            .user_agent(concat!("relnotes/", env!("CARGO_PKG_VERSION")))
            .timeout(None::<Duration>)
            .build()
            .map_err(|source| Error::Http {
                url: base.clone(),
                source,
            })?;

        Ok(RedmineClient { client, base })
    }

    /// Human facing address of an issue.
    pub fn issue_url(&self, id: &IssueId) -> String { format!("{}/issues/{id}", self.base) }
}

impl TrackerProvider for RedmineClient {
    fn issue(&self, id: &IssueId) -> Result<TrackerIssue> {
        let url = format!("{}.json", self.issue_url(id));
        debug!("GET {url}?include=relations");

        self.client
            .get(&url)
            .query(&[("include", "relations")])
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<Envelope>())
            .map(|envelope| envelope.issue)
            .map_err(|source| Error::Http { url, source })
    }
}

use std::time::Duration;

use log::debug;
use reqwest::{
    blocking::Client,
    header::{ACCEPT, AUTHORIZATION},
};

use crate::{
    error::{Error, Result},
    git::PrNumber,
    provider::{PullRequest, PullRequestProvider},
};

/// Blocking client for the GitHub REST API.
///
/// Requests carry no timeout and are never retried; a failure is handed back
/// to the caller as is.
///
/// # Example
///
/// ```no_run
/// # use relnotes::provider::{GithubClient, PullRequestProvider};
/// let gh = GithubClient::new("https://api.github.com", "ceph/ceph", None).unwrap();
/// let pr = gh.pull_request(13911).unwrap();
/// println!("{}", pr.title);
/// ```
#[derive(Debug, Clone)]
pub struct GithubClient {
    client: Client,
    api: String,
    repository: String,
    token: Option<String>,
}

impl GithubClient {
    /// `repository` is the `<owner>/<name>` slug.
    pub fn new(api: &str, repository: &str, token: Option<String>) -> Result<Self> {
        if repository.split('/').filter(|s| !s.is_empty()).count() != 2 {
            return Err(Error::Repository(repository.to_owned()));
        }
        let api = api.trim_end_matches('/').to_owned();
        let client = Client::builder()
            .user_agent(concat!("relnotes/", env!("CARGO_PKG_VERSION")))
            .timeout(None::<Duration>)
            .build()
            .map_err(|source| Error::Http {
                url: api.clone(),
                source,
            })?;

        Ok(GithubClient {
            client,
            api,
            repository: repository.to_owned(),
            token,
        })
    }

    fn get(&self, resource: &str, number: PrNumber) -> Result<PullRequest> {
        let url = format!("{}/repos/{}/{resource}/{number}", self.api, self.repository);
        debug!("GET {url}");

        let mut request = self
            .client
            .get(&url)
            .header(ACCEPT, "application/vnd.github+json");
        if let Some(token) = self.token.as_deref() {
            request = request.header(AUTHORIZATION, format!("token {token}"));
        }

        request
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<PullRequest>())
            .map_err(|source| Error::Http { url, source })
    }
}

impl PullRequestProvider for GithubClient {
    fn pull_request(&self, number: PrNumber) -> Result<PullRequest> { self.get("pulls", number) }

    fn issue(&self, number: PrNumber) -> Result<PullRequest> { self.get("issues", number) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_slug_is_validated() {
        assert!(GithubClient::new("https://api.github.com", "ceph/ceph", None).is_ok());
        assert!(matches!(
            GithubClient::new("https://api.github.com", "ceph", None),
            Err(Error::Repository(_))
        ));
    }
}

mod github;

use std::collections::BTreeSet;

use serde::Deserialize;

pub use self::github::GithubClient;
use crate::{error::Result, git::PrNumber};

/// Title, body and labels of a pull request or issue, as the hosting
/// platform reports them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PullRequest {
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub body: String,
    #[serde(default, deserialize_with = "label_names")]
    pub labels: BTreeSet<String>,
}

/// Read-only access to pull request metadata.
///
/// Pull requests and issues share one numbering on the hosting platform, so
/// `issue()` answers for the same numbers and is where labels are looked up.
pub trait PullRequestProvider {
    fn pull_request(&self, number: PrNumber) -> Result<PullRequest>;

    fn issue(&self, number: PrNumber) -> Result<PullRequest>;
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::de::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn label_names<'de, D>(deserializer: D) -> std::result::Result<BTreeSet<String>, D::Error>
where
    D: serde::de::Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Label {
        name: String,
    }

    let labels = Option::<Vec<Label>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(labels.into_iter().map(|l| l.name).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_pull_request() {
        let json = r#"{
            "number": 13911,
            "title": "osd: fix the thing",
            "body": null,
            "labels": [{"id": 1, "name": "core"}, {"id": 2, "name": "bug-fix"}]
        }"#;
        let pr: PullRequest = serde_json::from_str(json).unwrap();

        assert_eq!(pr.title, "osd: fix the thing");
        assert_eq!(pr.body, "");
        assert_eq!(
            pr.labels.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["bug-fix", "core"]
        );
    }

    #[test]
    fn deserialize_without_labels() {
        let pr: PullRequest =
            serde_json::from_str(r#"{"title": "t", "body": "Fixes: #1"}"#).unwrap();
        assert_eq!(pr.body, "Fixes: #1");
        assert!(pr.labels.is_empty());
    }
}

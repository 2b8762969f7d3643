use crate::{git::PrNumber, tracker::IssueId};

/// Builds the hyperlinks cited in marked-up release notes.
///
/// # Example
///
/// ```
/// # use relnotes::Links;
/// let links = Links::new("http://tracker.ceph.com/", "https://github.com/ceph/ceph");
///
/// assert_eq!(links.issue_link(&"17305".into()), "http://tracker.ceph.com/issues/17305");
/// assert_eq!(links.pr_link(13911), "https://github.com/ceph/ceph/pull/13911");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Links {
    tracker: String,
    repository: String,
}

impl Links {
    pub fn new<S: AsRef<str>>(tracker: S, repository: S) -> Self {
        Links {
            tracker: tracker.as_ref().trim_end_matches('/').to_owned(),
            repository: repository.as_ref().trim_end_matches('/').to_owned(),
        }
    }

    /// Gets a hyperlink url to a tracker issue.
    pub fn issue_link(&self, issue: &IssueId) -> String { format!("{}/issues/{issue}", self.tracker) }

    /// Gets a hyperlink url to a pull request.
    pub fn pr_link(&self, number: PrNumber) -> String { format!("{}/pull/{number}", self.repository) }
}

use indexmap::IndexSet;
use log::debug;
use regex::Regex;

use crate::{
    error::{Error, Result},
    git::Commit,
    provider::PullRequest,
    tracker::IssueId,
};

/// Title and extra message lines derived from a merge commit and its pull
/// request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleMessage {
    pub title: String,
    /// Extra lines to print under the entry, trimmed and in commit order.
    pub message: Vec<String>,
}

/// Picks the title of a release note entry.
///
/// The pull request title is the default. Outside strict mode the merge
/// commit body may override it: review trailers and blank lines are dropped,
/// a single remaining line replaces the title unless it merely repeats it,
/// several lines become the extra message.
pub fn title_message(merge: &Commit, pr_title: &str, strict: bool) -> TitleMessage {
    let keep_title = || TitleMessage {
        title: pr_title.to_owned(),
        message: vec![],
    };
    if strict {
        return keep_title();
    }

    let reviewed_by = regex!(r"(?i)^Rev.*By");
    let mut lines: Vec<String> = merge
        .body_lines()
        .filter(|l| !reviewed_by.is_match(l))
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_owned)
        .collect();

    match lines.len() {
        0 => keep_title(),
        1 if lines[0] == pr_title.trim() => keep_title(),
        1 => TitleMessage {
            title: lines.remove(0),
            message: vec![],
        },
        _ => TitleMessage {
            title: pr_title.to_owned(),
            message: lines,
        },
    }
}

/// Issues and contributors referenced by a pull request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct References {
    /// Issue ids in first-seen order.
    pub issues: IndexSet<IssueId>,
    /// `Signed-off-by` names in first-seen order.
    pub authors: IndexSet<String>,
}

impl References {
    /// Every signer joined into one author line, `None` when nobody signed
    /// off.
    pub fn author(&self) -> Option<String> {
        if self.authors.is_empty() {
            return None;
        }
        Some(
            self.authors
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", "),
        )
    }
}

/// Finds issue references and sign-offs in pull request text.
#[derive(Debug, Clone)]
pub struct Extractor {
    tracker: Regex,
}

impl Extractor {
    /// `tracker_url` is the tracker's base address, e.g.
    /// `http://tracker.ceph.com`; either scheme is accepted in references.
    pub fn new(tracker_url: &str) -> Result<Self> {
        let host = tracker_url
            .trim_end_matches('/')
            .trim_start_matches("https://")
            .trim_start_matches("http://");
        let pattern = format!(r"https?://{}/issues/(\d+)", regex::escape(host));
        let tracker = Regex::new(&pattern).map_err(|e| Error::Pattern(pattern, e))?;
        Ok(Extractor { tracker })
    }

    /// Collects issue ids mentioned in `text` into `into`.
    pub fn issues_in(&self, text: &str, into: &mut IndexSet<IssueId>) {
        let fixes = regex!(r"Fixes:? #(\d+)");
        for caps in fixes.captures_iter(text) {
            into.insert(IssueId::new(&caps[1]));
        }
        for caps in self.tracker.captures_iter(text) {
            into.insert(IssueId::new(&caps[1]));
        }
    }

    /// Gathers references from the pull request body and every commit of its
    /// branch.
    pub fn references(&self, pr: &PullRequest, branch: &[Commit]) -> References {
        let mut refs = References::default();
        self.issues_in(&pr.body, &mut refs.issues);

        for commit in branch {
            debug!("Scanning branch commit {}", commit.sha);
            refs.authors.extend(signed_off_by(&commit.message));
            self.issues_in(&commit.message, &mut refs.issues);
        }

        refs
    }
}

/// Names from `Signed-off-by: Name <email>` trailers.
pub fn signed_off_by(message: &str) -> impl Iterator<Item = String> + '_ {
    regex!(r"Signed-off-by:\s*(.*?)\s*<")
        .captures_iter(message)
        .map(|caps| caps[1].to_owned())
}

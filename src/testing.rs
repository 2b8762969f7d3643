//! In-memory stand-ins for git and the two providers.

use std::{
    cell::Cell,
    collections::{BTreeSet, HashMap},
};

use crate::{
    aggregate::PullRequestEntry,
    component::ClassifiedTitle,
    error::{Error, Result},
    git::{Commit, History, PrNumber},
    provider::{PullRequest, PullRequestProvider},
    tracker::{IssueId, Relation, TrackerIssue, TrackerName, TrackerProvider},
};

pub fn commit(sha: &str, parents: &[&str], message: &str) -> Commit {
    Commit {
        sha: sha.to_owned(),
        parents: parents.iter().map(|p| p.to_string()).collect(),
        author: "Branch Author".to_owned(),
        summary: message.lines().next().unwrap_or_default().to_owned(),
        message: message.to_owned(),
    }
}

/// A pull request merge commit whose body is `body`, one line per item.
pub fn merge_with_body(number: PrNumber, body: &[&str]) -> Commit {
    let mut message = format!("Merge pull request #{number} from someone/wip-branch");
    for line in body {
        message.push('\n');
        message.push_str(line);
    }
    let tip = format!("tip{number}");
    commit(&format!("merge{number}"), &["main", tip.as_str()], &message)
}

pub fn entry(number: PrNumber, title: &str, issues: &[&str]) -> PullRequestEntry {
    PullRequestEntry {
        number,
        title: ClassifiedTitle::plain(title),
        body: String::new(),
        author: "Jane Doe".to_owned(),
        message: vec![],
        issues: issues.iter().map(|i| IssueId::from(*i)).collect(),
    }
}

pub fn labels(names: &[&str]) -> BTreeSet<String> { names.iter().map(|n| n.to_string()).collect() }

fn not_found(what: String) -> Error {
    Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, what))
}

#[derive(Default)]
pub struct FakeProvider {
    pulls: HashMap<PrNumber, PullRequest>,
    labels: HashMap<PrNumber, BTreeSet<String>>,
    pull_calls: Cell<usize>,
    issue_calls: Cell<usize>,
}

impl FakeProvider {
    pub fn with_pr(mut self, number: PrNumber, title: &str, body: &str) -> Self {
        self.pulls.insert(
            number,
            PullRequest {
                title: title.to_owned(),
                body: body.to_owned(),
                labels: BTreeSet::new(),
            },
        );
        self
    }

    pub fn with_labels(mut self, number: PrNumber, names: &[&str]) -> Self {
        self.labels.insert(number, labels(names));
        self
    }

    pub fn pull_calls(&self) -> usize { self.pull_calls.get() }

    pub fn issue_calls(&self) -> usize { self.issue_calls.get() }
}

impl PullRequestProvider for FakeProvider {
    fn pull_request(&self, number: PrNumber) -> Result<PullRequest> {
        self.pull_calls.set(self.pull_calls.get() + 1);
        self.pulls
            .get(&number)
            .cloned()
            .ok_or_else(|| not_found(format!("pull request {number}")))
    }

    fn issue(&self, number: PrNumber) -> Result<PullRequest> {
        self.issue_calls.set(self.issue_calls.get() + 1);
        let labels = self
            .labels
            .get(&number)
            .cloned()
            .ok_or_else(|| not_found(format!("issue {number}")))?;
        Ok(PullRequest {
            labels,
            ..self.pulls.get(&number).cloned().unwrap_or_default()
        })
    }
}

pub fn tracker_issue(tracker: &str, copied_to: &[u64]) -> TrackerIssue {
    TrackerIssue {
        tracker: TrackerName {
            name: tracker.to_owned(),
        },
        relations: Some(
            copied_to
                .iter()
                .map(|&issue_id| Relation {
                    issue_id,
                    relation_type: "copied_to".to_owned(),
                })
                .collect(),
        ),
    }
}

pub fn backport(copied_to: &[u64]) -> TrackerIssue { tracker_issue("Backport", copied_to) }

#[derive(Default)]
pub struct FakeTracker {
    issues: HashMap<IssueId, TrackerIssue>,
    calls: Cell<usize>,
}

impl FakeTracker {
    pub fn with(mut self, id: &str, issue: TrackerIssue) -> Self {
        self.issues.insert(IssueId::from(id), issue);
        self
    }

    pub fn calls(&self) -> usize { self.calls.get() }
}

impl TrackerProvider for FakeTracker {
    fn issue(&self, id: &IssueId) -> Result<TrackerIssue> {
        self.calls.set(self.calls.get() + 1);
        self.issues
            .get(id)
            .cloned()
            .ok_or_else(|| not_found(format!("tracker issue {id}")))
    }
}

#[derive(Default)]
pub struct FakeHistory {
    merges: Vec<Commit>,
    branches: HashMap<String, Vec<Commit>>,
    commits: HashMap<String, Commit>,
}

impl FakeHistory {
    /// Adds a merge whose branch consists of `branch`; the branch tip is the
    /// merge's last parent.
    pub fn with_merge(mut self, merge: Commit, branch: Vec<Commit>) -> Self {
        if let Some(tip) = merge.parents.last() {
            let mut tip_commit = commit(tip, &["main"], "tip");
            tip_commit.author = format!("Author of {tip}");
            self.commits.insert(tip.clone(), tip_commit);
        }
        self.branches.insert(merge.sha.clone(), branch);
        self.merges.push(merge);
        self
    }
}

impl History for FakeHistory {
    fn merges(&self, _range: &str) -> Result<Vec<Commit>> { Ok(self.merges.clone()) }

    fn branch_commits(&self, merge: &Commit) -> Result<Vec<Commit>> {
        Ok(self.branches.get(&merge.sha).cloned().unwrap_or_default())
    }

    fn commit(&self, sha: &str) -> Result<Commit> {
        self.commits
            .get(sha)
            .cloned()
            .ok_or_else(|| Error::GitRecord(sha.to_owned()))
    }
}

use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexMap;
use log::debug;

use crate::{component::ClassifiedTitle, diagnostic::Diagnostic, git::PrNumber, tracker::IssueId};

pub type IssueToPrs = BTreeMap<IssueId, BTreeSet<PrNumber>>;
pub type PrToIssues = BTreeMap<PrNumber, BTreeSet<IssueId>>;

/// One release note entry, built from one merged pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestEntry {
    pub number: PrNumber,
    pub title: ClassifiedTitle,
    pub body: String,
    /// Contributors, joined with `", "`.
    pub author: String,
    /// Extra lines printed under the entry.
    pub message: Vec<String>,
    /// Resolved issue ids.
    pub issues: BTreeSet<IssueId>,
}

impl PullRequestEntry {
    /// Entries without a message come first, then by title, then by number.
    pub fn sort_key(&self) -> (Option<&[String]>, &str, PrNumber) {
        let message = (!self.message.is_empty()).then_some(self.message.as_slice());
        (message, self.title.title.as_str(), self.number)
    }
}

/// Accumulates entries and the issue/pull request cross references for a
/// single run.
///
/// Consistency checks that need the complete picture run in
/// [`finish`](Aggregator::finish).
#[derive(Debug, Default)]
pub struct Aggregator {
    strict: bool,
    entries: IndexMap<PrNumber, PullRequestEntry>,
    issue_to_prs: IssueToPrs,
    pr_to_issues: PrToIssues,
    diagnostics: Vec<Diagnostic>,
}

impl Aggregator {
    pub fn new(strict: bool) -> Self {
        Aggregator {
            strict,
            ..Aggregator::default()
        }
    }

    /// Logs and keeps a diagnostic.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        diagnostic.log();
        self.diagnostics.push(diagnostic);
    }

    /// Adds an entry. A pull request seen again replaces the earlier entry
    /// and its cross references.
    pub fn insert(&mut self, entry: PullRequestEntry) {
        let number = entry.number;
        if let Some(previous) = self.entries.shift_remove(&number) {
            debug!("PR#{number} seen twice, keeping the later one");
            for issue in &previous.issues {
                if let Some(prs) = self.issue_to_prs.get_mut(issue) {
                    prs.remove(&number);
                    if prs.is_empty() {
                        self.issue_to_prs.remove(issue);
                    }
                }
            }
            self.pr_to_issues.remove(&number);
        }

        for issue in &entry.issues {
            self.issue_to_prs
                .entry(issue.clone())
                .or_default()
                .insert(number);
            self.pr_to_issues
                .entry(number)
                .or_default()
                .insert(issue.clone());
        }
        self.entries.insert(number, entry);
    }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Ends collection. In strict mode every issue fixed by more than one
    /// pull request is reported.
    pub fn finish(mut self) -> ReleaseNotesData {
        if self.strict {
            let duplicates: Vec<Diagnostic> = self
                .issue_to_prs
                .iter()
                .filter(|(_, prs)| prs.len() > 1)
                .map(|(issue, prs)| Diagnostic::DuplicateIssue {
                    issue: issue.clone(),
                    prs: prs.iter().copied().collect(),
                })
                .collect();
            for d in duplicates {
                self.report(d);
            }
        }

        ReleaseNotesData {
            entries: self.entries.into_values().collect(),
            issue_to_prs: self.issue_to_prs,
            pr_to_issues: self.pr_to_issues,
            diagnostics: self.diagnostics,
        }
    }
}

/// Everything collected in a run, ready to be written.
#[derive(Debug, Clone, Default)]
pub struct ReleaseNotesData {
    /// Entries in collection order.
    pub entries: Vec<PullRequestEntry>,
    pub issue_to_prs: IssueToPrs,
    pub pr_to_issues: PrToIssues,
    pub diagnostics: Vec<Diagnostic>,
}

impl ReleaseNotesData {
    /// Entries in the order they are written.
    pub fn sorted_entries(&self) -> Vec<&PullRequestEntry> {
        let mut sorted: Vec<&PullRequestEntry> = self.entries.iter().collect();
        sorted.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        sorted
    }
}

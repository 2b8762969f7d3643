mod redmine;

use std::{cmp::Ordering, collections::HashMap, fmt};

use log::debug;
use serde::{Deserialize, Serialize};

pub use self::redmine::RedmineClient;
use crate::error::Result;

const BACKPORT_TRACKER: &str = "Backport";
const COPIED_TO: &str = "copied_to";

/// An issue reference, normalized to its bare decimal digits.
///
/// Ordering is numeric for well-formed ids so rendered citations come out as
/// `#9, #10` rather than `#10, #9`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueId(String);

impl IssueId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        let id = id.into();
        let trimmed = id.trim().trim_start_matches('#');
        if trimmed.len() == id.len() {
            IssueId(id)
        } else {
            IssueId(trimmed.to_owned())
        }
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl From<&str> for IssueId {
    fn from(s: &str) -> Self { IssueId::new(s) }
}

impl From<u64> for IssueId {
    fn from(n: u64) -> Self { IssueId(n.to_string()) }
}

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl Ord for IssueId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for IssueId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

/// The parts of a tracker issue needed to follow a backport home.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrackerIssue {
    pub tracker: TrackerName,
    #[serde(default)]
    pub relations: Option<Vec<Relation>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrackerName {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Relation {
    pub issue_id: u64,
    pub relation_type: String,
}

/// Read-only access to the issue tracker.
pub trait TrackerProvider {
    /// Fetches `id` together with its relations.
    fn issue(&self, id: &IssueId) -> Result<TrackerIssue>;
}

/// How an issue id was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Not a backport, or a backport with nothing to follow.
    Unchanged(IssueId),
    /// A backport copied from the contained original issue.
    Original(IssueId),
    /// A backport with several `copied_to` relations; kept as is.
    Ambiguous { id: IssueId, candidates: Vec<IssueId> },
}

impl Resolution {
    /// The id to report the issue under.
    pub fn id(&self) -> &IssueId {
        match self {
            Resolution::Unchanged(id) | Resolution::Original(id) => id,
            Resolution::Ambiguous { id, .. } => id,
        }
    }
}

/// Decides how `id` resolves given its tracker record.
pub fn resolve_issue(id: &IssueId, issue: &TrackerIssue) -> Resolution {
    if issue.tracker.name != BACKPORT_TRACKER {
        debug!("issue {id} is from the tracker {}, not a backport", issue.tracker.name);
        return Resolution::Unchanged(id.clone());
    }

    let Some(relations) = issue.relations.as_ref() else {
        debug!("backport {id} has no relations");
        return Resolution::Unchanged(id.clone());
    };

    let mut copied_to: Vec<IssueId> = relations
        .iter()
        .filter(|r| r.relation_type == COPIED_TO)
        .map(|r| IssueId::from(r.issue_id))
        .collect();

    match copied_to.len() {
        0 => {
            debug!("backport {id} has no copied_to relations");
            Resolution::Unchanged(id.clone())
        }
        1 => {
            let original = copied_to.remove(0);
            debug!("issue {id} is the backport of {original}");
            Resolution::Original(original)
        }
        _ => Resolution::Ambiguous {
            id: id.clone(),
            candidates: copied_to,
        },
    }
}

/// Resolves backport issues to their original issue, asking the tracker at
/// most once per distinct id.
pub struct Resolver<'a> {
    tracker: &'a dyn TrackerProvider,
    resolved: HashMap<IssueId, Resolution>,
}

impl<'a> Resolver<'a> {
    pub fn new(tracker: &'a dyn TrackerProvider) -> Self {
        Resolver {
            tracker,
            resolved: HashMap::new(),
        }
    }

    pub fn resolve(&mut self, id: &IssueId) -> Result<Resolution> {
        if let Some(known) = self.resolved.get(id) {
            return Ok(known.clone());
        }
        let resolution = resolve_issue(id, &self.tracker.issue(id)?);
        self.resolved.insert(id.clone(), resolution.clone());
        Ok(resolution)
    }
}

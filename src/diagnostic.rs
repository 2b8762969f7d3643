use std::fmt;

use log::{error, info, warn, Level};

use crate::{git::PrNumber, tracker::IssueId};

/// A condition reported while collecting release notes that does not stop
/// the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Pull request numbered below the legacy threshold, skipped.
    LegacyPullRequest { number: PrNumber },
    /// A provider call failed; the pull request was skipped.
    FetchFailed { number: PrNumber, error: String },
    /// Strict mode: pull request without issue references, skipped.
    MissingIssues { number: PrNumber },
    /// Strict mode: title does not follow the release branch grammar, kept
    /// unmodified.
    TitleMismatch {
        number: PrNumber,
        title: String,
        pattern: String,
    },
    /// Backport with more than one `copied_to` relation, kept unresolved.
    AmbiguousBackport {
        number: PrNumber,
        issue: IssueId,
        candidates: Vec<IssueId>,
    },
    /// Strict mode: the same issue is fixed by several pull requests.
    DuplicateIssue { issue: IssueId, prs: Vec<PrNumber> },
}

impl Diagnostic {
    pub fn level(&self) -> Level {
        match self {
            Diagnostic::LegacyPullRequest { .. } => Level::Info,
            Diagnostic::AmbiguousBackport { .. } | Diagnostic::DuplicateIssue { .. } => Level::Warn,
            Diagnostic::FetchFailed { .. }
            | Diagnostic::MissingIssues { .. }
            | Diagnostic::TitleMismatch { .. } => Level::Error,
        }
    }

    /// The pull request this is about, if it concerns a single one.
    pub fn number(&self) -> Option<PrNumber> {
        match self {
            Diagnostic::LegacyPullRequest { number }
            | Diagnostic::FetchFailed { number, .. }
            | Diagnostic::MissingIssues { number }
            | Diagnostic::TitleMismatch { number, .. }
            | Diagnostic::AmbiguousBackport { number, .. } => Some(*number),
            Diagnostic::DuplicateIssue { .. } => None,
        }
    }

    pub(crate) fn log(&self) {
        match self.level() {
            Level::Error => error!("{self}"),
            Level::Warn => warn!("{self}"),
            _ => info!("{self}"),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::LegacyPullRequest { number } => write!(
                f,
                "ignoring low-numbered PR#{number}, probably picked up from the QA suite repository"
            ),
            Diagnostic::FetchFailed { number, error } => {
                write!(f, "PR#{number} skipped: {error}")
            }
            Diagnostic::MissingIssues { number } => {
                write!(f, "PR#{number} has no associated issue")
            }
            Diagnostic::TitleMismatch {
                number,
                title,
                pattern,
            } => write!(f, "PR#{number} title {title:?} does not match {pattern}"),
            Diagnostic::AmbiguousBackport {
                number,
                issue,
                candidates,
            } => write!(
                f,
                "PR#{number}: issue {issue} has more than one copied_to relation ({})",
                join(candidates)
            ),
            Diagnostic::DuplicateIssue { issue, prs } => {
                write!(f, "{} PRs for issue {issue}: {}", prs.len(), join(prs))
            }
        }
    }
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let d = Diagnostic::DuplicateIssue {
            issue: IssueId::from("17"),
            prs: vec![2001, 2002],
        };
        assert_eq!(d.to_string(), "2 PRs for issue 17: 2001, 2002");
        assert_eq!(d.level(), Level::Warn);
        assert_eq!(d.number(), None);

        let d = Diagnostic::MissingIssues { number: 2001 };
        assert_eq!(d.to_string(), "PR#2001 has no associated issue");
        assert_eq!(d.number(), Some(2001));
    }
}

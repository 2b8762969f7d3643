use std::{
    path::{Path, PathBuf},
    process::Command,
};

use log::debug;

use crate::error::{Error, Result};

/// Pull request numbers as they appear in merge summaries and provider URLs.
pub type PrNumber = u64;

// unit and record separators keep free-form commit messages intact
const LOG_FORMAT: &str = "--format=%H%x1f%P%x1f%an%x1f%s%x1f%B%x1e";

/// The struct representation of a `Commit`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    /// The 40 char hash
    pub sha: String,
    /// Parent hashes, first parent first
    pub parents: Vec<String>,
    /// The author name
    pub author: String,
    /// The commit subject
    pub summary: String,
    /// The full commit message, subject included
    pub message: String,
}

impl Commit {
    pub fn is_merge(&self) -> bool { self.parents.len() > 1 }

    /// Lines of the message following the subject line.
    pub fn body_lines(&self) -> impl Iterator<Item = &str> { self.message.lines().skip(1) }
}

/// A merge commit that integrated pull request `number`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeCommit {
    pub number: PrNumber,
    pub commit: Commit,
}

/// Read access to the commit history the release notes are built from.
pub trait History {
    /// All merge commits in `range`, in traversal order.
    fn merges(&self, range: &str) -> Result<Vec<Commit>>;

    /// The non-merge commits reachable from the merge's last parent but not
    /// from its first, i.e. the commits of the pull request branch.
    fn branch_commits(&self, merge: &Commit) -> Result<Vec<Commit>>;

    /// Looks up a single commit.
    fn commit(&self, sha: &str) -> Result<Commit>;
}

/// What the [`MergeScanner`] found for one merge commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scanned {
    Merge(MergeCommit),
    /// A pull request numbered below the legacy threshold.
    Legacy(PrNumber),
}

/// Lazily turns a stream of commits into pull request merges.
///
/// Commits that are not merges, or whose summary is not a pull request merge,
/// are passed over silently. Legacy merges are surfaced so the caller can
/// report them.
pub struct MergeScanner<I> {
    commits: I,
    legacy_threshold: PrNumber,
}

impl<I> MergeScanner<I>
where
    I: Iterator<Item = Commit>,
{
    pub fn new<C>(commits: C, legacy_threshold: PrNumber) -> Self
    where
        C: IntoIterator<IntoIter = I>,
    {
        MergeScanner {
            commits: commits.into_iter(),
            legacy_threshold,
        }
    }
}

impl<I> Iterator for MergeScanner<I>
where
    I: Iterator<Item = Commit>,
{
    type Item = Scanned;

    fn next(&mut self) -> Option<Scanned> {
        loop {
            let commit = self.commits.next()?;
            if !commit.is_merge() {
                continue;
            }
            let Some(number) = merged_pr_number(&commit.summary) else {
                debug!("{} is not a pull request merge: {}", commit.sha, commit.summary);
                continue;
            };
            if number < self.legacy_threshold {
                return Some(Scanned::Legacy(number));
            }
            return Some(Scanned::Merge(MergeCommit { number, commit }));
        }
    }
}

/// Extracts the pull request number from a `Merge pull request #N ...`
/// summary line.
pub fn merged_pr_number(summary: &str) -> Option<PrNumber> {
    regex!(r"^Merge pull request #(\d+)")
        .captures(summary)
        .and_then(|caps| caps[1].parse().ok())
}

/// A [`History`] backed by the `git` executable.
#[derive(Debug, Clone)]
pub struct GitCli {
    work_tree: PathBuf,
}

impl GitCli {
    pub fn new<P: AsRef<Path>>(work_tree: P) -> Self {
        GitCli {
            work_tree: work_tree.as_ref().to_path_buf(),
        }
    }

    fn log(&self, args: &[&str]) -> Result<Vec<Commit>> {
        let mut all = vec!["log", LOG_FORMAT];
        all.extend_from_slice(args);
        debug!("Running git {:?} in {:?}", all, self.work_tree);

        let output = Command::new("git")
            .arg("-C")
            .arg(&self.work_tree)
            .args(&all)
            .output()?;

        if !output.status.success() {
            return Err(Error::Git {
                args: all.join(" "),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }

        parse_log(&String::from_utf8_lossy(&output.stdout))
    }
}

impl History for GitCli {
    fn merges(&self, range: &str) -> Result<Vec<Commit>> { self.log(&["--merges", range]) }

    fn branch_commits(&self, merge: &Commit) -> Result<Vec<Commit>> {
        match (merge.parents.first(), merge.parents.last()) {
            (Some(first), Some(last)) if merge.is_merge() => {
                let range = format!("{first}..{last}");
                self.log(&["--no-merges", range.as_str()])
            }
            _ => Ok(vec![]),
        }
    }

    fn commit(&self, sha: &str) -> Result<Commit> {
        self.log(&["-1", sha])?
            .into_iter()
            .next()
            .ok_or_else(|| Error::GitRecord(sha.to_owned()))
    }
}

fn parse_log(output: &str) -> Result<Vec<Commit>> {
    output
        .split('\x1e')
        .map(|record| record.trim_start_matches('\n'))
        .filter(|record| !record.is_empty())
        .map(parse_record)
        .collect()
}

fn parse_record(record: &str) -> Result<Commit> {
    let mut fields = record.splitn(5, '\x1f');
    let mut field = || {
        fields
            .next()
            .ok_or_else(|| Error::GitRecord(record.to_owned()))
    };
    let sha = field()?.to_owned();
    let parents = field()?.split_whitespace().map(str::to_owned).collect();
    let author = field()?.to_owned();
    let summary = field()?.to_owned();
    let message = field()?.trim_end().to_owned();

    Ok(Commit {
        sha,
        parents,
        author,
        summary,
        message,
    })
}

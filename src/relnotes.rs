use std::{
    collections::BTreeSet,
    env,
    fs::File,
    io::{stdout, BufWriter},
    path::{Path, PathBuf},
};

use log::{debug, info};

use crate::{
    aggregate::{Aggregator, PullRequestEntry, ReleaseNotesData},
    component::{normalize_title, ClassifiedTitle, Classifier},
    config::{
        RawCfg, DEFAULT_GITHUB_API, DEFAULT_GITHUB_URL, DEFAULT_REPOSITORY, DEFAULT_TRACKER_URL,
        LEGACY_PR_THRESHOLD, RELEASE_BRANCHES,
    },
    diagnostic::Diagnostic,
    error::{Error, Result},
    extract::{title_message, Extractor},
    fmt::{JsonWriter, PlainWriter, ReportFormat, ReportWriter, RstWriter},
    git::{GitCli, History, MergeCommit, MergeScanner, PrNumber, Scanned},
    links::Links,
    provider::{GithubClient, PullRequestProvider},
    tracker::{RedmineClient, Resolution, Resolver, TrackerProvider},
    DEFAULT_CONFIG_FILE,
};

/// The base struct used to set options and drive a release notes run.
#[derive(Debug, Clone)]
pub struct ReleaseNotes {
    /// The revision range to walk, e.g. `v10.2.0..v10.2.1` (Defaults to
    /// `HEAD`)
    pub range: String,
    /// The working tree of the git repository
    pub work_tree: PathBuf,
    /// `<owner>/<name>` of the repository on the hosting platform
    pub repository: String,
    /// Base url of the hosting platform's REST API
    pub github_api: String,
    /// Base url pull request hyperlinks are built from
    pub github_url: String,
    /// Base url of the issue tracker
    pub tracker_url: String,
    /// Token forwarded to the hosting platform
    pub token: Option<String>,
    /// Merges of pull requests numbered below this are skipped
    pub legacy_threshold: PrNumber,
    /// Branch names strict titles must start with
    pub release_branches: Vec<String>,
    /// Enforce the title grammar, require issue references and check for
    /// issues fixed more than once
    pub strict: bool,
    /// Classify titles by their component prefix or pull request labels
    pub use_tags: bool,
    /// The format to write the report in (Defaults to reStructuredText)
    pub out_format: ReportFormat,
    /// Where to write the report (Defaults to `stdout`)
    pub outfile: Option<PathBuf>,
}

impl Default for ReleaseNotes {
    fn default() -> Self {
        debug!("Creating default release notes options");
        ReleaseNotes {
            range: "HEAD".to_owned(),
            work_tree: PathBuf::from("."),
            repository: DEFAULT_REPOSITORY.to_owned(),
            github_api: DEFAULT_GITHUB_API.to_owned(),
            github_url: DEFAULT_GITHUB_URL.to_owned(),
            tracker_url: DEFAULT_TRACKER_URL.to_owned(),
            token: None,
            legacy_threshold: LEGACY_PR_THRESHOLD,
            release_branches: RELEASE_BRANCHES.iter().map(|b| b.to_string()).collect(),
            strict: false,
            use_tags: false,
            out_format: ReportFormat::default(),
            outfile: None,
        }
    }
}

impl ReleaseNotes {
    /// Creates options for the current directory, reading the default
    /// `.relnotes.toml` configuration file when there is one.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use relnotes::ReleaseNotes;
    /// let notes = ReleaseNotes::new().unwrap();
    /// ```
    pub fn new() -> Result<Self> {
        let cwd = env::current_dir().map_err(|_| Error::CurrentDir)?;
        let cfg_file = cwd.join(DEFAULT_CONFIG_FILE);
        if cfg_file.is_file() {
            ReleaseNotes::from_file(cfg_file)
        } else {
            debug!("No {DEFAULT_CONFIG_FILE} in {cwd:?}, using defaults");
            Ok(ReleaseNotes::default().work_tree(cwd))
        }
    }

    /// Creates options from a TOML configuration file. The directory holding
    /// the file is taken as the repository's working tree.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use relnotes::ReleaseNotes;
    /// let notes = ReleaseNotes::from_file("/src/ceph/.relnotes.toml").unwrap();
    /// ```
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        debug!("Creating release notes options from {:?}", file.as_ref());
        let cfg_file = if file.as_ref().is_relative() {
            env::current_dir()
                .map_err(|_| Error::CurrentDir)?
                .join(file.as_ref())
        } else {
            file.as_ref().to_path_buf()
        };

        let mut dir = cfg_file.clone();
        dir.pop();
        ReleaseNotes::default()
            .work_tree(dir)
            .try_config_file(&cfg_file)
    }

    /// Applies the settings of a configuration file on top of these options.
    pub fn try_config_file(mut self, cfg_file: &Path) -> Result<Self> {
        debug!("Trying to use config file: {:?}", cfg_file);
        let cfg = RawCfg::from_file(cfg_file)?.relnotes;

        if let Some(repository) = cfg.repository {
            self.repository = repository;
        }
        if let Some(api) = cfg.github_api {
            self.github_api = api;
        }
        if let Some(url) = cfg.github_url {
            self.github_url = url;
        }
        if let Some(url) = cfg.tracker_url {
            self.tracker_url = url;
        }
        if let Some(threshold) = cfg.legacy_threshold {
            self.legacy_threshold = threshold;
        }
        if let Some(branches) = cfg.release_branches {
            self.release_branches = branches;
        }
        if let Some(format) = cfg.output_format {
            self.out_format = format;
        }
        self.strict |= cfg.strict;
        self.use_tags |= cfg.use_tags;

        debug!("Returning options:\n{:?}", self);
        Ok(self)
    }

    /// Sets the revision range to walk.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use relnotes::ReleaseNotes;
    /// let notes = ReleaseNotes::new().unwrap().range("v10.2.5..v10.2.6");
    /// ```
    pub fn range<S: Into<String>>(mut self, r: S) -> ReleaseNotes {
        self.range = r.into();
        self
    }

    /// Sets the working tree of the git repository.
    pub fn work_tree<P: AsRef<Path>>(mut self, d: P) -> ReleaseNotes {
        self.work_tree = d.as_ref().to_path_buf();
        self
    }

    /// Sets the `<owner>/<name>` of the repository on the hosting platform.
    pub fn repository<S: Into<String>>(mut self, r: S) -> ReleaseNotes {
        self.repository = r.into();
        self
    }

    /// Sets the base url of the issue tracker.
    pub fn tracker_url<S: Into<String>>(mut self, u: S) -> ReleaseNotes {
        self.tracker_url = u.into();
        self
    }

    /// Sets the token forwarded to the hosting platform.
    pub fn token<S: Into<String>>(mut self, t: S) -> ReleaseNotes {
        self.token = Some(t.into());
        self
    }

    pub fn legacy_threshold(mut self, n: PrNumber) -> ReleaseNotes {
        self.legacy_threshold = n;
        self
    }

    /// Sets the branch names strict titles must start with. An empty list
    /// keeps the default branches.
    pub fn release_branches<I, S>(mut self, branches: I) -> ReleaseNotes
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let branches: Vec<String> = branches.into_iter().map(Into::into).collect();
        if branches.is_empty() {
            debug!("No release branches given, keeping {:?}", self.release_branches);
        } else {
            self.release_branches = branches;
        }
        self
    }

    /// Turns strict mode on or off (Defaults to `false`).
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use relnotes::ReleaseNotes;
    /// let notes = ReleaseNotes::new().unwrap().strict(true);
    /// ```
    pub fn strict(mut self, s: bool) -> ReleaseNotes {
        self.strict = s;
        self
    }

    /// Turns label based title classification on or off (Defaults to
    /// `false`).
    pub fn use_tags(mut self, t: bool) -> ReleaseNotes {
        self.use_tags = t;
        self
    }

    /// The format of the report.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use relnotes::{fmt::ReportFormat, ReleaseNotes};
    /// let notes = ReleaseNotes::new().unwrap().output_format(ReportFormat::Plain);
    /// ```
    pub fn output_format(mut self, f: ReportFormat) -> ReleaseNotes {
        self.out_format = f;
        self
    }

    /// Writes the report to a file instead of `stdout`.
    pub fn outfile<P: AsRef<Path>>(mut self, f: P) -> ReleaseNotes {
        self.outfile = Some(f.as_ref().to_path_buf());
        self
    }

    /// The hyperlinks cited by marked-up reports.
    pub fn links(&self) -> Links {
        Links::new(
            self.tracker_url.clone(),
            format!("{}/{}", self.github_url.trim_end_matches('/'), self.repository),
        )
    }

    /// Collects release notes using `git` and the configured hosting
    /// platform and tracker.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use relnotes::ReleaseNotes;
    /// let notes = ReleaseNotes::new().unwrap().range("v10.2.5..v10.2.6");
    /// let data = notes.collect().unwrap();
    /// for d in &data.diagnostics {
    ///     eprintln!("{d}");
    /// }
    /// ```
    pub fn collect(&self) -> Result<ReleaseNotesData> {
        let history = GitCli::new(&self.work_tree);
        let github = GithubClient::new(&self.github_api, &self.repository, self.token.clone())?;
        let tracker = RedmineClient::new(&self.tracker_url)?;
        self.collect_with(&history, &github, &tracker)
    }

    /// Collects release notes from the given history and providers.
    ///
    /// Only git failures end the run; everything concerning a single pull
    /// request is reported as a [`Diagnostic`] and the pull request skipped
    /// or kept as appropriate.
    pub fn collect_with(
        &self,
        history: &dyn History,
        provider: &dyn PullRequestProvider,
        tracker: &dyn TrackerProvider,
    ) -> Result<ReleaseNotesData> {
        let mut run = Run {
            notes: self,
            history,
            provider,
            resolver: Resolver::new(tracker),
            classifier: Classifier::new(self.release_branches.as_slice())?,
            extractor: Extractor::new(&self.tracker_url)?,
            agg: Aggregator::new(self.strict),
        };

        let merges = history.merges(&self.range)?;
        info!("Scanning {} merges in {}", merges.len(), self.range);
        for scanned in MergeScanner::new(merges, self.legacy_threshold) {
            match scanned {
                Scanned::Legacy(number) => run.agg.report(Diagnostic::LegacyPullRequest { number }),
                Scanned::Merge(merge) => run.merge(&merge)?,
            }
        }

        info!("Done collecting merges: {} entries", run.agg.len());
        Ok(run.agg.finish())
    }

    /// Collects and writes the report using whatever options have been
    /// specified thus far.
    pub fn write_report(&self) -> Result<ReleaseNotesData> {
        let data = self.collect()?;
        self.write_data(&data)?;
        Ok(data)
    }

    /// Writes already collected data to the configured output in the
    /// configured format.
    pub fn write_data(&self, data: &ReleaseNotesData) -> Result<()> {
        if let Some(ref path) = self.outfile {
            debug!("outfile set to: {:?}", path);
            let mut file = File::create(path)?;
            self.write_data_to(&mut file, data)
        } else {
            debug!("outfile not set using stdout");
            let out = stdout();
            let mut out_buf = BufWriter::new(out.lock());
            self.write_data_to(&mut out_buf, data)
        }
    }

    fn write_data_to<W: std::io::Write>(&self, out: &mut W, data: &ReleaseNotesData) -> Result<()> {
        let links = self.links();
        match self.out_format {
            ReportFormat::Plain => PlainWriter::new(out).write_report(&links, data),
            ReportFormat::Rst => RstWriter::new(out).write_report(&links, data),
            ReportFormat::Json => JsonWriter::new(out).write_report(&links, data),
        }
    }

    /// Collects and writes the report with a specified `ReportWriter`.
    pub fn write_report_with<W>(&self, writer: &mut W) -> Result<ReleaseNotesData>
    where
        W: ReportWriter,
    {
        let data = self.collect()?;
        writer.write_report(&self.links(), &data)?;
        Ok(data)
    }
}

/// State of one collection run.
struct Run<'a> {
    notes: &'a ReleaseNotes,
    history: &'a dyn History,
    provider: &'a dyn PullRequestProvider,
    resolver: Resolver<'a>,
    classifier: Classifier,
    extractor: Extractor,
    agg: Aggregator,
}

impl<'a> Run<'a> {
    fn merge(&mut self, merge: &MergeCommit) -> Result<()> {
        let number = merge.number;
        info!("Considering PR#{number}");
        if let Some(entry) = self.entry(merge)? {
            self.agg.insert(entry);
        }
        Ok(())
    }

    fn fetch_failed(&mut self, number: PrNumber, error: Error) -> Result<Option<PullRequestEntry>> {
        self.agg.report(Diagnostic::FetchFailed {
            number,
            error: error.to_string(),
        });
        Ok(None)
    }

    fn entry(&mut self, merge: &MergeCommit) -> Result<Option<PullRequestEntry>> {
        let number = merge.number;
        let strict = self.notes.strict;

        let pr = match self.provider.pull_request(number) {
            Ok(pr) => pr,
            Err(e) => return self.fetch_failed(number, e),
        };
        let tm = title_message(&merge.commit, &pr.title, strict);

        let branch = self.history.branch_commits(&merge.commit)?;
        let refs = self.extractor.references(&pr, &branch);
        let author = match (refs.author(), merge.commit.parents.last()) {
            (Some(signers), _) => signers,
            (None, Some(tip)) => self.history.commit(tip)?.author,
            (None, None) => merge.commit.author.clone(),
        };

        if strict && refs.issues.is_empty() {
            self.agg.report(Diagnostic::MissingIssues { number });
            return Ok(None);
        }

        let mut title = ClassifiedTitle::plain(tm.title);
        if strict {
            match self.classifier.strict(&title.title) {
                Some(classified) => title = classified,
                None => self.agg.report(Diagnostic::TitleMismatch {
                    number,
                    title: title.title.clone(),
                    pattern: self.classifier.strict_pattern().to_owned(),
                }),
            }
        }
        if self.notes.use_tags {
            title = match self.classifier.tag(title, number, self.provider) {
                Ok(t) => t,
                Err(e) => return self.fetch_failed(number, e),
            };
        }
        title.title = normalize_title(&title.title);

        let mut issues = BTreeSet::new();
        for raw in &refs.issues {
            let resolution = match self.resolver.resolve(raw) {
                Ok(r) => r,
                Err(e) => return self.fetch_failed(number, e),
            };
            if let Resolution::Ambiguous {
                ref id,
                ref candidates,
            } = resolution
            {
                self.agg.report(Diagnostic::AmbiguousBackport {
                    number,
                    issue: id.clone(),
                    candidates: candidates.clone(),
                });
            }
            issues.insert(resolution.id().clone());
        }

        Ok(Some(PullRequestEntry {
            number,
            title,
            body: pr.body,
            author,
            message: tm.message,
            issues,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        component::{Component, Tag},
        git::Commit,
        testing::{
            backport, commit, merge_with_body, tracker_issue, FakeHistory, FakeProvider, FakeTracker,
        },
        tracker::IssueId,
    };

    fn signed(sha: &str, message: &str) -> Commit { commit(sha, &["base"], message) }

    fn issues(entry: &PullRequestEntry) -> Vec<&str> { entry.issues.iter().map(IssueId::as_str).collect() }

    fn render(notes: &ReleaseNotes, data: &ReleaseNotesData) -> String {
        let mut out = Vec::new();
        notes.write_data_to(&mut out, data).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn lax_run_end_to_end() {
        let history = FakeHistory::default()
            .with_merge(
                merge_with_body(2001, &["", "Reviewed-by: Sage <sage@x>", "line A", "line B"]),
                vec![signed(
                    "c1",
                    "mon: fix\n\nFixes: http://tracker.ceph.com/issues/300\n\
                     Signed-off-by: Jane Doe <jane@x>",
                )],
            )
            .with_merge(merge_with_body(1200, &[]), vec![])
            .with_merge(merge_with_body(2002, &["", "osd: fix crash"]), vec![]);
        let provider = FakeProvider::default()
            .with_pr(2001, "mon: rework elections", "Fixes: #100")
            .with_pr(2002, "wip title", "");
        let tracker = FakeTracker::default()
            .with("100", backport(&[90]))
            .with("300", tracker_issue("Bug", &[]));

        let notes = ReleaseNotes::default().output_format(ReportFormat::Plain);
        let data = notes.collect_with(&history, &provider, &tracker).unwrap();

        assert_eq!(data.entries.len(), 2);
        assert_eq!(
            data.diagnostics,
            vec![Diagnostic::LegacyPullRequest { number: 1200 }]
        );

        let sorted = data.sorted_entries();
        assert_eq!(sorted[0].number, 2002);
        assert_eq!(sorted[0].title.title, "osd: fix crash");
        assert_eq!(sorted[0].author, "Author of tip2002");
        assert!(sorted[0].issues.is_empty());
        assert_eq!(sorted[1].number, 2001);
        assert_eq!(issues(sorted[1]), vec!["90", "300"]);
        assert_eq!(sorted[1].author, "Jane Doe");

        assert_eq!(
            render(&notes, &data),
            "* osd: fix crash (pr#2002, Author of tip2002)\n\
             * mon: rework elections (#90, #300, pr#2001, Jane Doe)\n    line A\n    line B\n"
        );
        assert_eq!(provider.pull_calls(), 2);
    }

    #[test]
    fn strict_run_reports_and_skips() {
        let history = FakeHistory::default()
            .with_merge(merge_with_body(2001, &["", "ignored in strict mode"]), vec![])
            .with_merge(merge_with_body(2002, &[]), vec![])
            .with_merge(merge_with_body(2003, &[]), vec![])
            .with_merge(merge_with_body(2004, &[]), vec![]);
        let provider = FakeProvider::default()
            .with_pr(2001, "jewel: osd: fix crash", "Fixes: #10")
            .with_pr(2002, "foo: bar", "Fixes: #10")
            .with_pr(2003, "jewel: rgw: no issue", "")
            .with_pr(2004, "kraken: mds: ambiguous", "Fixes: #20");
        let tracker = FakeTracker::default()
            .with("10", tracker_issue("Bug", &[]))
            .with("20", backport(&[1, 2]));

        let data = ReleaseNotes::default()
            .strict(true)
            .collect_with(&history, &provider, &tracker)
            .unwrap();

        let by_number = |n: PrNumber| data.entries.iter().find(|e| e.number == n);
        let osd = by_number(2001).unwrap();
        assert_eq!(osd.title.title, "osd: fix crash");
        assert_eq!(osd.title.tag, Some(Tag::Component(Component::Osd)));
        assert_eq!(by_number(2002).unwrap().title.title, "foo: bar");
        assert!(by_number(2003).is_none());
        assert_eq!(issues(by_number(2004).unwrap()), vec!["20"]);

        let about = |n: PrNumber| {
            data.diagnostics
                .iter()
                .filter(|d| d.number() == Some(n))
                .count()
        };
        assert_eq!(about(2001), 0);
        assert_eq!(about(2002), 1);
        assert!(matches!(
            data.diagnostics.iter().find(|d| d.number() == Some(2002)),
            Some(Diagnostic::TitleMismatch { .. })
        ));
        assert!(data
            .diagnostics
            .contains(&Diagnostic::MissingIssues { number: 2003 }));
        assert!(data.diagnostics.contains(&Diagnostic::AmbiguousBackport {
            number: 2004,
            issue: IssueId::from("20"),
            candidates: vec![IssueId::from("1"), IssueId::from("2")],
        }));
        assert_eq!(
            data.diagnostics.last(),
            Some(&Diagnostic::DuplicateIssue {
                issue: IssueId::from("10"),
                prs: vec![2001, 2002],
            })
        );
        assert_eq!(tracker.calls(), 2);
    }

    #[test]
    fn failed_fetch_skips_only_that_pr() {
        let history = FakeHistory::default()
            .with_merge(merge_with_body(2001, &[]), vec![])
            .with_merge(merge_with_body(2002, &[]), vec![])
            .with_merge(merge_with_body(2003, &[]), vec![]);
        let provider = FakeProvider::default()
            .with_pr(2002, "osd: unknown issue", "Fixes: #404")
            .with_pr(2003, "osd: fine", "");
        let tracker = FakeTracker::default();

        let data = ReleaseNotes::default()
            .collect_with(&history, &provider, &tracker)
            .unwrap();

        assert_eq!(data.entries.len(), 1);
        assert_eq!(data.entries[0].number, 2003);
        let failed: Vec<_> = data
            .diagnostics
            .iter()
            .filter(|d| matches!(d, Diagnostic::FetchFailed { .. }))
            .filter_map(Diagnostic::number)
            .collect();
        assert_eq!(failed, vec![2001, 2002]);
    }

    #[test]
    fn tags_classify_after_title_rewrite() {
        let history = FakeHistory::default()
            .with_merge(merge_with_body(2001, &[]), vec![])
            .with_merge(merge_with_body(2002, &[]), vec![]);
        let provider = FakeProvider::default()
            .with_pr(2001, "rgw: keep prefix.", "")
            .with_pr(2002, "fix the docs", "")
            .with_labels(2002, &["documentation"]);

        let data = ReleaseNotes::default()
            .use_tags(true)
            .collect_with(&history, &provider, &FakeTracker::default())
            .unwrap();

        let titles: Vec<_> = data
            .sorted_entries()
            .iter()
            .map(|e| e.title.title.clone())
            .collect();
        assert_eq!(titles, vec!["doc: fix the docs", "rgw: keep prefix"]);
        assert_eq!(provider.issue_calls(), 1);
    }

    #[test]
    fn same_pr_merged_twice_is_reported_once() {
        let mut again = merge_with_body(2001, &[]);
        again.sha = "merge2001-again".into();
        let history = FakeHistory::default()
            .with_merge(merge_with_body(2001, &[]), vec![])
            .with_merge(again, vec![]);
        let provider = FakeProvider::default().with_pr(2001, "osd: once", "");

        let data = ReleaseNotes::default()
            .output_format(ReportFormat::Plain)
            .collect_with(&history, &provider, &FakeTracker::default())
            .unwrap();

        assert_eq!(data.entries.len(), 1);
        assert_eq!(
            render(&ReleaseNotes::default().output_format(ReportFormat::Plain), &data)
                .lines()
                .count(),
            1
        );
    }

    #[test]
    fn empty_release_branches_keep_defaults() {
        let notes = ReleaseNotes::default().release_branches(Vec::<String>::new());
        assert_eq!(notes.release_branches, RELEASE_BRANCHES);

        let history = FakeHistory::default().with_merge(merge_with_body(2001, &[]), vec![]);
        let provider = FakeProvider::default().with_pr(2001, ": osd: no branch", "Fixes: #10");
        let tracker = FakeTracker::default().with("10", tracker_issue("Bug", &[]));
        let data = notes
            .strict(true)
            .collect_with(&history, &provider, &tracker)
            .unwrap();
        assert!(matches!(
            data.diagnostics.as_slice(),
            [Diagnostic::TitleMismatch { number: 2001, .. }]
        ));

        let custom = ReleaseNotes::default().release_branches(["luminous"]);
        assert_eq!(custom.release_branches, vec!["luminous"]);
    }

    #[test]
    fn links_follow_options() {
        let links = ReleaseNotes::default()
            .repository("me/proj")
            .tracker_url("https://tracker.example.org")
            .links();
        assert_eq!(links.pr_link(5), "https://github.com/me/proj/pull/5");
        assert_eq!(
            links.issue_link(&IssueId::from("6")),
            "https://tracker.example.org/issues/6"
        );
    }
}

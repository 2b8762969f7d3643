use std::io;

use log::debug;
use serde::Serialize;

use crate::{
    aggregate::{PullRequestEntry, ReleaseNotesData},
    component::Tag,
    error::Result,
    fmt::ReportWriter,
    git::PrNumber,
    links::Links,
    tracker::IssueId,
};

/// Wraps a `std::io::Write` object to write release notes as a JSON array,
/// one object per entry in render order.
///
/// # Example
///
/// ```no_run
/// # use std::fs::File;
/// # use relnotes::{fmt::JsonWriter, ReleaseNotes};
/// let notes = ReleaseNotes::new().unwrap();
///
/// let mut file = File::create("release-notes.json").unwrap();
/// let mut writer = JsonWriter::new(&mut file);
/// notes.write_report_with(&mut writer).unwrap();
/// ```
pub struct JsonWriter<'a>(&'a mut dyn io::Write);

impl<'a> JsonWriter<'a> {
    pub fn new<T: io::Write + 'a>(writer: &'a mut T) -> JsonWriter<'a> { JsonWriter(writer) }
}

#[derive(Serialize)]
struct JsonIssue<'a> {
    issue: &'a IssueId,
    issue_link: String,
}

#[derive(Serialize)]
struct JsonEntry<'a> {
    number: PrNumber,
    pr_link: String,
    title: &'a str,
    component: Option<&'a Tag>,
    author: &'a str,
    issues: Vec<JsonIssue<'a>>,
    message: &'a [String],
}

impl<'a> JsonEntry<'a> {
    fn new(links: &Links, entry: &'a PullRequestEntry) -> Self {
        JsonEntry {
            number: entry.number,
            pr_link: links.pr_link(entry.number),
            title: &entry.title.title,
            component: entry.title.tag.as_ref(),
            author: &entry.author,
            issues: entry
                .issues
                .iter()
                .map(|issue| JsonIssue {
                    issue,
                    issue_link: links.issue_link(issue),
                })
                .collect(),
            message: &entry.message,
        }
    }
}

impl<'a> ReportWriter for JsonWriter<'a> {
    fn write_report(&mut self, links: &Links, data: &ReleaseNotesData) -> Result<()> {
        debug!("Writing JSON report of {} entries", data.entries.len());
        let entries: Vec<JsonEntry> = data
            .sorted_entries()
            .into_iter()
            .map(|entry| JsonEntry::new(links, entry))
            .collect();

        serde_json::to_writer_pretty(&mut *self.0, &entries)?;
        writeln!(self.0)?;
        self.0.flush().map_err(Into::into)
    }
}

use std::io;

use crate::{
    aggregate::ReleaseNotesData,
    error::Result,
    fmt::{ReportWriter, MESSAGE_INDENT},
    links::Links,
};

/// Wraps a `std::io::Write` object to write release notes as a
/// reStructuredText bullet list with issue and pull request hyperlinks.
///
/// # Example
///
/// ```no_run
/// # use std::fs::File;
/// # use relnotes::{fmt::RstWriter, ReleaseNotes};
/// let notes = ReleaseNotes::new().unwrap();
///
/// let mut file = File::create("release-notes.rst").unwrap();
/// let mut writer = RstWriter::new(&mut file);
/// notes.write_report_with(&mut writer).unwrap();
/// ```
pub struct RstWriter<'a>(&'a mut dyn io::Write);

impl<'a> RstWriter<'a> {
    pub fn new<T: io::Write + 'a>(writer: &'a mut T) -> RstWriter<'a> { RstWriter(writer) }
}

/// Keeps a title from turning into emphasis or a link reference.
fn escape_title(title: &str) -> String {
    let escaped = title.replace('*', r"\*");
    regex!(r"([a-zA-Z0-9])_(\W)")
        .replace_all(&escaped, r"${1}\_${2}")
        .into_owned()
}

impl<'a> ReportWriter for RstWriter<'a> {
    fn write_report(&mut self, links: &Links, data: &ReleaseNotesData) -> Result<()> {
        for entry in data.sorted_entries() {
            let mut cites: Vec<String> = entry
                .issues
                .iter()
                .map(|issue| format!("`issue#{issue} <{}>`_", links.issue_link(issue)))
                .collect();
            cites.push(format!(
                "`pr#{} <{}>`_",
                entry.number,
                links.pr_link(entry.number)
            ));
            cites.push(entry.author.clone());

            writeln!(
                self.0,
                "* {} ({})",
                escape_title(&entry.title.title),
                cites.join(", ")
            )?;
            for line in &entry.message {
                writeln!(self.0, "{MESSAGE_INDENT}{line}")?;
            }
        }

        self.0.flush().map_err(Into::into)
    }
}

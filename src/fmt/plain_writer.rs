use std::io;

use crate::{
    aggregate::ReleaseNotesData,
    error::Result,
    fmt::{ReportWriter, MESSAGE_INDENT},
    links::Links,
};

/// Wraps a `std::io::Write` object to write release notes as plain text,
/// citing issues as `#N` and pull requests as `pr#N`.
///
/// # Example
///
/// ```no_run
/// # use std::io::{stdout, BufWriter};
/// # use relnotes::{fmt::PlainWriter, ReleaseNotes};
/// let notes = ReleaseNotes::new().unwrap();
///
/// let out = stdout();
/// let mut out_buf = BufWriter::new(out.lock());
/// let mut writer = PlainWriter::new(&mut out_buf);
/// notes.write_report_with(&mut writer).unwrap();
/// ```
pub struct PlainWriter<'a>(&'a mut dyn io::Write);

impl<'a> PlainWriter<'a> {
    pub fn new<T: io::Write + 'a>(writer: &'a mut T) -> PlainWriter<'a> { PlainWriter(writer) }
}

impl<'a> ReportWriter for PlainWriter<'a> {
    fn write_report(&mut self, _links: &Links, data: &ReleaseNotesData) -> Result<()> {
        for entry in data.sorted_entries() {
            let mut cites: Vec<String> = entry
                .issues
                .iter()
                .map(|issue| format!("#{issue}"))
                .collect();
            cites.push(format!("pr#{}", entry.number));
            cites.push(entry.author.clone());

            writeln!(self.0, "* {} ({})", entry.title.title, cites.join(", "))?;
            for line in &entry.message {
                writeln!(self.0, "{MESSAGE_INDENT}{line}")?;
            }
        }

        self.0.flush().map_err(Into::into)
    }
}

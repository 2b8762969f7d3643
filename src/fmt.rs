mod json_writer;
mod plain_writer;
mod rst_writer;

use std::{result::Result as StdResult, str::FromStr};

use strum::{Display, EnumString};

pub use self::{json_writer::JsonWriter, plain_writer::PlainWriter, rst_writer::RstWriter};
use crate::{aggregate::ReleaseNotesData, error::Result, links::Links};

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, EnumString, Display)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
pub enum ReportFormat {
    Plain,
    #[default]
    Rst,
    Json,
}

impl<'de> serde::de::Deserialize<'de> for ReportFormat {
    fn deserialize<D>(deserializer: D) -> StdResult<Self, D::Error>
    where
        D: serde::de::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        FromStr::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// A trait that allows writing the results of a run in an arbitrary format.
/// The single required function `write_report()` accepts the collected
/// `ReleaseNotesData`; implementors are expected to write entries in
/// `ReleaseNotesData::sorted_entries()` order.
///
/// `relnotes` provides three implementors: `PlainWriter`, `RstWriter` and
/// `JsonWriter`.
pub trait ReportWriter {
    fn write_report(&mut self, links: &Links, data: &ReleaseNotesData) -> Result<()>;
}

/// Indentation of the extra message lines under an entry.
const MESSAGE_INDENT: &str = "    ";

//! Release notes from merged pull requests.
//!
//! `relnotes` walks the merge commits of a revision range, looks up each
//! merged pull request, follows the issues it references back through the
//! tracker (folding backports into the issue they were copied from), tags
//! every entry with a component and writes a sorted report.
//!
//! ```no_run
//! # use relnotes::ReleaseNotes;
//! let notes = ReleaseNotes::new()
//!     .unwrap()
//!     .range("v10.2.5..v10.2.6")
//!     .strict(true);
//! notes.write_report().unwrap();
//! ```

#[macro_use]
mod macros;
pub mod aggregate;
pub mod component;
pub mod config;
mod diagnostic;
pub mod error;
pub mod extract;
pub mod fmt;
pub mod git;
mod links;
pub mod provider;
mod relnotes;
#[cfg(test)]
mod testing;
pub mod tracker;

pub use aggregate::{PullRequestEntry, ReleaseNotesData};
pub use component::{ClassifiedTitle, Component, Tag};
pub use diagnostic::Diagnostic;
pub use links::Links;
pub use relnotes::ReleaseNotes;
pub use tracker::IssueId;

// The default config file
const DEFAULT_CONFIG_FILE: &str = ".relnotes.toml";

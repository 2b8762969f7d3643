use std::{fs, path::Path};

use serde::Deserialize;

use crate::{
    error::{Error, Result},
    fmt::ReportFormat,
    git::PrNumber,
};

/// `<owner>/<name>` of the repository whose pull requests are looked up.
pub const DEFAULT_REPOSITORY: &str = "ceph/ceph";
pub const DEFAULT_GITHUB_API: &str = "https://api.github.com";
pub const DEFAULT_GITHUB_URL: &str = "https://github.com";
pub const DEFAULT_TRACKER_URL: &str = "http://tracker.ceph.com";

/// Pull requests numbered below this were merged from the QA suite
/// repository before it moved in, and never belong in release notes.
pub const LEGACY_PR_THRESHOLD: PrNumber = 1311;

/// Branch names a strict-mode title may start with.
pub const RELEASE_BRANCHES: [&str; 4] = ["hammer", "infernalis", "jewel", "kraken"];

#[derive(Debug, Clone, Deserialize)]
pub struct RawCfg {
    pub relnotes: RawRelnotesCfg,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RawRelnotesCfg {
    pub repository: Option<String>,
    pub github_api: Option<String>,
    pub github_url: Option<String>,
    pub tracker_url: Option<String>,
    pub legacy_threshold: Option<PrNumber>,
    pub release_branches: Option<Vec<String>>,
    pub output_format: Option<ReportFormat>,
    pub strict: bool,
    pub use_tags: bool,
}

impl RawCfg {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let cfg: RawCfg =
            toml::from_str(&text).map_err(|e| Error::ConfigParse(path.to_path_buf(), e))?;

        if matches!(cfg.relnotes.release_branches.as_deref(), Some([])) {
            return Err(Error::ConfigFormat(path.to_path_buf()));
        }
        Ok(cfg)
    }
}

use std::{collections::BTreeSet, fmt};

use log::debug;
use regex::Regex;
use serde::Serialize;
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

use crate::{
    error::{Error, Result},
    git::PrNumber,
    provider::PullRequestProvider,
};

/// Labels on the hosting platform that name a component.
pub const LABEL_COMPONENTS: [&str; 14] = [
    "bluestore",
    "build/ops",
    "cephfs",
    "common",
    "core",
    "mgr",
    "mon",
    "performance",
    "pybind",
    "rdma",
    "rgw",
    "rbd",
    "tests",
    "tools",
];

const DOCUMENTATION_LABEL: &str = "documentation";

/// The closed set of components a release note title may be prefixed with.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, EnumString, Display, AsRefStr, EnumIter,
)]
#[strum(serialize_all = "kebab-case")]
pub enum Component {
    Bluestore,
    #[strum(serialize = "build/ops")]
    BuildOps,
    Cephfs,
    Cephx,
    Cli,
    Cmake,
    Common,
    Core,
    Crush,
    Doc,
    Fs,
    Librados,
    Librbd,
    Log,
    Mds,
    Mgr,
    Mon,
    Msg,
    Objecter,
    Osd,
    Pybind,
    Rbd,
    RbdMirror,
    RbdNbd,
    Rgw,
    Tests,
    Tools,
}

impl Serialize for Component {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_ref())
    }
}

/// Where the component of a title came from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum Tag {
    /// A member of the closed vocabulary, parsed from the title or implied
    /// by a documentation label.
    Component(Component),
    /// Component labels found on the pull request, sorted.
    Labels(Vec<String>),
    /// Nothing identified the component.
    Unknown,
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::Component(c) => f.write_str(c.as_ref()),
            Tag::Labels(labels) => f.write_str(&labels.join(",")),
            Tag::Unknown => f.write_str("UNKNOWN"),
        }
    }
}

/// A title in its final `component: description` shape.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ClassifiedTitle {
    pub tag: Option<Tag>,
    pub title: String,
}

impl ClassifiedTitle {
    /// A title no classification has been applied to.
    pub fn plain<S: Into<String>>(title: S) -> Self {
        ClassifiedTitle {
            tag: None,
            title: title.into(),
        }
    }

    fn tagged(tag: Tag, title: &str) -> Self {
        ClassifiedTitle {
            title: format!("{tag}: {title}"),
            tag: Some(tag),
        }
    }
}

/// Classifies pull request titles by component.
#[derive(Debug, Clone)]
pub struct Classifier {
    strict: Regex,
    prefixed: Regex,
}

impl Classifier {
    /// Builds the title grammars; `release_branches` are the branch names a
    /// strict title must start with.
    pub fn new<S: AsRef<str>>(release_branches: &[S]) -> Result<Self> {
        let components = Component::iter()
            .map(|c| regex::escape(c.as_ref()))
            .collect::<Vec<_>>()
            .join("|");
        let branches = release_branches
            .iter()
            .map(|b| regex::escape(b.as_ref()))
            .collect::<Vec<_>>()
            .join("|");

        let strict = format!(r"^(?:{branches}):\s+({components})(:.*)");
        let prefixed = format!(r"^({components})(:.*)");

        Ok(Classifier {
            strict: Regex::new(&strict).map_err(|e| Error::Pattern(strict, e))?,
            prefixed: Regex::new(&prefixed).map_err(|e| Error::Pattern(prefixed, e))?,
        })
    }

    /// The grammar strict titles must follow.
    pub fn strict_pattern(&self) -> &str { self.strict.as_str() }

    /// Parses `<branch>: <component><rest>`, returning `<component><rest>`.
    /// `None` when the title does not follow the grammar.
    pub fn strict(&self, title: &str) -> Option<ClassifiedTitle> {
        let caps = self.strict.captures(title)?;
        let component = caps[1].parse::<Component>().ok()?;
        Some(ClassifiedTitle {
            tag: Some(Tag::Component(component)),
            title: format!("{}{}", &caps[1], &caps[2]),
        })
    }

    /// Recognizes a title that already starts with a known component.
    pub fn prefixed(&self, title: &str) -> Option<ClassifiedTitle> {
        let caps = self.prefixed.captures(title)?;
        let component = caps[1].parse::<Component>().ok()?;
        Some(ClassifiedTitle {
            tag: Some(Tag::Component(component)),
            title: title.to_owned(),
        })
    }

    /// Prefixes `title` with whatever component its labels point at.
    pub fn from_labels(title: &str, labels: &BTreeSet<String>) -> ClassifiedTitle {
        if labels.contains(DOCUMENTATION_LABEL) {
            return ClassifiedTitle::tagged(Tag::Component(Component::Doc), title);
        }

        let found: Vec<String> = labels
            .iter()
            .filter(|l| LABEL_COMPONENTS.contains(&l.as_str()))
            .cloned()
            .collect();
        if found.is_empty() {
            ClassifiedTitle::tagged(Tag::Unknown, title)
        } else {
            ClassifiedTitle::tagged(Tag::Labels(found), title)
        }
    }

    /// Tag-based classification: keep a known prefix, otherwise consult the
    /// labels of pull request `number`.
    pub fn tag(
        &self,
        title: ClassifiedTitle,
        number: PrNumber,
        provider: &dyn PullRequestProvider,
    ) -> Result<ClassifiedTitle> {
        if let Some(prefixed) = self.prefixed(&title.title) {
            return Ok(ClassifiedTitle {
                tag: title.tag.or(prefixed.tag),
                title: prefixed.title,
            });
        }
        debug!("PR#{number} title has no component prefix, looking at labels");
        let labels = provider.issue(number)?.labels;
        Ok(Classifier::from_labels(&title.title, &labels))
    }
}

/// Trims whitespace and trailing or leading punctuation left over by title
/// rewriting.
pub fn normalize_title(title: &str) -> String {
    title
        .trim_matches(|c: char| c.is_whitespace() || ".,;:-=".contains(c))
        .to_owned()
}

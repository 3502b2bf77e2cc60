//! Subsection paths: dotted addresses into the configuration tree.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Address of a configuration subsection, e.g. `plotting.model_losses`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct SubsectionPath {
    segments: Vec<String>,
}

impl SubsectionPath {
    /// Path from already split segments.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a dotted path. Empty segments are dropped, so `""` is the root.
    pub fn parse(dotted: &str) -> Self {
        Self::new(
            dotted
                .split('.')
                .map(str::trim)
                .filter(|segment| !segment.is_empty()),
        )
    }

    pub fn root() -> Self {
        Self { segments: Vec::new() }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Path extended by one segment.
    pub fn child(&self, segment: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Self { segments }
    }

    /// File-name-safe rendering used for flag marker names.
    pub fn marker_stem(&self) -> String {
        self.segments
            .iter()
            .map(|segment| {
                segment
                    .chars()
                    .map(|c| {
                        if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                            c
                        } else {
                            '_'
                        }
                    })
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for SubsectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            write!(f, "<root>")
        } else {
            write!(f, "{}", self.segments.join("."))
        }
    }
}

impl From<&str> for SubsectionPath {
    fn from(dotted: &str) -> Self {
        Self::parse(dotted)
    }
}

impl From<String> for SubsectionPath {
    fn from(dotted: String) -> Self {
        Self::parse(&dotted)
    }
}

impl From<SubsectionPath> for String {
    fn from(path: SubsectionPath) -> Self {
        path.segments.join(".")
    }
}

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use serde::Serialize;

/// Variable name to raw or resolved value.
pub type VariableMap = BTreeMap<String, String>;

/// A parsed `KEY=VALUE` entry from an environment file or input buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: String,
    pub value: String,
    /// Line the statement starts on, 1-based.
    pub line: u32,
}

/// Safe-mode selection: which template, if any, lists the required keys.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Safe {
    /// No presence check.
    #[default]
    Off,
    /// Require every key listed in `./.env.example`.
    DefaultTemplate,
    /// Require every key listed in the given template file.
    Template(PathBuf),
}

impl Safe {
    pub const DEFAULT_TEMPLATE: &'static str = "./.env.example";

    pub fn is_on(&self) -> bool {
        !matches!(self, Self::Off)
    }

    /// Template location, or `None` when safe mode is off.
    pub fn template_path(&self) -> Option<PathBuf> {
        match self {
            Self::Off => None,
            Self::DefaultTemplate => Some(PathBuf::from(Self::DEFAULT_TEMPLATE)),
            Self::Template(path) => Some(path.clone()),
        }
    }
}

impl From<bool> for Safe {
    fn from(value: bool) -> Self {
        if value {
            Self::DefaultTemplate
        } else {
            Self::Off
        }
    }
}

impl From<PathBuf> for Safe {
    fn from(value: PathBuf) -> Self {
        Self::Template(value)
    }
}

impl From<&str> for Safe {
    fn from(value: &str) -> Self {
        Self::Template(PathBuf::from(value))
    }
}

/// Non-fatal diagnostics collected while resolving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A file could not be read or decoded and was treated as empty.
    FileLoad { path: PathBuf, reason: String },
    /// A malformed statement was skipped; the rest of the file still loaded.
    SkippedLine {
        path: PathBuf,
        line: u32,
        reason: String,
    },
    /// The legacy `sample` option was used.
    DeprecatedSample,
}

impl Display for Warning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FileLoad { path, .. } => write!(f, "Failed to load {}.", path.display()),
            Self::SkippedLine { path, line, .. } => {
                write!(f, "Skipped malformed line {line} of {}.", path.display())
            }
            Self::DeprecatedSample => write!(
                f,
                "\"sample\" is a deprecated option. Please update your configuration to use \"safe\" instead."
            ),
        }
    }
}

/// Namespaced key to JSON-encoded string literal.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct Definitions(BTreeMap<String, String>);

impl Definitions {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }

    pub(crate) fn insert(&mut self, key: String, literal: String) {
        self.0.insert(key, literal);
    }
}

/// Result of a successful resolution pass.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Resolved {
    /// Final values before encoding.
    pub variables: VariableMap,
    pub definitions: Definitions,
    pub warnings: Vec<Warning>,
}

use std::path::{Path, PathBuf};

use crate::loader::emit;
use crate::model::{Safe, Warning};

/// Construction-time options for a [`Resolver`](crate::Resolver).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    path: PathBuf,
    safe: Safe,
    sample: Safe,
    systemvars: bool,
    silent: bool,
    expand: bool,
    prefix: String,
    allow_empty_values: bool,
}

impl Config {
    pub const DEFAULT_PATH: &'static str = "./.env";
    pub const DEFAULT_PREFIX: &'static str = "process.env.";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = path.as_ref().to_path_buf();
        self
    }

    pub fn safe(mut self, safe: impl Into<Safe>) -> Self {
        self.safe = safe.into();
        self
    }

    /// Deprecated alias for [`Config::safe`].
    pub fn sample(mut self, sample: impl Into<Safe>) -> Self {
        self.sample = sample.into();
        self
    }

    pub fn systemvars(mut self, systemvars: bool) -> Self {
        self.systemvars = systemvars;
        self
    }

    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    pub fn expand(mut self, expand: bool) -> Self {
        self.expand = expand;
        self
    }

    /// Namespace prepended to every output key.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Let safe mode accept keys that resolve to an empty string.
    pub fn allow_empty_values(mut self, allow_empty_values: bool) -> Self {
        self.allow_empty_values = allow_empty_values;
        self
    }

    pub fn env_path(&self) -> &Path {
        &self.path
    }

    pub fn safe_mode(&self) -> &Safe {
        &self.safe
    }

    pub fn is_systemvars(&self) -> bool {
        self.systemvars
    }

    pub fn is_silent(&self) -> bool {
        self.silent
    }

    pub fn is_expand(&self) -> bool {
        self.expand
    }

    pub fn key_prefix(&self) -> &str {
        &self.prefix
    }

    pub fn allows_empty_values(&self) -> bool {
        self.allow_empty_values
    }

    /// Fold the legacy `sample` option into `safe`.
    ///
    /// `sample` only takes effect when `safe` is off. Its use is always
    /// reported as deprecated.
    pub(crate) fn normalized(mut self, warnings: &mut Vec<Warning>) -> Self {
        let sample = std::mem::take(&mut self.sample);
        if !sample.is_on() {
            return self;
        }

        if !self.safe.is_on() {
            self.safe = sample;
        }
        emit(Warning::DeprecatedSample, self.silent, warnings);
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: PathBuf::from(Self::DEFAULT_PATH),
            safe: Safe::Off,
            sample: Safe::Off,
            systemvars: false,
            silent: false,
            expand: false,
            prefix: Self::DEFAULT_PREFIX.to_owned(),
            allow_empty_values: false,
        }
    }
}

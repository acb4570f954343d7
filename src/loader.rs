use std::path::Path;

use crate::error::{Error, ParseError};
use crate::model::{Entry, VariableMap, Warning};
use crate::parser::{parse_lenient, parse_str};

/// Read and parse an environment file into a [`VariableMap`].
///
/// Strict: a single malformed statement fails the whole file. [`load`] is
/// the lenient counterpart used by the resolver.
pub fn read_file(path: impl AsRef<Path>) -> Result<VariableMap, Error> {
    let bytes = std::fs::read(path)?;
    let entries = parse_str(std::str::from_utf8(&bytes)?)?;
    Ok(into_map(entries, None))
}

/// Best-effort load.
///
/// An unreadable or non-UTF-8 file yields an empty map and a
/// [`Warning::FileLoad`]. Malformed statements are skipped one by one, each
/// with a [`Warning::SkippedLine`], and every well-formed entry is kept.
/// Warnings are logged and pushed onto `warnings` unless `silent` is set.
pub fn load(path: impl AsRef<Path>, silent: bool, warnings: &mut Vec<Warning>) -> VariableMap {
    let path = path.as_ref();
    let (entries, skipped) = match read_lenient(path) {
        Ok(parsed) => parsed,
        Err(err) => {
            let warning = Warning::FileLoad {
                path: path.to_path_buf(),
                reason: err.to_string(),
            };
            emit(warning, silent, warnings);
            return VariableMap::new();
        }
    };

    for err in skipped {
        let warning = Warning::SkippedLine {
            path: path.to_path_buf(),
            line: err.line,
            reason: err.to_string(),
        };
        emit(warning, silent, warnings);
    }

    let map = into_map(entries, Some(path));
    tracing::debug!(path = %path.display(), keys = map.len(), "loaded environment file");
    map
}

fn read_lenient(path: &Path) -> Result<(Vec<Entry>, Vec<ParseError>), Error> {
    let bytes = std::fs::read(path)?;
    Ok(parse_lenient(std::str::from_utf8(&bytes)?))
}

fn into_map(entries: Vec<Entry>, path: Option<&Path>) -> VariableMap {
    entries
        .into_iter()
        .map(|entry| {
            if let Some(path) = path {
                tracing::trace!(path = %path.display(), line = entry.line, key = %entry.key, "loaded entry");
            }
            (entry.key, entry.value)
        })
        .collect()
}

pub(crate) fn emit(warning: Warning, silent: bool, warnings: &mut Vec<Warning>) {
    if silent {
        return;
    }

    match &warning {
        Warning::FileLoad { path, reason } => {
            tracing::warn!(path = %path.display(), error = %reason, "{warning}");
        }
        Warning::SkippedLine { path, line, reason } => {
            tracing::warn!(path = %path.display(), line, error = %reason, "{warning}");
        }
        Warning::DeprecatedSample => tracing::warn!("{warning}"),
    }
    warnings.push(warning);
}

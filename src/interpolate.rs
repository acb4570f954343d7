//! `$NAME` / `${NAME}` expansion against a resolved variable map.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::Error;
use crate::model::VariableMap;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$([a-zA-Z0-9_]+)|\$\{([a-zA-Z0-9_]+)\}").expect("placeholder pattern is valid")
});

/// Expand a final value, honoring `\$` escapes.
///
/// A value starting with `\$` loses only its leading backslash. A value
/// containing `\$` anywhere else has every `\$` turned into `$`. Neither
/// form is interpolated.
pub fn expand_value(value: &str, vars: &VariableMap) -> Result<String, Error> {
    if let Some(rest) = value.strip_prefix('\\')
        && rest.starts_with('$')
    {
        return Ok(rest.to_owned());
    }
    if value.contains("\\$") {
        return Ok(value.replace("\\$", "$"));
    }
    interpolate(value, vars)
}

/// Recursively substitute every placeholder in `value`.
///
/// Unknown names expand to the empty string. Each looked-up value is itself
/// expanded before being spliced in; re-entering a name that is still being
/// expanded fails with [`Error::CircularReference`].
pub fn interpolate(value: &str, vars: &VariableMap) -> Result<String, Error> {
    interpolate_with_chain(value, vars, &mut Vec::new())
}

fn interpolate_with_chain<'a>(
    value: &str,
    vars: &'a VariableMap,
    chain: &mut Vec<&'a str>,
) -> Result<String, Error> {
    let mut out = String::with_capacity(value.len());
    let mut cursor = 0usize;

    for captures in PLACEHOLDER.captures_iter(value) {
        let (Some(token), Some(name)) = (captures.get(0), captures.get(1).or(captures.get(2)))
        else {
            continue;
        };

        out.push_str(&value[cursor..token.start()]);
        cursor = token.end();

        let Some((key, raw)) = vars.get_key_value(name.as_str()) else {
            continue;
        };
        if chain.contains(&key.as_str()) {
            return Err(Error::CircularReference { key: key.clone() });
        }

        chain.push(key);
        let expanded = interpolate_with_chain(raw, vars, chain)?;
        chain.pop();
        out.push_str(&expanded);
    }

    out.push_str(&value[cursor..]);
    Ok(out)
}

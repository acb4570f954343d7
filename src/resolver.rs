use crate::config::Config;
use crate::env::SystemEnv;
use crate::error::Error;
use crate::interpolate::expand_value;
use crate::loader::load;
use crate::model::{Definitions, Resolved, VariableMap};

/// Resolve a [`Config`] with the live process environment as overlay source.
pub fn resolve(config: Config) -> Result<Resolved, Error> {
    Resolver::new(config).resolve()
}

/// Single-pass pipeline from environment files to encoded definitions.
#[derive(Debug, Clone)]
pub struct Resolver {
    config: Config,
    system_env: SystemEnv,
}

impl Resolver {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            system_env: SystemEnv::process(),
        }
    }

    /// Replace the source consulted when `systemvars` is enabled.
    pub fn system_env(mut self, system_env: SystemEnv) -> Self {
        self.system_env = system_env;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn resolve(self) -> Result<Resolved, Error> {
        let mut warnings = Vec::new();
        let config = self.config.normalized(&mut warnings);
        let silent = config.is_silent();

        let env = load(config.env_path(), silent, &mut warnings);
        let blueprint = config
            .safe_mode()
            .template_path()
            .map(|template| load(template, silent, &mut warnings));

        let mut vars = if config.is_systemvars() {
            self.system_env.snapshot()
        } else {
            VariableMap::new()
        };

        merge(&config, &env, blueprint.as_ref(), &mut vars)?;

        let variables = if config.is_expand() {
            vars.iter()
                .map(|(key, value)| Ok((key.clone(), expand_value(value, &vars)?)))
                .collect::<Result<VariableMap, Error>>()?
        } else {
            vars
        };

        let definitions = encode(config.key_prefix(), &variables)?;
        tracing::debug!(definitions = definitions.len(), "resolved environment");

        Ok(Resolved {
            variables,
            definitions,
            warnings,
        })
    }
}

/// Resolve every key of `blueprint` (or `env` when safe mode is off) into
/// `vars`, where values already present take precedence over `env`.
fn merge(
    config: &Config,
    env: &VariableMap,
    blueprint: Option<&VariableMap>,
    vars: &mut VariableMap,
) -> Result<(), Error> {
    let safe = blueprint.is_some();

    for key in blueprint.unwrap_or(env).keys() {
        let value = vars.get(key).or_else(|| env.get(key)).cloned();
        match value {
            Some(value) if !value.is_empty() || !safe || config.allows_empty_values() => {
                vars.insert(key.clone(), value);
            }
            _ if safe => return Err(Error::MissingVariable { key: key.clone() }),
            _ => {}
        }
    }

    Ok(())
}

/// JSON-encode each value under its namespaced key.
pub fn encode(prefix: &str, variables: &VariableMap) -> Result<Definitions, Error> {
    let mut definitions = Definitions::default();
    for (key, value) in variables {
        definitions.insert(format!("{prefix}{key}"), serde_json::to_string(value)?);
    }
    Ok(definitions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Safe, Warning};
    use std::path::Path;
    use tempfile::TempDir;

    fn map(pairs: &[(&str, &str)]) -> VariableMap {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect()
    }

    fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).expect("write fixture");
        path
    }

    #[test]
    fn merge_prefers_existing_overlay_values() {
        let config = Config::new();
        let env = map(&[("FOO", "file"), ("BAR", "file")]);
        let mut vars = map(&[("FOO", "env")]);

        merge(&config, &env, None, &mut vars).expect("merge");

        assert_eq!(vars, map(&[("BAR", "file"), ("FOO", "env")]));
    }

    #[test]
    fn merge_fails_on_empty_template_key_in_safe_mode() {
        let config = Config::new().safe(true);
        let env = map(&[("REQUIRED", "")]);
        let blueprint = map(&[("REQUIRED", "")]);
        let mut vars = VariableMap::new();

        match merge(&config, &env, Some(&blueprint), &mut vars) {
            Err(Error::MissingVariable { key }) => assert_eq!(key, "REQUIRED"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn merge_allows_empty_values_when_configured() {
        let config = Config::new().safe(true).allow_empty_values(true);
        let env = map(&[("OPTIONAL", "")]);
        let blueprint = map(&[("OPTIONAL", ""), ("REQUIRED", "")]);
        let mut vars = map(&[("REQUIRED", "set")]);

        merge(&config, &env, Some(&blueprint), &mut vars).expect("merge");
        assert_eq!(vars.get("OPTIONAL").map(String::as_str), Some(""));

        let mut vars = VariableMap::new();
        assert!(matches!(
            merge(&config, &env, Some(&blueprint), &mut vars),
            Err(Error::MissingVariable { key }) if key == "REQUIRED"
        ));
    }

    #[test]
    fn merge_keeps_empty_values_outside_safe_mode() {
        let config = Config::new();
        let env = map(&[("EMPTY", "")]);
        let mut vars = VariableMap::new();

        merge(&config, &env, None, &mut vars).expect("merge");
        assert_eq!(vars, map(&[("EMPTY", "")]));
    }

    #[test]
    fn encode_namespaces_and_quotes_values() {
        let definitions =
            encode("process.env.", &map(&[("A", "x"), ("Q", "say \"hi\"\n")])).expect("encode");

        assert_eq!(definitions.get("process.env.A"), Some("\"x\""));
        assert_eq!(
            definitions.get("process.env.Q"),
            Some(r#""say \"hi\"\n""#)
        );
    }

    #[test]
    fn resolve_uses_explicit_system_env() {
        let dir = TempDir::new().expect("temp dir");
        let env_path = write(dir.path(), ".env", "FOO=file\n");

        let resolved = Resolver::new(Config::new().path(&env_path).systemvars(true))
            .system_env(SystemEnv::from_memory(map(&[("FOO", "env"), ("EXTRA", "1")])))
            .resolve()
            .expect("resolve");

        assert_eq!(resolved.definitions.get("process.env.FOO"), Some("\"env\""));
        assert_eq!(resolved.definitions.get("process.env.EXTRA"), Some("\"1\""));
        assert!(resolved.warnings.is_empty());
    }

    #[test]
    fn resolve_ignores_system_env_without_systemvars() {
        let dir = TempDir::new().expect("temp dir");
        let env_path = write(dir.path(), ".env", "FOO=file\n");

        let resolved = Resolver::new(Config::new().path(&env_path))
            .system_env(SystemEnv::from_memory(map(&[("FOO", "env")])))
            .resolve()
            .expect("resolve");

        assert_eq!(resolved.variables, map(&[("FOO", "file")]));
    }

    #[test]
    fn resolve_loads_template_through_sample_alias() {
        let dir = TempDir::new().expect("temp dir");
        let env_path = write(dir.path(), ".env", "A=1\n");
        let template = write(dir.path(), "template.env", "A=\nB=\n");

        let err = Resolver::new(Config::new().path(&env_path).sample(template))
            .system_env(SystemEnv::from_memory(VariableMap::new()))
            .resolve()
            .expect_err("B is required");

        assert_eq!(err.to_string(), "missing environment variable: B");
    }

    #[test]
    fn resolve_expands_after_merge() {
        let dir = TempDir::new().expect("temp dir");
        let env_path = write(dir.path(), ".env", "URL=http://$HOST:${PORT}\nPORT=80\n");

        let resolved = Resolver::new(Config::new().path(&env_path).systemvars(true).expand(true))
            .system_env(SystemEnv::from_memory(map(&[("HOST", "example.test")])))
            .resolve()
            .expect("resolve");

        assert_eq!(
            resolved.variables.get("URL").map(String::as_str),
            Some("http://example.test:80")
        );
    }

    #[test]
    fn resolve_reports_missing_primary_file() {
        let dir = TempDir::new().expect("temp dir");
        let missing = dir.path().join(".env");

        let resolved = resolve(Config::new().path(&missing)).expect("resolve");

        assert!(resolved.definitions.is_empty());
        assert_eq!(resolved.warnings.len(), 1);
        match &resolved.warnings[0] {
            Warning::FileLoad { path, reason } => {
                assert_eq!(path, &missing);
                assert!(reason.starts_with("I/O error"), "{reason}");
            }
            other => panic!("unexpected warning: {other:?}"),
        }
    }

    #[test]
    fn resolve_with_safe_off_never_loads_template() {
        let dir = TempDir::new().expect("temp dir");
        let env_path = write(dir.path(), ".env", "A=1\n");

        let resolved = resolve(Config::new().path(&env_path).safe(Safe::Off)).expect("resolve");

        assert!(resolved.warnings.is_empty());
        assert_eq!(resolved.definitions.len(), 1);
    }
}

use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use dotenv_define::{Config, Resolver, Safe};
use tracing_subscriber::EnvFilter;

/// Resolve a dotenv file into JSON-encoded build-time definitions.
#[derive(Debug, Parser)]
#[command(name = "dotenv-define", version, about)]
struct Cli {
    /// Primary environment file.
    #[arg(long, default_value = Config::DEFAULT_PATH, env = "DOTENV_DEFINE_PATH")]
    path: PathBuf,

    /// Require every key of a template file (default ./.env.example).
    #[arg(long, value_name = "TEMPLATE", num_args = 0..=1)]
    safe: Option<Option<PathBuf>>,

    /// Deprecated alias for --safe.
    #[arg(long, value_name = "TEMPLATE", num_args = 0..=1, hide = true)]
    sample: Option<Option<PathBuf>>,

    /// Overlay the process environment; its values win over the file.
    #[arg(long)]
    systemvars: bool,

    /// Suppress warnings.
    #[arg(long)]
    silent: bool,

    /// Expand $VAR and ${VAR} references, honoring \$ escapes.
    #[arg(long)]
    expand: bool,

    /// Namespace prepended to every output key.
    #[arg(long, default_value = Config::DEFAULT_PREFIX)]
    prefix: String,

    /// Accept empty values for template keys in safe mode.
    #[arg(long)]
    allow_empty_values: bool,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pretty: bool,
}

impl Cli {
    fn config(&self) -> Config {
        Config::new()
            .path(&self.path)
            .safe(safe_option(&self.safe))
            .sample(safe_option(&self.sample))
            .systemvars(self.systemvars)
            .silent(self.silent)
            .expand(self.expand)
            .prefix(self.prefix.as_str())
            .allow_empty_values(self.allow_empty_values)
    }
}

fn safe_option(flag: &Option<Option<PathBuf>>) -> Safe {
    match flag {
        None => Safe::Off,
        Some(None) => Safe::DefaultTemplate,
        Some(Some(path)) => Safe::Template(path.clone()),
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("dotenv-define: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let resolved = Resolver::new(cli.config())
        .resolve()
        .context("failed to resolve environment")?;

    let json = if cli.pretty {
        serde_json::to_string_pretty(&resolved.definitions)?
    } else {
        serde_json::to_string(&resolved.definitions)?
    };

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{json}").context("failed to write definitions")?;
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("dotenv-define").chain(args.iter().copied()))
            .expect("parse should succeed")
    }

    #[test]
    fn defaults_match_config_defaults() {
        let cli = parse(&[]);
        assert_eq!(cli.config(), Config::new());
    }

    #[test]
    fn bare_safe_selects_default_template() {
        let cli = parse(&["--safe"]);
        assert_eq!(cli.config().safe_mode(), &Safe::DefaultTemplate);
    }

    #[test]
    fn safe_accepts_template_path() {
        let cli = parse(&["--safe", "ci.env.example", "--expand"]);
        assert_eq!(cli.config().safe_mode(), &Safe::from("ci.env.example"));
        assert!(cli.config().is_expand());
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}

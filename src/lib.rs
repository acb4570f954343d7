//! Resolve `.env` files into namespaced, JSON-encoded build-time definitions.
//!
//! [`Resolver::resolve`] loads the primary file, optionally checks it against
//! a template of required keys ("safe mode"), optionally overlays system
//! environment variables, optionally expands `$VAR` / `${VAR}` references,
//! and returns a [`Definitions`] map from `process.env.<NAME>` to a JSON
//! string literal ready for textual substitution.
//!
//! ```no_run
//! use dotenv_define::{Config, Resolver};
//!
//! let resolved = Resolver::new(Config::new().safe(true).expand(true)).resolve()?;
//! for (key, literal) in resolved.definitions.iter() {
//!     println!("{key} => {literal}");
//! }
//! # Ok::<(), dotenv_define::Error>(())
//! ```
//!
//! Missing or unreadable files never fail resolution; they load as empty
//! and produce a [`Warning`]. Malformed lines are skipped with a warning
//! while the rest of the file still loads. Only a safe-mode key that resolves to an empty
//! value, or a circular reference during expansion, is fatal.

mod config;
mod env;
mod error;
mod interpolate;
mod loader;
mod model;
mod parser;
mod resolver;

pub use config::Config;
pub use env::SystemEnv;
pub use error::{Error, ParseError, ParseErrorKind};
pub use interpolate::{expand_value, interpolate};
pub use loader::{load, read_file};
pub use model::{Definitions, Entry, Resolved, Safe, VariableMap, Warning};
pub use parser::{parse_bytes, parse_str};
pub use resolver::{Resolver, encode, resolve};

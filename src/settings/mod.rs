//! Command line and file based configuration. The settings file is chosen
//! with `--settings`, falling back to `settings/dev.toml` in debug builds.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;

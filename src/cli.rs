use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "telegram-bridge-notion", version, about)]
pub struct Cli {
    /// Path to the YAML configuration file. Built-in defaults plus environment
    /// overrides are used when it does not exist.
    #[arg(short, long, env = "CONFIG_PATH", default_value = "config.yaml")]
    pub config: PathBuf,

    /// Validate the configuration, create the database tables and exit.
    #[arg(long)]
    pub check: bool,
}

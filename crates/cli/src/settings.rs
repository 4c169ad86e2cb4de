//! `tabtrack config`: inspect the effective settings.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use tabtrack_config::Settings;

use crate::CliError;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective settings as TOML (defaults when no file exists)
    #[command(after_help = "\
Examples:
  tabtrack config show
  tabtrack config show --config ./tabtrack.toml > tabtrack.toml")]
    Show,

    /// Print where settings are read from
    Path,

    /// Check a settings file without running anything
    Validate {
        /// Settings file
        file: PathBuf,
    },
}

pub fn cmd_config(cmd: ConfigCommands, config: Option<&Path>) -> Result<(), CliError> {
    match cmd {
        ConfigCommands::Show => {
            let settings = Settings::load_or_default(config)?;
            print!("{}", settings.to_toml()?);
            Ok(())
        }
        ConfigCommands::Path => {
            let path = config.map(Path::to_path_buf).unwrap_or_else(Settings::default_path);
            let state = if path.exists() { "" } else { " (missing, defaults apply)" };
            println!("{}{state}", path.display());
            Ok(())
        }
        ConfigCommands::Validate { file } => {
            let settings = Settings::load(&file)?;
            println!(
                "{}: ok ({} strateg{})",
                file.display(),
                settings.strategies.len(),
                if settings.strategies.len() == 1 { "y" } else { "ies" }
            );
            Ok(())
        }
    }
}

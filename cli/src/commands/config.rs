//! `wslstack config`: show and set configuration values.

use anyhow::Result;
use clap::Subcommand;

use crate::app::AppContext;
use crate::application::ports::ConfigStore;
use crate::application::services::config_service;

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,
    /// Set configuration value
    Set {
        /// Configuration key (e.g. container.image)
        key: String,
        /// Configuration value
        value: String,
    },
    /// Print the configuration file location
    Path,
}

/// Run the config command.
///
/// # Errors
///
/// Returns an error if the key or value is invalid or the file cannot be
/// read or written.
pub fn run(app: &AppContext, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => {
            let config = app.load_config()?;
            app.renderer().render_config(&config, &app.config_store.path()?)
        }
        ConfigCommand::Set { key, value } => {
            let config = config_service::set_value(&app.config_store, &key, &value)?;
            app.renderer()
                .render_config_set(&key, &value, &config, &app.config_store.path()?)
        }
        ConfigCommand::Path => app.renderer().render_config_path(&app.config_store.path()?),
    }
}

//! Command handlers, one module per subcommand family.

pub mod config_cmd;
pub mod run;
pub mod station;
pub mod status;
pub mod util;

use tracing::debug;

use crate::cli::{Command, GlobalOpts};
use crate::config;
use crate::error::CliError;

/// Route a parsed command to its handler.
pub async fn dispatch(command: Command, global: &GlobalOpts) -> Result<(), CliError> {
    debug!(command = ?command, "dispatching command");
    match command {
        // Config commands don't need a resolved profile
        Command::Config(args) => config_cmd::handle(&args, global),
        Command::Run(_) => run::handle(global, &config::resolve(global)?).await,
        Command::Status(args) => status::handle(&args, &config::resolve(global)?).await,
        Command::Arm(args) => station::handle(&args, true, &config::resolve(global)?).await,
        Command::Disarm(args) => station::handle(&args, false, &config::resolve(global)?).await,
    }
}

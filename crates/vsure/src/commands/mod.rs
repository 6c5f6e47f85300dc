//! Command handlers, one module per top-level command group.

pub mod auth;
pub mod config_cmd;
pub mod installations;
pub mod operations;
pub mod query;

use vsure_api::Session;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a session-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    session: &mut Session,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Login(args) => auth::login(session, args, global).await,
        Command::Logout => auth::logout(session, global).await,
        Command::Refresh => auth::refresh(session, global).await,
        Command::Installations => installations::handle(session, global).await,
        Command::Query(args) => query::handle(session, args, global).await,
        // Local commands are handled before dispatch
        Command::Operations | Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}

mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use vsure_api::Session;

use crate::cli::{Cli, Command};
use crate::config::CredentialNeed;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Local commands: no session, no credentials
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),
        Command::Operations => commands::operations::handle(&cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "vsure", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let need = match cmd {
                Command::Login(_) => CredentialNeed::Login,
                Command::Logout => CredentialNeed::None,
                _ => CredentialNeed::Resumable,
            };
            let cfg = config::load_config_or_default();
            let resolved = config::resolve(&cli.global, &cfg, need)?;
            let has_password = resolved.credentials.has_password();
            let mut session = Session::new(resolved.credentials, resolved.session)?;

            tracing::debug!(command = ?cmd, profile = %resolved.profile, "dispatching command");
            match commands::dispatch(cmd, &mut session, &cli.global).await {
                // The cache did not carry the session and there was nothing to log in with
                Err(CliError::AuthFailed { .. }) if !has_password => Err(CliError::NoCredentials {
                    profile: resolved.profile,
                }),
                result => result,
            }
        }
    }
}

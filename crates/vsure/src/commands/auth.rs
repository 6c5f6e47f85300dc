//! Login, logout and refresh handlers.

use std::io::IsTerminal;

use dialoguer::Input;

use vsure_api::{Error as ApiError, Installation, Session};

use crate::cli::{GlobalOpts, LoginArgs};
use crate::error::CliError;
use crate::output;

use super::installations;

pub async fn login(
    session: &mut Session,
    args: LoginArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let list = match session.login().await {
        Ok(list) => list,
        Err(ApiError::MfaRequired) => step_up(session, global).await?,
        Err(e) => return Err(e.into()),
    };

    if args.trust {
        session.trust_device().await?;
        output::status(global, "Device trusted; multi-factor will be skipped next time");
    }

    output::status(global, &format!("Logged in as {}", session.username()));
    installations::print(session, &list, global)
}

/// Complete a multi-factor challenge interactively.
async fn step_up(session: &mut Session, global: &GlobalOpts) -> Result<Vec<Installation>, CliError> {
    if !std::io::stdin().is_terminal() {
        return Err(CliError::MfaRequired);
    }

    session.request_mfa().await?;
    output::status(
        global,
        &format!("Verification code sent by {}", session.mfa_channel()),
    );

    let code: String = Input::new()
        .with_prompt("Verification code")
        .interact_text()
        .map_err(|e| CliError::Validation {
            field: "interactive".into(),
            reason: format!("prompt failed: {e}"),
        })?;

    Ok(session.validate_mfa(code.trim()).await?)
}

pub async fn logout(session: &mut Session, global: &GlobalOpts) -> Result<(), CliError> {
    session.logout().await;
    output::status(global, "Logged out");
    Ok(())
}

pub async fn refresh(session: &mut Session, global: &GlobalOpts) -> Result<(), CliError> {
    session.authenticate().await?;
    session.refresh().await?;
    output::status(global, "Session refreshed");
    Ok(())
}

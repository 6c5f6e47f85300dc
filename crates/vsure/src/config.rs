//! CLI configuration: thin wrapper around `vsure_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--username, --installation, etc.).

use std::io::IsTerminal;
use std::path::Path;

use secrecy::SecretString;

use vsure_api::{Credentials, SessionConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use vsure_config::{
    Config, ConfigError, Profile, config_path, load_config_or_default, save_config,
    store_password,
};

/// Everything needed to open a session for one invocation.
#[derive(Debug)]
pub struct Resolved {
    pub profile: String,
    pub credentials: Credentials,
    pub session: SessionConfig,
}

/// How much of the credential chain a command needs before it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialNeed {
    /// Ends a session; neither username nor password is required.
    None,
    /// May resume from the token cache; the password is only required
    /// when there is no cache to resume.
    Resumable,
    /// Always sends credentials.
    Login,
}

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.profile(global.profile.as_deref()).0
}

/// The selected profile with CLI flag overrides applied.
///
/// An explicitly requested profile must exist once any profile is
/// configured; otherwise an empty profile stands in so flags and
/// environment variables alone are enough.
pub fn effective_profile(global: &GlobalOpts, config: &Config) -> Result<Profile, CliError> {
    let (name, found) = config.profile(global.profile.as_deref());
    let mut profile = match found {
        Some(profile) => profile.clone(),
        None if global.profile.is_some() && !config.profiles.is_empty() => {
            let mut names: Vec<_> = config.profiles.keys().cloned().collect();
            names.sort();
            return Err(CliError::ProfileNotFound {
                name,
                available: names.join(", "),
            });
        }
        None => Profile::default(),
    };

    if let Some(ref username) = global.username {
        profile.username = Some(username.clone());
    }
    if let Some(index) = global.installation {
        profile.installation = index;
    }
    if let Some(ref path) = global.token_file {
        profile.token_file = Some(path.clone());
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }
    Ok(profile)
}

/// Translate config + global flags into session inputs.
///
/// The password comes from the shared resolution chain. When nothing is
/// configured it is prompted for on a terminal, unless `need` says the
/// command can do without it.
pub fn resolve(
    global: &GlobalOpts,
    config: &Config,
    need: CredentialNeed,
) -> Result<Resolved, CliError> {
    let name = active_profile_name(global, config);
    let profile = effective_profile(global, config)?;
    let session = vsure_config::profile_to_session_config(&profile, &name, &config.defaults)?;

    let username = match vsure_config::resolve_username(&profile, &name) {
        Ok(username) => username,
        Err(ConfigError::NoCredentials { .. }) if need == CredentialNeed::None => String::new(),
        Err(e) => return Err(e.into()),
    };

    let password = match vsure_config::resolve_password(&profile, &name) {
        Ok(password) => Some(password),
        Err(ConfigError::NoCredentials { .. }) => match need {
            CredentialNeed::None => None,
            CredentialNeed::Resumable if has_cached_token(&session) => None,
            _ if std::io::stdin().is_terminal() => Some(prompt_password(&username)?),
            _ => return Err(CliError::NoCredentials { profile: name }),
        },
        Err(e) => return Err(e.into()),
    };

    let credentials = match password {
        Some(password) => Credentials::new(username, password),
        None => Credentials::username_only(username),
    };

    Ok(Resolved {
        profile: name,
        credentials,
        session,
    })
}

fn has_cached_token(session: &SessionConfig) -> bool {
    session.token_path.as_deref().is_some_and(Path::exists)
}

fn prompt_password(username: &str) -> Result<SecretString, CliError> {
    let password = rpassword::prompt_password(format!("Password for {username}: "))?;
    if password.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "password cannot be empty".into(),
        });
    }
    Ok(SecretString::from(password))
}

//! Shared configuration for the vsure tools.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext), and
//! translation to `vsure_api::SessionConfig`. The CLI layers its
//! `GlobalOpts` overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use vsure_api::{Credentials, MfaChannel, SessionConfig, TlsMode, TransportConfig};

const KEYRING_SERVICE: &str = "vsure";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named account profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// The named profile, or the default profile when `name` is `None`.
    pub fn profile(&self, name: Option<&str>) -> (String, Option<&Profile>) {
        let name = name
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into());
        let profile = self.profiles.get(&name);
        (name, profile)
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Multi-factor delivery channel: "phone" or "email".
    #[serde(default = "default_mfa_channel")]
    pub mfa_channel: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            mfa_channel: default_mfa_channel(),
        }
    }
}

fn default_timeout() -> u64 {
    10
}
fn default_mfa_channel() -> String {
    "phone".into()
}

/// A named account profile.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Account e-mail used to log in.
    pub username: Option<String>,

    /// Plaintext password; prefer the keyring or `password_env`.
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Mirror base URLs, preferred first. Empty means the production
    /// mirrors.
    #[serde(default)]
    pub endpoints: Vec<String>,

    /// Index of the installation to select after login.
    #[serde(default)]
    pub installation: usize,

    /// Session token cache file.
    pub token_file: Option<PathBuf>,

    /// Path to an extra CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override timeout.
    pub timeout: Option<u64>,

    /// Override multi-factor channel.
    pub mfa_channel: Option<String>,
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "vsure", "vsure")
}

fn home_fallback(kind: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(kind);
    p.push("vsure");
    p
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Default token cache location for a profile.
pub fn default_token_path(profile_name: &str) -> PathBuf {
    let file = format!("session-{profile_name}.json");
    project_dirs().map_or_else(
        || home_fallback(".cache").join(&file),
        |dirs| dirs.cache_dir().join(&file),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file + environment.
///
/// Environment variables are `VSURE_` prefixed; `__` separates nesting
/// levels (`VSURE_PROFILES__HOME__USERNAME`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("VSURE_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

/// Store a profile's password in the system keyring.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password"))?;
    entry.set_password(password)?;
    Ok(())
}

// ── Credential resolution (without CLI flags) ───────────────────────

/// Username from the profile, falling back to `VSURE_USERNAME`.
pub fn resolve_username(profile: &Profile, profile_name: &str) -> Result<String, ConfigError> {
    profile
        .username
        .clone()
        .or_else(|| std::env::var("VSURE_USERNAME").ok())
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })
}

/// Resolve the password from the credential chain.
pub fn resolve_password(
    profile: &Profile,
    profile_name: &str,
) -> Result<SecretString, ConfigError> {
    // 1. Profile's password_env → env var lookup
    if let Some(ref env_name) = profile.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. Env var
    if let Ok(pw) = std::env::var("VSURE_PASSWORD") {
        return Ok(SecretString::from(pw));
    }

    // 3. Keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password")) {
        if let Ok(pw) = entry.get_password() {
            return Ok(SecretString::from(pw));
        }
    }

    // 4. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Build `Credentials` for a profile.
pub fn resolve_credentials(
    profile: &Profile,
    profile_name: &str,
) -> Result<Credentials, ConfigError> {
    let username = resolve_username(profile, profile_name)?;
    let password = resolve_password(profile, profile_name)?;
    Ok(Credentials::new(username, password))
}

// ── Session config ──────────────────────────────────────────────────

/// Build a `SessionConfig` from a profile. No network or keyring access.
pub fn profile_to_session_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<SessionConfig, ConfigError> {
    let endpoints = profile
        .endpoints
        .iter()
        .map(|raw| {
            Url::parse(raw).map_err(|e| ConfigError::Validation {
                field: "endpoints".into(),
                reason: format!("{raw}: {e}"),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let channel = profile
        .mfa_channel
        .as_deref()
        .unwrap_or(&defaults.mfa_channel);
    let mfa_channel = channel
        .parse::<MfaChannel>()
        .map_err(|_| ConfigError::Validation {
            field: "mfa_channel".into(),
            reason: format!("expected 'phone' or 'email', got '{channel}'"),
        })?;

    let tls = profile
        .ca_cert
        .clone()
        .map_or(TlsMode::System, TlsMode::CustomCa);
    let timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));

    Ok(SessionConfig {
        endpoints,
        installation_index: profile.installation,
        token_path: Some(
            profile
                .token_file
                .clone()
                .unwrap_or_else(|| default_token_path(profile_name)),
        ),
        transport: TransportConfig { tls, timeout },
        mfa_channel,
    })
}

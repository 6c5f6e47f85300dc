//! Config subcommand handlers.

use dialoguer::{Input, Select};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display, masking sensitive fields.
fn format_config_redacted(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);
    let _ = writeln!(out, "mfa_channel = \"{}\"", cfg.defaults.mfa_channel);

    for name in sorted_names(cfg) {
        let p = &cfg.profiles[&name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        if let Some(ref u) = p.username {
            let _ = writeln!(out, "username = \"{u}\"");
        }
        if p.password.is_some() {
            let _ = writeln!(out, "password = \"****\"");
        }
        if let Some(ref env) = p.password_env {
            let _ = writeln!(out, "password_env = \"{env}\"");
        }
        if !p.endpoints.is_empty() {
            let quoted: Vec<_> = p.endpoints.iter().map(|e| format!("\"{e}\"")).collect();
            let _ = writeln!(out, "endpoints = [{}]", quoted.join(", "));
        }
        let _ = writeln!(out, "installation = {}", p.installation);
        if let Some(ref path) = p.token_file {
            let _ = writeln!(out, "token_file = \"{}\"", path.display());
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        if let Some(ref channel) = p.mfa_channel {
            let _ = writeln!(out, "mfa_channel = \"{channel}\"");
        }
    }

    out
}

fn sorted_names(cfg: &Config) -> Vec<String> {
    let mut names: Vec<_> = cfg.profiles.keys().cloned().collect();
    names.sort();
    names
}

fn profile_not_found(cfg: &Config, name: String) -> CliError {
    let available = sorted_names(cfg);
    CliError::ProfileNotFound {
        name,
        available: if available.is_empty() {
            "(none)".into()
        } else {
            available.join(", ")
        },
    }
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Offer to store the password in the system keyring or return it for
/// plaintext config.
///
/// Returns `Some(password)` if the user chose plaintext, `None` if stored
/// in the keyring.
fn prompt_password_storage(profile_name: &str, password: &str) -> Result<Option<String>, CliError> {
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt("Where to store the password?")
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if selection == 0 {
        config::store_password(profile_name, password)?;
        eprintln!("   ✓ Password stored in system keyring");
        Ok(None)
    } else {
        Ok(Some(password.to_owned()))
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("vsure configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            let username: String = Input::new()
                .with_prompt("Account e-mail")
                .interact_text()
                .map_err(prompt_err)?;

            let password = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
            if username.is_empty() || password.is_empty() {
                return Err(CliError::Validation {
                    field: "credentials".into(),
                    reason: "username and password cannot be empty".into(),
                });
            }
            let password = prompt_password_storage(&profile_name, &password)?;

            let channels = &["phone", "email"];
            let channel = Select::new()
                .with_prompt("Multi-factor code delivery")
                .items(channels)
                .default(0)
                .interact()
                .map_err(prompt_err)?;

            let profile = Profile {
                username: Some(username),
                password,
                mfa_channel: channels.get(channel).map(|c| (*c).to_owned()),
                ..Profile::default()
            };

            let mut cfg = config::load_config_or_default();
            cfg.profiles.insert(profile_name.clone(), profile);
            cfg.default_profile = Some(profile_name.clone());
            config::save_config(&cfg)?;

            eprintln!("\n✓ Configuration written to {}", config_path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Test it: vsure login");

            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            output::print_output(&format_config_redacted(&cfg), global.quiet);
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: vsure config init");
            } else {
                for name in sorted_names(&cfg) {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(profile_not_found(&cfg, name));
            }
            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            output::status(global, &format!("Default profile set to '{name}'"));
            Ok(())
        }

        // ── SetPassword ─────────────────────────────────────────────
        ConfigCommand::SetPassword => {
            let cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            if !cfg.profiles.contains_key(&profile_name) {
                return Err(profile_not_found(&cfg, profile_name));
            }

            let password =
                rpassword::prompt_password(format!("Password for profile '{profile_name}': "))
                    .map_err(prompt_err)?;
            if password.is_empty() {
                return Err(CliError::Validation {
                    field: "password".into(),
                    reason: "password cannot be empty".into(),
                });
            }
            config::store_password(&profile_name, &password)?;
            output::status(global, &format!("Password stored for profile '{profile_name}'"));
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacted_config_masks_password() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "home".into(),
            Profile {
                username: Some("me@example.com".into()),
                password: Some("hunter2".into()),
                ..Profile::default()
            },
        );

        let out = format_config_redacted(&cfg);

        assert!(out.contains("[profiles.home]"));
        assert!(out.contains("username = \"me@example.com\""));
        assert!(out.contains("password = \"****\""));
        assert!(!out.contains("hunter2"));
    }
}

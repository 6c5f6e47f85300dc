//! Installation listing.

use tabled::Tabled;

use vsure_api::{Installation, Session};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct InstallationRow {
    #[tabled(rename = "")]
    active: &'static str,
    #[tabled(rename = "Giid")]
    giid: String,
    #[tabled(rename = "Alias")]
    alias: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Locale")]
    locale: String,
}

fn to_row(inst: &Installation, active_giid: Option<&str>) -> InstallationRow {
    let address = inst
        .address
        .as_ref()
        .map(|a| {
            [&a.street, &a.postal_number, &a.city]
                .into_iter()
                .flatten()
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default();
    InstallationRow {
        active: if active_giid == Some(inst.giid.as_str()) { "*" } else { "" },
        giid: inst.giid.clone(),
        alias: inst.alias.clone(),
        address,
        locale: inst.locale.clone().unwrap_or_default(),
    }
}

pub async fn handle(session: &mut Session, global: &GlobalOpts) -> Result<(), CliError> {
    let list = session.authenticate().await?;
    print(session, &list, global)
}

/// Render installations, marking the active one in table output.
pub fn print(session: &Session, list: &[Installation], global: &GlobalOpts) -> Result<(), CliError> {
    let active = session.active_installation().map(|inst| inst.giid.as_str());
    let out = output::render_list(&global.output, list, |inst| to_row(inst, active))?;
    output::print_output(&out, global.quiet);
    Ok(())
}

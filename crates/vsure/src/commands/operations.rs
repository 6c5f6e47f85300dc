//! Catalog listing. Purely local: no credentials, no network.

use serde::Serialize;
use tabled::Tabled;

use vsure_api::OperationDescriptor;
use vsure_api::graphql::catalog;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct OperationInfo {
    key: &'static str,
    name: &'static str,
    kind: String,
    needs_installation: bool,
    values: Vec<ValueInfo>,
    help: &'static str,
}

#[derive(Debug, Serialize)]
struct ValueInfo {
    name: &'static str,
    #[serde(rename = "type")]
    ty: String,
}

impl From<&OperationDescriptor> for OperationInfo {
    fn from(op: &OperationDescriptor) -> Self {
        Self {
            key: op.key,
            name: op.name,
            kind: op.kind.to_string(),
            needs_installation: op.needs_installation(),
            values: op
                .caller_slots()
                .map(|(name, ty)| ValueInfo {
                    name,
                    ty: ty.to_string(),
                })
                .collect(),
            help: op.help,
        }
    }
}

#[derive(Tabled)]
struct OperationRow {
    #[tabled(rename = "Key")]
    key: &'static str,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Values")]
    values: String,
    #[tabled(rename = "Description")]
    help: &'static str,
}

fn to_row(info: &OperationInfo) -> OperationRow {
    OperationRow {
        key: info.key,
        kind: info.kind.clone(),
        values: info
            .values
            .iter()
            .map(|v| format!("{}: {}", v.name, v.ty))
            .collect::<Vec<_>>()
            .join(", "),
        help: info.help,
    }
}

pub fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let infos: Vec<OperationInfo> = catalog::OPERATIONS.iter().map(OperationInfo::from).collect();
    let out = output::render_list(&global.output, &infos, to_row)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

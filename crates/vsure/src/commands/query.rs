//! Catalog operations, single or batched.

use serde_json::Value;

use vsure_api::graphql::catalog;
use vsure_api::{Error as ApiError, OperationDescriptor, Session};

use crate::cli::{GlobalOpts, QueryArgs};
use crate::error::CliError;
use crate::output;

/// One requested operation: catalog key plus caller values.
#[derive(Debug, PartialEq, Eq)]
struct Request {
    key: String,
    values: Vec<String>,
}

/// Parse `KEY` or `KEY:VALUE[,VALUE...]`.
fn parse_op(arg: &str) -> Request {
    match arg.split_once(':') {
        Some((key, values)) => Request {
            key: key.trim().to_owned(),
            values: values.split(',').map(|v| v.trim().to_owned()).collect(),
        },
        None => Request {
            key: arg.trim().to_owned(),
            values: Vec::new(),
        },
    }
}

fn requests(args: QueryArgs) -> Vec<Request> {
    let mut out = Vec::with_capacity(args.ops.len() + 1);
    if let Some(key) = args.operation {
        out.push(Request {
            key,
            values: args.values,
        });
    }
    out.extend(args.ops.iter().map(String::as_str).map(parse_op));
    out
}

fn lookup(request: &Request) -> Result<&'static OperationDescriptor, ApiError> {
    catalog::find(&request.key).ok_or_else(|| ApiError::UnknownOperation {
        name: request.key.clone(),
    })
}

pub async fn handle(
    session: &mut Session,
    args: QueryArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let giid = args.giid.clone();
    let requests = requests(args);

    // Unknown keys fail before any login traffic
    let descriptors = requests
        .iter()
        .map(lookup)
        .collect::<Result<Vec<_>, _>>()?;

    session.authenticate().await?;
    if let Some(giid) = giid {
        session.set_active_installation(&giid)?;
    }

    let operations = descriptors
        .into_iter()
        .zip(&requests)
        .map(|(descriptor, request)| {
            let values: Vec<Value> = request.values.iter().cloned().map(Value::String).collect();
            session.build(descriptor, &values)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let results = session.dispatch(&operations).await?;
    let out = match results.as_slice() {
        [single] => output::render_value(&global.output, single)?,
        many => output::render_value(&global.output, many)?,
    };
    output::print_output(&out, global.quiet);
    Ok(())
}

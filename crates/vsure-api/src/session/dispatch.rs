// GraphQL dispatch
//
// Builds payloads from descriptors using session state and sends batches to
// `/graphql`. Results come back in the same positions as the operations
// that produced them.

use serde_json::Value;

use super::Session;
use crate::error::Error;
use crate::failover::Failover;
use crate::graphql::catalog;
use crate::graphql::operation::{
    self, Operation, OperationDescriptor, OperationKind, SessionScope,
};
use crate::transport::TransportRequest;
use crate::validate::{BodyFormat, Envelope};

const GRAPHQL_PATH: &str = "/graphql";

impl Session {
    /// Build the payload for `descriptor`, filling session-scoped slots from
    /// this session and caller slots from `args` in declared order.
    ///
    /// Fails without touching the network if any slot cannot be filled.
    pub fn build(
        &self,
        descriptor: &OperationDescriptor,
        args: &[Value],
    ) -> Result<Operation, Error> {
        let scope = SessionScope {
            giid: self.active_installation().map(|inst| inst.giid.as_str()),
            username: self.username(),
        };
        operation::build(descriptor, &scope, args)
    }

    /// Send one batch. Returns each operation's `data`, by position.
    ///
    /// Any entry carrying backend errors fails the whole batch with
    /// [`Error::Application`], which records the offending positions.
    pub async fn dispatch(&mut self, operations: &[Operation]) -> Result<Vec<Value>, Error> {
        self.ensure_authenticated()?;
        let result = self.send_batch(operations).await;
        self.guard(result)
    }

    /// Build and dispatch a single catalog operation by key.
    pub async fn query(&mut self, key: &str, args: &[Value]) -> Result<Value, Error> {
        self.ensure_authenticated()?;
        let descriptor = catalog::find(key).ok_or_else(|| Error::UnknownOperation {
            name: key.to_owned(),
        })?;
        let operation = self.build(descriptor, args)?;
        let mut data = self.dispatch(&[operation]).await?;
        Ok(data.pop().unwrap_or(Value::Null))
    }

    /// Dispatch without the state check; login uses this to fetch
    /// installations before the session counts as authenticated.
    pub(super) async fn send_batch(
        &mut self,
        operations: &[Operation],
    ) -> Result<Vec<Value>, Error> {
        if operations.is_empty() {
            return Ok(Vec::new());
        }

        let failover = if operations.iter().any(|op| op.kind == OperationKind::Mutation) {
            Failover::ConnectOnly
        } else {
            Failover::Any
        };
        let batch = Value::Array(operations.iter().map(Operation::to_wire).collect());
        let request = TransportRequest::post(GRAPHQL_PATH).json(batch);

        let response = self
            .execute(request, BodyFormat::Json, Envelope::GraphQl, failover)
            .await?;
        split_results(response, operations.len())
    }
}

/// Pull each entry's `data` out of a batch response.
fn split_results(response: Value, expected: usize) -> Result<Vec<Value>, Error> {
    let entries = match response {
        Value::Array(entries) => entries,
        single @ Value::Object(_) => vec![single],
        other => {
            return Err(Error::MalformedResponse {
                message: "GraphQL response is neither an object nor an array".into(),
                body: other.to_string(),
            });
        }
    };

    if entries.len() != expected {
        return Err(Error::MalformedResponse {
            message: format!(
                "sent {expected} operation(s) but received {} result(s)",
                entries.len()
            ),
            body: Value::Array(entries).to_string(),
        });
    }

    Ok(entries
        .into_iter()
        .map(|mut entry| entry.get_mut("data").map(Value::take).unwrap_or(Value::Null))
        .collect())
}

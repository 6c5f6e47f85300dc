// Operation descriptors and payload building.
//
// A descriptor is static data: operation name, GraphQL document, and the
// ordered variable slots. Building fills session-scoped slots from the
// session and caller slots from the supplied values, in declared order. A
// payload that cannot be completed is rejected here, before anything is
// sent.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::Error;

static DEVICE_LABEL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^[A-Z0-9]{4} [A-Z0-9]{4}$").unwrap()
});

/// Semantic type of a caller-supplied variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum SlotType {
    /// Device serial in `XXXX XXXX` form.
    DeviceLabel,
    /// Numeric user or alarm code.
    Code,
    TransactionId,
    Boolean,
    /// `ARMED_HOME`, `ARMED_AWAY` or `DISARMED`.
    ArmFutureState,
    /// `LOCKED` or `UNLOCKED`.
    LockFutureState,
    Text,
}

/// Variables the session fills in by itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionVariable {
    /// The active installation's giid.
    Giid,
    /// The login username (sent as `email`).
    Username,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Session(SessionVariable),
    Caller(SlotType),
    Constant(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub name: &'static str,
    pub scope: Scope,
}

impl Slot {
    pub const fn session(name: &'static str, variable: SessionVariable) -> Self {
        Self {
            name,
            scope: Scope::Session(variable),
        }
    }

    pub const fn caller(name: &'static str, ty: SlotType) -> Self {
        Self {
            name,
            scope: Scope::Caller(ty),
        }
    }

    pub const fn constant(name: &'static str, value: &'static str) -> Self {
        Self {
            name,
            scope: Scope::Constant(value),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum OperationKind {
    #[default]
    Query,
    Mutation,
}

/// Static description of one supported backend call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationDescriptor {
    /// Catalog key (`smart_plug`).
    pub key: &'static str,
    /// GraphQL `operationName` (`SmartPlug`).
    pub name: &'static str,
    pub kind: OperationKind,
    pub help: &'static str,
    pub document: &'static str,
    pub slots: &'static [Slot],
}

impl OperationDescriptor {
    /// Caller slots in declared order.
    pub fn caller_slots(&self) -> impl Iterator<Item = (&'static str, SlotType)> + '_ {
        self.slots.iter().filter_map(|slot| match slot.scope {
            Scope::Caller(ty) => Some((slot.name, ty)),
            _ => None,
        })
    }

    pub fn needs_installation(&self) -> bool {
        self.slots
            .iter()
            .any(|slot| slot.scope == Scope::Session(SessionVariable::Giid))
    }
}

/// Session state that session-scoped slots are filled from.
#[derive(Debug, Clone, Copy)]
pub struct SessionScope<'a> {
    pub giid: Option<&'a str>,
    pub username: &'a str,
}

/// A fully built GraphQL operation, ready to batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub operation_name: String,
    pub variables: Map<String, Value>,
    pub query: String,
    pub kind: OperationKind,
}

impl Operation {
    /// `{operationName, variables, query}` as sent in a batch.
    pub fn to_wire(&self) -> Value {
        let mut wire = Map::new();
        wire.insert("operationName".into(), Value::String(self.operation_name.clone()));
        wire.insert("variables".into(), Value::Object(self.variables.clone()));
        wire.insert("query".into(), Value::String(self.query.clone()));
        Value::Object(wire)
    }
}

/// Build the wire payload for `descriptor`.
///
/// `args` fill caller slots in declared order. Missing, surplus or
/// ill-typed values are rejected.
pub fn build(
    descriptor: &OperationDescriptor,
    scope: &SessionScope<'_>,
    args: &[Value],
) -> Result<Operation, Error> {
    let expected = descriptor.caller_slots().count();
    if args.len() > expected {
        return Err(Error::UnexpectedVariables {
            operation: descriptor.key.into(),
            expected,
            got: args.len(),
        });
    }

    let mut variables = Map::new();
    let mut supplied = args.iter();
    for slot in descriptor.slots {
        let value = match slot.scope {
            Scope::Session(SessionVariable::Giid) => {
                Value::String(scope.giid.ok_or(Error::NoInstallation)?.to_owned())
            }
            Scope::Session(SessionVariable::Username) => Value::String(scope.username.to_owned()),
            Scope::Constant(value) => Value::String(value.to_owned()),
            Scope::Caller(ty) => {
                let raw = supplied.next().ok_or_else(|| Error::MissingVariable {
                    operation: descriptor.key.into(),
                    slot: slot.name.into(),
                })?;
                coerce(descriptor, slot.name, ty, raw)?
            }
        };
        variables.insert(slot.name.to_owned(), value);
    }

    Ok(Operation {
        operation_name: descriptor.name.to_owned(),
        variables,
        query: descriptor.document.to_owned(),
        kind: descriptor.kind,
    })
}

fn coerce(
    descriptor: &OperationDescriptor,
    slot: &str,
    ty: SlotType,
    raw: &Value,
) -> Result<Value, Error> {
    let invalid = |reason: String| Error::InvalidVariable {
        operation: descriptor.key.into(),
        slot: slot.into(),
        reason,
    };

    if raw.is_null() {
        return Err(Error::MissingVariable {
            operation: descriptor.key.into(),
            slot: slot.into(),
        });
    }

    match ty {
        SlotType::Boolean => match raw {
            Value::Bool(_) => Ok(raw.clone()),
            Value::String(s) => s
                .parse::<bool>()
                .map(Value::Bool)
                .map_err(|_| invalid(format!("expected true or false, got {s:?}"))),
            other => Err(invalid(format!("expected a boolean, got {other}"))),
        },
        SlotType::Code => {
            let code = match raw {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                other => return Err(invalid(format!("expected digits, got {other}"))),
            };
            if code.is_empty() || !code.chars().all(|c| c.is_ascii_digit()) {
                return Err(invalid(format!("expected digits, got {code:?}")));
            }
            Ok(Value::String(code))
        }
        SlotType::DeviceLabel => {
            let label = as_text(raw).ok_or_else(|| invalid("expected a string".into()))?;
            if DEVICE_LABEL_REGEX.is_match(label) {
                Ok(Value::String(label.to_owned()))
            } else {
                Err(invalid(format!("{label:?} is not a device label")))
            }
        }
        SlotType::ArmFutureState => one_of(raw, &["ARMED_HOME", "ARMED_AWAY", "DISARMED"])
            .ok_or_else(|| invalid("expected ARMED_HOME, ARMED_AWAY or DISARMED".into())),
        SlotType::LockFutureState => one_of(raw, &["LOCKED", "UNLOCKED"])
            .ok_or_else(|| invalid("expected LOCKED or UNLOCKED".into())),
        SlotType::TransactionId | SlotType::Text => as_text(raw)
            .filter(|s| !s.is_empty())
            .map(|s| Value::String(s.to_owned()))
            .ok_or_else(|| invalid("expected a non-empty string".into())),
    }
}

fn as_text(raw: &Value) -> Option<&str> {
    raw.as_str()
}

fn one_of(raw: &Value, allowed: &[&str]) -> Option<Value> {
    let s = raw.as_str()?;
    allowed
        .contains(&s)
        .then(|| Value::String(s.to_owned()))
}

//! GraphQL operation descriptors, payload building, and the catalog of
//! supported backend operations.
//!
//! Building is pure: [`operation::build`] turns a descriptor plus caller
//! values into an [`Operation`] without touching the network. Sending is
//! done by [`Session::dispatch`](crate::Session::dispatch).

pub mod catalog;
pub mod operation;

pub use operation::{
    Operation, OperationDescriptor, OperationKind, Scope, SessionScope, SessionVariable, Slot,
    SlotType,
};

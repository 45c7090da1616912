//! fv-client: FlowVisor JSON-RPC client
//!
//! This crate provides:
//! - JSON-RPC 2.0 protocol types and the standard error-code table
//! - `FlowvisorClient`, an HTTP client speaking the FlowVisor admin API
//!   (slices and flow spaces), modeled on FlowVisor's own fvctl
//! - `ControllerApi`, the narrow seam the synchronization orchestrator
//!   depends on, so it can be driven against fakes in tests
//!
//! Every transport or protocol failure is logged and collapsed into the
//! empty-result sentinel (`None`); the client never raises toward its
//! callers. Controller availability is best-effort relative to the
//! authoritative local store.

pub mod client;
pub mod protocol;

pub use client::{ControllerApi, FlowvisorClient, FULL_PERM};
pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::client::{ControllerApi, FlowvisorClient, FULL_PERM};
    pub use super::protocol::{JsonRpcRequest, JsonRpcResponse};
}

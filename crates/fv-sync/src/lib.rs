//! fv-sync: controller state synchronization orchestrator
//!
//! Drives the FlowVisor controller from local network/port lifecycle
//! events: every mutation persists local state first, then derives and
//! pushes the corresponding slice or flow-space operation. Controller
//! failures never abort a valid local mutation; they only degrade
//! synchronization freshness, and the next write to the same resource
//! reconciles by re-deriving the same remote objects.

pub mod error;
pub mod notify;
pub mod plugin;

pub use error::{Result, SyncError};
pub use notify::{AgentNotifier, BroadcastNotifier, PortUpdateEvent};
pub use plugin::{FlowvisorPlugin, ADMIN_CONTACT};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::error::{Result, SyncError};
    pub use super::notify::{AgentNotifier, BroadcastNotifier};
    pub use super::plugin::FlowvisorPlugin;
}

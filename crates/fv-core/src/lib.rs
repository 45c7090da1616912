//! fv-core: shared types for the FlowVisor synchronization engine
//!
//! Provides:
//! - Controller address codec (`host[:port]` <-> `ControllerAddress`)
//! - Topology models (networks, ports, subnets) and mutation payloads
//! - Edge validation for the `controller` network attribute
//! - Explicit configuration structs loaded from the environment

pub mod addr;
pub mod config;
pub mod error;
pub mod model;

pub use addr::{ControllerAddress, DEFAULT_OF_PORT};
pub use config::{FlowvisorConfig, StoreConfig};
pub use error::ValidationError;
pub use model::{
    Network, NetworkCreate, NetworkUpdate, Port, PortCreate, PortUpdate, Subnet, SubnetCreate,
    SubnetUpdate, AUTO_DELETE_PORT_OWNERS,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::addr::{ControllerAddress, DEFAULT_OF_PORT};
    pub use super::config::{FlowvisorConfig, StoreConfig};
    pub use super::error::ValidationError;
    pub use super::model::{
        Network, NetworkCreate, NetworkUpdate, Port, PortCreate, PortUpdate, Subnet, SubnetCreate,
        SubnetUpdate,
    };
}

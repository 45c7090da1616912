//! fv-store: SQLite-backed local topology store
//!
//! The local store is the authority for networks, ports and subnets; the
//! controller only ever sees objects derived from these rows. All row
//! operations take a `&mut SqliteConnection` so they compose into
//! whatever transaction the caller already holds.

pub mod ctrl_info;
pub mod error;
pub mod store;
pub mod topology;

pub use ctrl_info::{delete_ctrl_info, extend_network, get_ctrl_info, upsert_ctrl_info};
pub use error::{Result, StoreError};
pub use store::SqliteStore;

/// Prelude for convenient imports
pub mod prelude {
    pub use super::error::{Result, StoreError};
    pub use super::store::SqliteStore;
    pub use super::{ctrl_info, topology};
}

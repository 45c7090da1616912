//! The synchronization orchestrator
//!
//! `FlowvisorPlugin` is the single entry point for network/port/subnet
//! lifecycle events. For each mutation it persists local state inside a
//! transaction, keeps the controller-association row consistent with the
//! network's `controller` attribute, and pushes the derived slice or
//! flow-space operation to the controller.
//!
//! The local store is authoritative: a failed push is logged and left
//! for the next write to the same resource to reconcile, because every
//! remote object is re-derivable from the current local row.

use fv_client::{ControllerApi, FULL_PERM};
use fv_core::addr::validate_controller_address;
use fv_core::model::{
    self, Network, NetworkCreate, NetworkUpdate, Port, PortCreate, PortUpdate, Subnet,
    SubnetCreate, SubnetUpdate, AUTO_DELETE_PORT_OWNERS,
};
use fv_core::ControllerAddress;
use fv_store::{ctrl_info, topology, SqliteStore};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{Result, SyncError};
use crate::notify::AgentNotifier;

/// Administrative contact recorded on every slice.
pub const ADMIN_CONTACT: &str = "of@ofc";

/// Orchestrates local persistence and controller pushes.
pub struct FlowvisorPlugin {
    store: Arc<SqliteStore>,
    controller: Arc<dyn ControllerApi>,
    notifier: Arc<dyn AgentNotifier>,
}

impl FlowvisorPlugin {
    pub fn new(
        store: Arc<SqliteStore>,
        controller: Arc<dyn ControllerApi>,
        notifier: Arc<dyn AgentNotifier>,
    ) -> Self {
        Self {
            store,
            controller,
            notifier,
        }
    }

    /// Create a network, store its controller association and push the
    /// corresponding slice.
    pub async fn create_network(&self, create: NetworkCreate) -> Result<Network> {
        validate_controller_address(create.controller.as_deref())?;

        let mut network = Network {
            id: model::new_id(),
            name: create.name,
            admin_state_up: create.admin_state_up,
            controller: create.controller.filter(|c| !c.is_empty()),
        };

        let mut tx = self.store.begin().await?;
        topology::insert_network(&mut tx, &network).await?;

        if let Some(controller) = network.controller.as_deref().and_then(ControllerAddress::parse)
        {
            ctrl_info::upsert_ctrl_info(&mut tx, &network.id, &controller).await?;
        }

        ctrl_info::extend_network(&mut tx, &mut network).await?;
        self.add_or_update_slice(&network).await;
        tx.commit().await?;

        Ok(network)
    }

    /// Update a network. A newly declared controller replaces the stored
    /// association; an explicitly cleared attribute deletes it, mirroring
    /// network deletion.
    pub async fn update_network(&self, network_id: &str, update: NetworkUpdate) -> Result<Network> {
        if let Some(Some(text)) = update.controller_change() {
            validate_controller_address(Some(text))?;
        }

        let mut tx = self.store.begin().await?;
        let mut network = topology::update_network(&mut tx, network_id, &update).await?;

        match update.controller_change() {
            None => {}
            Some(Some(text)) => {
                if let Some(controller) = ControllerAddress::parse(text) {
                    ctrl_info::upsert_ctrl_info(&mut tx, network_id, &controller).await?;
                    network.controller = Some(text.to_string());
                }
            }
            Some(None) => {
                ctrl_info::delete_ctrl_info(&mut tx, network_id).await?;
            }
        }

        ctrl_info::extend_network(&mut tx, &mut network).await?;
        self.add_or_update_slice(&network).await;
        tx.commit().await?;

        Ok(network)
    }

    /// Delete a network and its slice.
    ///
    /// Refused while any port not owned by an auto-managed device
    /// category is still attached; a rejected deletion touches neither
    /// the local rows nor the controller.
    pub async fn delete_network(&self, network_id: &str) -> Result<()> {
        let mut tx = self.store.begin().await?;
        let mut network = topology::get_network(&mut tx, network_id).await?;
        ctrl_info::extend_network(&mut tx, &mut network).await?;

        let ports = topology::list_ports_by_network(&mut tx, network_id).await?;
        let only_auto_delete = ports
            .iter()
            .all(|port| AUTO_DELETE_PORT_OWNERS.contains(&port.device_owner.as_str()));
        if !only_auto_delete {
            return Err(SyncError::NetworkInUse {
                network_id: network_id.to_string(),
            });
        }

        let (slice_name, _, _) = slice_info(&network);
        ctrl_info::delete_ctrl_info(&mut tx, network_id).await?;
        topology::delete_network(&mut tx, network_id).await?;

        if self.controller.remove_slice(&slice_name).await.is_none() {
            warn!("Slice {} removal not acknowledged by controller", slice_name);
        }

        tx.commit().await?;
        Ok(())
    }

    /// Fetch a network with its controller attribute filled in.
    pub async fn get_network(&self, network_id: &str) -> Result<Network> {
        let mut tx = self.store.begin().await?;
        let mut network = topology::get_network(&mut tx, network_id).await?;
        ctrl_info::extend_network(&mut tx, &mut network).await?;
        tx.commit().await?;
        Ok(network)
    }

    /// List all networks with controller attributes filled in.
    pub async fn get_networks(&self) -> Result<Vec<Network>> {
        let mut tx = self.store.begin().await?;
        let mut networks = topology::list_networks(&mut tx).await?;
        for network in &mut networks {
            ctrl_info::extend_network(&mut tx, network).await?;
        }
        tx.commit().await?;
        Ok(networks)
    }

    /// Create a port and grant its network's slice full permission over
    /// traffic to and from its MAC.
    ///
    /// Two-phase bring-up: the port is committed administratively down,
    /// then flipped up in a second transaction. Any consumer reading
    /// between the commits sees the down state.
    pub async fn create_port(&self, create: PortCreate) -> Result<Port> {
        let port = self.reserve_port(create).await?;
        let port = self.activate_port(&port.id).await?;

        self.add_flow_space(&port, dst_flowspace(&port)).await;
        self.add_flow_space(&port, src_flowspace(&port)).await;

        Ok(port)
    }

    /// First bring-up phase: commit the port administratively down.
    async fn reserve_port(&self, create: PortCreate) -> Result<Port> {
        let mut tx = self.store.begin().await?;
        topology::get_network(&mut tx, &create.network_id).await?;

        let port = Port {
            id: model::new_id(),
            network_id: create.network_id,
            mac_address: create.mac_address.unwrap_or_else(model::generate_mac),
            admin_state_up: false,
            device_owner: create.device_owner,
            device_id: create.device_id,
        };
        topology::insert_port(&mut tx, &port).await?;
        tx.commit().await?;
        Ok(port)
    }

    /// Second bring-up phase: flip the committed port up.
    async fn activate_port(&self, port_id: &str) -> Result<Port> {
        let up = PortUpdate {
            admin_state_up: Some(true),
            ..Default::default()
        };
        let mut tx = self.store.begin().await?;
        let port = topology::update_port(&mut tx, port_id, &up).await?;
        tx.commit().await?;
        Ok(port)
    }

    /// Fetch a port.
    pub async fn get_port(&self, port_id: &str) -> Result<Port> {
        let mut tx = self.store.begin().await?;
        let port = topology::get_port(&mut tx, port_id).await?;
        tx.commit().await?;
        Ok(port)
    }

    /// List all ports.
    pub async fn get_ports(&self) -> Result<Vec<Port>> {
        let mut tx = self.store.begin().await?;
        let ports = topology::list_ports(&mut tx).await?;
        tx.commit().await?;
        Ok(ports)
    }

    /// Update a port, notifying agents when its administrative state
    /// actually changes value. No controller interaction.
    pub async fn update_port(&self, port_id: &str, update: PortUpdate) -> Result<Port> {
        let mut tx = self.store.begin().await?;
        let orig = topology::get_port(&mut tx, port_id).await?;
        let port = topology::update_port(&mut tx, port_id, &update).await?;
        tx.commit().await?;

        if orig.admin_state_up != port.admin_state_up {
            self.notifier.port_update(&port).await;
        }

        Ok(port)
    }

    /// Delete a port and both of its flow spaces.
    pub async fn delete_port(&self, port_id: &str) -> Result<()> {
        let mut tx = self.store.begin().await?;
        let port = topology::get_port(&mut tx, port_id).await?;
        topology::delete_port(&mut tx, port_id).await?;
        tx.commit().await?;

        self.remove_flow_space(dst_flowspace(&port).0).await;
        self.remove_flow_space(src_flowspace(&port).0).await;

        Ok(())
    }

    /// Create a subnet. Local state only.
    pub async fn create_subnet(&self, create: SubnetCreate) -> Result<Subnet> {
        let mut tx = self.store.begin().await?;
        topology::get_network(&mut tx, &create.network_id).await?;

        let subnet = Subnet {
            id: model::new_id(),
            network_id: create.network_id,
            cidr: create.cidr,
            gateway_ip: create.gateway_ip,
        };
        topology::insert_subnet(&mut tx, &subnet).await?;
        tx.commit().await?;
        Ok(subnet)
    }

    /// Fetch a subnet.
    pub async fn get_subnet(&self, subnet_id: &str) -> Result<Subnet> {
        let mut tx = self.store.begin().await?;
        let subnet = topology::get_subnet(&mut tx, subnet_id).await?;
        tx.commit().await?;
        Ok(subnet)
    }

    /// Update a subnet. Local state only.
    pub async fn update_subnet(&self, subnet_id: &str, update: SubnetUpdate) -> Result<Subnet> {
        let mut tx = self.store.begin().await?;
        let subnet = topology::update_subnet(&mut tx, subnet_id, &update).await?;
        tx.commit().await?;
        Ok(subnet)
    }

    /// Delete a subnet. Local state only.
    pub async fn delete_subnet(&self, subnet_id: &str) -> Result<()> {
        let mut tx = self.store.begin().await?;
        topology::delete_subnet(&mut tx, subnet_id).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Add or update the network's slice, decided by a live existence
    /// check. The controller is the sole authority on slice existence
    /// and offers no compare-and-swap, so the window between the read
    /// and the write is an accepted best-effort race.
    async fn add_or_update_slice(&self, network: &Network) {
        let (slice_name, controller, admin_contact) = slice_info(network);

        let existing = self.controller.get_slice(&slice_name).await;
        let result = if is_empty_result(&existing) {
            self.controller
                .add_slice(&slice_name, &controller, admin_contact)
                .await
        } else {
            self.controller
                .update_slice(&slice_name, &controller, admin_contact)
                .await
        };

        if result.is_none() {
            warn!("Slice {} push not acknowledged by controller", slice_name);
        } else {
            debug!("Slice {} synchronized to {}", slice_name, controller);
        }
    }

    async fn add_flow_space(&self, port: &Port, (name, flow_match): (String, Value)) {
        let grants = [(port.network_id.clone(), FULL_PERM)];
        if self
            .controller
            .add_flowspace(&name, &flow_match, &grants)
            .await
            .is_none()
        {
            warn!("Flow space {} add not acknowledged by controller", name);
        }
    }

    async fn remove_flow_space(&self, name: String) {
        // The name is derived, never looked up; if it was never created
        // remotely the controller's own remove no-ops or errors, and the
        // sentinel is a non-fatal outcome here.
        if self.controller.remove_flowspace(&name).await.is_none() {
            warn!("Flow space {} removal not acknowledged by controller", name);
        }
    }
}

/// Slice identity and controller endpoint for a network: the slice is
/// named by the network id, and a network without a declared controller
/// gets the pseudo-controller `(network_id, 0)` as a placeholder.
fn slice_info(network: &Network) -> (String, ControllerAddress, &'static str) {
    let controller = network
        .controller
        .as_deref()
        .and_then(ControllerAddress::parse)
        .unwrap_or_else(|| ControllerAddress::new(network.id.clone(), 0));
    (network.id.clone(), controller, ADMIN_CONTACT)
}

/// Flow space for the network -> external direction.
pub fn src_flowspace(port: &Port) -> (String, Value) {
    (
        format!("src{}", port.mac_address),
        json!({ "dl_src": port.mac_address }),
    )
}

/// Flow space for the external -> network direction.
pub fn dst_flowspace(port: &Port) -> (String, Value) {
    (
        format!("dst{}", port.mac_address),
        json!({ "dl_dst": port.mac_address }),
    )
}

/// Whether a controller response should be read as "nothing there":
/// the transport sentinel or an empty result payload.
fn is_empty_result(value: &Option<Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(fields)) => fields.is_empty(),
        Some(Value::String(text)) => text.is_empty(),
        Some(Value::Bool(b)) => !b,
        Some(Value::Number(_)) => false,
    }
}

//! Topology models
//!
//! Local representations of the resources the synchronization engine
//! touches. The local store is the authority for these; the controller
//! only ever sees objects derived from them.

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Device owners whose ports are auto-managed and therefore do not block
/// network deletion (e.g. the DHCP agent's internal port).
pub const AUTO_DELETE_PORT_OWNERS: &[&str] = &["network:dhcp"];

/// A local network. Its id doubles as the name of the controller-side
/// slice, so slice names are unique without a separate allocator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub id: String,
    pub name: String,
    pub admin_state_up: bool,
    /// Delegated controller address as entered by the user
    /// (`host` or `host:port`), absent when none was configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller: Option<String>,
}

/// Payload for creating a network. New networks come up administratively
/// enabled unless the caller says otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkCreate {
    pub name: String,
    #[serde(default = "default_true")]
    pub admin_state_up: bool,
    #[serde(default)]
    pub controller: Option<String>,
}

impl Default for NetworkCreate {
    fn default() -> Self {
        Self {
            name: String::new(),
            admin_state_up: true,
            controller: None,
        }
    }
}

/// Payload for updating a network.
///
/// `controller` is doubly optional: outer `None` leaves the attribute
/// untouched, `Some(None)` (or `Some("")`) explicitly clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub admin_state_up: Option<bool>,
    #[serde(default, with = "double_option", skip_serializing_if = "Option::is_none")]
    pub controller: Option<Option<String>>,
}

impl NetworkUpdate {
    /// The controller attribute as submitted, normalizing an empty string
    /// to an explicit clear.
    pub fn controller_change(&self) -> Option<Option<&str>> {
        match &self.controller {
            None => None,
            Some(None) => Some(None),
            Some(Some(s)) if s.is_empty() => Some(None),
            Some(Some(s)) => Some(Some(s.as_str())),
        }
    }
}

/// A port attached to a network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Port {
    pub id: String,
    pub network_id: String,
    pub mac_address: String,
    pub admin_state_up: bool,
    #[serde(default)]
    pub device_owner: String,
    #[serde(default)]
    pub device_id: String,
}

/// Payload for creating a port.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortCreate {
    pub network_id: String,
    /// Generated when absent.
    #[serde(default)]
    pub mac_address: Option<String>,
    #[serde(default)]
    pub device_owner: String,
    #[serde(default)]
    pub device_id: String,
}

/// Payload for updating a port.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortUpdate {
    #[serde(default)]
    pub admin_state_up: Option<bool>,
    #[serde(default)]
    pub device_owner: Option<String>,
    #[serde(default)]
    pub device_id: Option<String>,
}

/// A subnet. Pure local state; never pushed to the controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subnet {
    pub id: String,
    pub network_id: String,
    pub cidr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_ip: Option<String>,
}

/// Payload for creating a subnet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubnetCreate {
    pub network_id: String,
    pub cidr: String,
    #[serde(default)]
    pub gateway_ip: Option<String>,
}

/// Payload for updating a subnet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubnetUpdate {
    #[serde(default)]
    pub gateway_ip: Option<String>,
}

/// Generate a fresh resource id.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generate a random MAC address under the fa:16:3e locally-administered
/// prefix for ports created without one.
pub fn generate_mac() -> String {
    let mut rng = rand::thread_rng();
    format!(
        "fa:16:3e:{:02x}:{:02x}:{:02x}",
        rng.gen::<u8>(),
        rng.gen::<u8>(),
        rng.gen::<u8>()
    )
}

fn default_true() -> bool {
    true
}

/// Serde helper distinguishing "field absent" from "field set to null".
mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<T, S>(value: &Option<Option<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controller_change_untouched() {
        let update = NetworkUpdate::default();
        assert_eq!(update.controller_change(), None);
    }

    #[test]
    fn test_controller_change_set() {
        let update = NetworkUpdate {
            controller: Some(Some("1.2.3.4:6633".to_string())),
            ..Default::default()
        };
        assert_eq!(update.controller_change(), Some(Some("1.2.3.4:6633")));
    }

    #[test]
    fn test_controller_change_cleared() {
        for cleared in [Some(None), Some(Some(String::new()))] {
            let update = NetworkUpdate {
                controller: cleared,
                ..Default::default()
            };
            assert_eq!(update.controller_change(), Some(None));
        }
    }

    #[test]
    fn test_controller_change_from_json() {
        let update: NetworkUpdate = serde_json::from_str(r#"{"name": "net"}"#).unwrap();
        assert_eq!(update.controller_change(), None);

        let update: NetworkUpdate = serde_json::from_str(r#"{"controller": null}"#).unwrap();
        assert_eq!(update.controller_change(), Some(None));

        let update: NetworkUpdate =
            serde_json::from_str(r#"{"controller": "10.0.0.1"}"#).unwrap();
        assert_eq!(update.controller_change(), Some(Some("10.0.0.1")));
    }

    #[test]
    fn test_network_create_defaults_agree_with_json_defaults() {
        let built = NetworkCreate::default();
        let parsed: NetworkCreate = serde_json::from_str(r#"{"name": ""}"#).unwrap();
        assert!(built.admin_state_up);
        assert_eq!(built.admin_state_up, parsed.admin_state_up);
        assert_eq!(built.controller, parsed.controller);
    }

    #[test]
    fn test_generate_mac_shape() {
        let mac = generate_mac();
        assert!(mac.starts_with("fa:16:3e:"));
        assert_eq!(mac.split(':').count(), 6);
    }
}

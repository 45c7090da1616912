//! Agent notification fan-out
//!
//! Interested agents (DHCP, L3) learn about port administrative state
//! flips through a broadcast channel rather than a controller RPC.

use async_trait::async_trait;
use fv_core::model::Port;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

/// A port-update message fanned out to agents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortUpdateEvent {
    pub port: Port,
}

/// The notification seam the orchestrator publishes through.
#[async_trait]
pub trait AgentNotifier: Send + Sync {
    async fn port_update(&self, port: &Port);
}

/// Broadcast-channel notifier; agents subscribe for port updates.
pub struct BroadcastNotifier {
    sender: broadcast::Sender<PortUpdateEvent>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PortUpdateEvent> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl AgentNotifier for BroadcastNotifier {
    async fn port_update(&self, port: &Port) {
        let event = PortUpdateEvent { port: port.clone() };
        // A send error only means nobody is subscribed right now.
        if self.sender.send(event).is_err() {
            debug!("No agents subscribed for port update {}", port.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn port() -> Port {
        Port {
            id: "p1".to_string(),
            network_id: "n1".to_string(),
            mac_address: "aa:bb:cc:dd:ee:ff".to_string(),
            admin_state_up: true,
            device_owner: String::new(),
            device_id: String::new(),
        }
    }

    #[tokio::test]
    async fn test_subscribers_see_port_updates() {
        let notifier = BroadcastNotifier::new(8);
        let mut rx = notifier.subscribe();

        notifier.port_update(&port()).await;

        let event = rx.recv().await.unwrap();
        assert_eq!(event.port.id, "p1");
    }

    #[tokio::test]
    async fn test_send_without_subscribers_is_fine() {
        let notifier = BroadcastNotifier::new(8);
        notifier.port_update(&port()).await;
    }
}

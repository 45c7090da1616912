//! FlowVisor JSON-RPC client
//!
//! HTTP client for the FlowVisor admin API, written from the command set
//! of FlowVisor's fvctl. One POST endpoint, basic auth, JSON-RPC 2.0
//! envelopes.
//!
//! The client deliberately never surfaces an error: the local topology
//! store is the authority and controller pushes are best-effort, so every
//! failure is logged and collapsed into the `None` sentinel. Callers must
//! treat `None` as "operation did not take effect on the controller".

use async_trait::async_trait;
use fv_core::{ControllerAddress, FlowvisorConfig};
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error};

use crate::protocol::{describe, JsonRpcRequest, JsonRpcResponse};

/// Full slice permission on a flow space: read, write and delegate bits.
pub const FULL_PERM: u32 = 7;

const DEFAULT_DPID: &str = "all";
const DEFAULT_PRIORITY: i64 = 10;

/// The controller operations the synchronization orchestrator needs.
///
/// `FlowvisorClient` is the production implementation; tests drive the
/// orchestrator against recording fakes.
#[async_trait]
pub trait ControllerApi: Send + Sync {
    /// Look up a slice by name. The sentinel or an empty result means
    /// "no such slice".
    async fn get_slice(&self, slice_name: &str) -> Option<Value>;

    async fn add_slice(
        &self,
        slice_name: &str,
        controller: &ControllerAddress,
        admin_contact: &str,
    ) -> Option<Value>;

    async fn update_slice(
        &self,
        slice_name: &str,
        controller: &ControllerAddress,
        admin_contact: &str,
    ) -> Option<Value>;

    async fn remove_slice(&self, slice_name: &str) -> Option<Value>;

    async fn add_flowspace(
        &self,
        name: &str,
        flow_match: &Value,
        slice_permissions: &[(String, u32)],
    ) -> Option<Value>;

    async fn remove_flowspace(&self, name: &str) -> Option<Value>;
}

/// FlowVisor JSON-RPC client.
pub struct FlowvisorClient {
    client: reqwest::Client,
    url: String,
    username: String,
    password: String,
}

impl FlowvisorClient {
    /// Create a client from endpoint configuration.
    pub fn new(config: &FlowvisorConfig) -> Self {
        Self::with_config(&config.jrpc_url, &config.username, &config.password)
    }

    /// Create a client with explicit url and credentials.
    pub fn with_config(url: &str, username: &str, password: &str) -> Self {
        // FlowVisor ships with a self-signed certificate.
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        debug!("FlowVisor client for {} as {}", url, username);

        Self {
            client,
            url: url.to_string(),
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    /// Send a JSON-RPC command and return its result, or the `None`
    /// sentinel on any transport or protocol failure.
    pub async fn send(&self, method: &str, params: Option<Value>) -> Option<Value> {
        debug!("FlowVisor rpc {} -> {}", method, self.url);

        let request = JsonRpcRequest::new(method, params);
        let resp = match self
            .client
            .post(&self.url)
            .basic_auth(&self.username, Some(&self.password))
            .json(&request)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                error!("FlowVisor request failed: {}", e);
                return None;
            }
        };

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            error!("Authentication failed: invalid password");
            return None;
        }
        if status == StatusCode::GATEWAY_TIMEOUT {
            error!("HTTP Error 504: Gateway timeout");
            return None;
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!("FlowVisor HTTP error {}: {}", status, body);
            return None;
        }

        let envelope: JsonRpcResponse = match resp.json().await {
            Ok(envelope) => envelope,
            Err(e) => {
                error!("Undecodable FlowVisor response: {}", e);
                return None;
            }
        };

        if let Some(rpc_error) = envelope.error {
            error!("{} -> {}", describe(rpc_error.code), rpc_error.message);
            return None;
        }

        envelope.result
    }

    /// List all slices known to the controller.
    pub async fn list_slices(&self) -> Option<Value> {
        self.send("list-slices", None).await
    }

    /// Retrieve one slice's info by name.
    pub async fn get_slice(&self, slice_name: &str) -> Option<Value> {
        self.send("list-slice-info", Some(json!({ "slice-name": slice_name })))
            .await
    }

    /// Create a slice delegated to the given controller endpoint.
    pub async fn add_slice(
        &self,
        slice_name: &str,
        controller_host: &str,
        controller_port: u16,
        admin_contact: &str,
    ) -> Option<Value> {
        let params = self.add_slice_params(slice_name, controller_host, controller_port, admin_contact);
        self.send("add-slice", Some(params)).await
    }

    /// Update an existing slice's controller endpoint and policy.
    pub async fn update_slice(
        &self,
        slice_name: &str,
        controller_host: &str,
        controller_port: u16,
        admin_contact: &str,
    ) -> Option<Value> {
        let params =
            self.update_slice_params(slice_name, controller_host, controller_port, admin_contact);
        self.send("update-slice", Some(params)).await
    }

    /// Remove a slice by name.
    pub async fn remove_slice(&self, slice_name: &str) -> Option<Value> {
        self.send("remove-slice", Some(json!({ "slice-name": slice_name })))
            .await
    }

    /// List flow spaces, optionally restricted to one slice.
    pub async fn list_flowspaces(
        &self,
        slice_name: Option<&str>,
        show_disabled: Option<bool>,
    ) -> Option<Value> {
        let mut params = serde_json::Map::new();
        if let Some(slice_name) = slice_name {
            params.insert("slice-name".to_string(), json!(slice_name));
        }
        if let Some(show_disabled) = show_disabled {
            params.insert("show-disabled".to_string(), json!(show_disabled));
        }
        self.send("list-flowspace", Some(Value::Object(params))).await
    }

    /// Add a flow space granting the listed slices permission over
    /// packets matching `flow_match`.
    pub async fn add_flowspace(
        &self,
        name: &str,
        dpid: &str,
        flow_match: &Value,
        priority: i64,
        slice_permissions: &[(String, u32)],
    ) -> Option<Value> {
        let entry = flowspace_entry(name, dpid, flow_match, priority, slice_permissions);
        self.send("add-flowspace", Some(json!([entry]))).await
    }

    /// Update fields of an existing flow space.
    pub async fn update_flowspace(
        &self,
        name: &str,
        dpid: Option<&str>,
        flow_match: Option<&Value>,
        priority: Option<i64>,
        slice_permissions: Option<&[(String, u32)]>,
    ) -> Option<Value> {
        let params = update_flowspace_params(name, dpid, flow_match, priority, slice_permissions);
        self.send("update-flowspace", Some(params)).await
    }

    /// Remove a flow space by name.
    pub async fn remove_flowspace(&self, name: &str) -> Option<Value> {
        self.send("remove-flowspace", Some(json!([name]))).await
    }

    fn add_slice_params(
        &self,
        slice_name: &str,
        controller_host: &str,
        controller_port: u16,
        admin_contact: &str,
    ) -> Value {
        json!({
            "slice-name": slice_name,
            "controller-url": format!("tcp:{}:{}", controller_host, controller_port),
            "admin-contact": admin_contact,
            "password": self.password,
            "drop-policy": "exact",
            "recv-lldp": false,
            "rate-limit": -1,
            "flowmod-limit": -1,
            "admin-status": true,
        })
    }

    fn update_slice_params(
        &self,
        slice_name: &str,
        controller_host: &str,
        controller_port: u16,
        admin_contact: &str,
    ) -> Value {
        json!({
            "slice-name": slice_name,
            "controller-host": controller_host,
            "controller-port": controller_port,
            "admin-contact": admin_contact,
            "password": self.password,
            "drop-policy": "exact",
            "recv-lldp": false,
            "rate-limit": -1,
            "flowmod-limit": -1,
            "admin-status": true,
        })
    }
}

#[async_trait]
impl ControllerApi for FlowvisorClient {
    async fn get_slice(&self, slice_name: &str) -> Option<Value> {
        FlowvisorClient::get_slice(self, slice_name).await
    }

    async fn add_slice(
        &self,
        slice_name: &str,
        controller: &ControllerAddress,
        admin_contact: &str,
    ) -> Option<Value> {
        FlowvisorClient::add_slice(self, slice_name, &controller.host, controller.port, admin_contact)
            .await
    }

    async fn update_slice(
        &self,
        slice_name: &str,
        controller: &ControllerAddress,
        admin_contact: &str,
    ) -> Option<Value> {
        FlowvisorClient::update_slice(
            self,
            slice_name,
            &controller.host,
            controller.port,
            admin_contact,
        )
        .await
    }

    async fn remove_slice(&self, slice_name: &str) -> Option<Value> {
        FlowvisorClient::remove_slice(self, slice_name).await
    }

    async fn add_flowspace(
        &self,
        name: &str,
        flow_match: &Value,
        slice_permissions: &[(String, u32)],
    ) -> Option<Value> {
        FlowvisorClient::add_flowspace(
            self,
            name,
            DEFAULT_DPID,
            flow_match,
            DEFAULT_PRIORITY,
            slice_permissions,
        )
        .await
    }

    async fn remove_flowspace(&self, name: &str) -> Option<Value> {
        FlowvisorClient::remove_flowspace(self, name).await
    }
}

fn slice_action(slice_permissions: &[(String, u32)]) -> Value {
    Value::Array(
        slice_permissions
            .iter()
            .map(|(slice_name, permission)| {
                json!({
                    "slice-name": slice_name,
                    "permission": permission,
                })
            })
            .collect(),
    )
}

fn flowspace_entry(
    name: &str,
    dpid: &str,
    flow_match: &Value,
    priority: i64,
    slice_permissions: &[(String, u32)],
) -> Value {
    json!({
        "name": name,
        "dpid": dpid,
        "match": flow_match,
        "priority": priority,
        "slice-action": slice_action(slice_permissions),
    })
}

/// Build `update-flowspace` params: one entry carrying only the fields
/// being changed, wrapped in a single-element list like `add-flowspace`.
fn update_flowspace_params(
    name: &str,
    dpid: Option<&str>,
    flow_match: Option<&Value>,
    priority: Option<i64>,
    slice_permissions: Option<&[(String, u32)]>,
) -> Value {
    let mut entry = serde_json::Map::new();
    entry.insert("name".to_string(), json!(name));
    if let Some(dpid) = dpid {
        entry.insert("dpid".to_string(), json!(dpid));
    }
    if let Some(flow_match) = flow_match {
        entry.insert("match".to_string(), flow_match.clone());
    }
    if let Some(priority) = priority {
        entry.insert("priority".to_string(), json!(priority));
    }
    if let Some(slice_permissions) = slice_permissions {
        entry.insert("slice-action".to_string(), slice_action(slice_permissions));
    }
    json!([Value::Object(entry)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn test_client(url: &str) -> FlowvisorClient {
        FlowvisorClient::with_config(url, "fvadmin", "secret")
    }

    #[test]
    fn test_add_slice_params_shape() {
        let client = test_client("http://localhost:8081");
        let params = client.add_slice_params("net-1", "1.2.3.4", 6633, "of@ofc");
        assert_eq!(params["slice-name"], "net-1");
        assert_eq!(params["controller-url"], "tcp:1.2.3.4:6633");
        assert_eq!(params["admin-contact"], "of@ofc");
        assert_eq!(params["password"], "secret");
        assert_eq!(params["drop-policy"], "exact");
        assert_eq!(params["recv-lldp"], false);
        assert_eq!(params["rate-limit"], -1);
        assert_eq!(params["flowmod-limit"], -1);
        assert_eq!(params["admin-status"], true);
        assert!(params.get("controller-host").is_none());
    }

    #[test]
    fn test_update_slice_params_shape() {
        let client = test_client("http://localhost:8081");
        let params = client.update_slice_params("net-1", "1.2.3.4", 6633, "of@ofc");
        assert_eq!(params["controller-host"], "1.2.3.4");
        assert_eq!(params["controller-port"], 6633);
        assert!(params.get("controller-url").is_none());
    }

    #[test]
    fn test_flowspace_entry_shape() {
        let entry = flowspace_entry(
            "srcaa:bb:cc:dd:ee:ff",
            "all",
            &json!({"dl_src": "aa:bb:cc:dd:ee:ff"}),
            10,
            &[("net-1".to_string(), FULL_PERM)],
        );
        assert_eq!(entry["name"], "srcaa:bb:cc:dd:ee:ff");
        assert_eq!(entry["dpid"], "all");
        assert_eq!(entry["match"]["dl_src"], "aa:bb:cc:dd:ee:ff");
        assert_eq!(entry["priority"], 10);
        assert_eq!(entry["slice-action"][0]["slice-name"], "net-1");
        assert_eq!(entry["slice-action"][0]["permission"], 7);
    }

    #[test]
    fn test_update_flowspace_params_wrap_entry_in_list() {
        let params = update_flowspace_params(
            "dstaa:bb:cc:dd:ee:ff",
            None,
            Some(&json!({"dl_dst": "aa:bb:cc:dd:ee:ff"})),
            Some(20),
            None,
        );
        let entries = params.as_array().expect("params must be a list");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["name"], "dstaa:bb:cc:dd:ee:ff");
        assert_eq!(entries[0]["match"]["dl_dst"], "aa:bb:cc:dd:ee:ff");
        assert_eq!(entries[0]["priority"], 20);
        // Untouched fields stay absent so the controller keeps them.
        assert!(entries[0].get("dpid").is_none());
        assert!(entries[0].get("slice-action").is_none());
    }

    #[test]
    fn test_update_flowspace_params_full_entry() {
        let params = update_flowspace_params(
            "srcaa:bb:cc:dd:ee:ff",
            Some("all"),
            Some(&json!({"dl_src": "aa:bb:cc:dd:ee:ff"})),
            Some(10),
            Some(&[("net-1".to_string(), FULL_PERM)]),
        );
        let entries = params.as_array().unwrap();
        assert_eq!(entries[0]["dpid"], "all");
        assert_eq!(entries[0]["slice-action"][0]["slice-name"], "net-1");
        assert_eq!(entries[0]["slice-action"][0]["permission"], 7);
    }

    /// Serve exactly one canned HTTP response on a local socket and
    /// return the URL to reach it.
    async fn one_shot_server(status_line: &'static str, body: &'static str) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let mut read = 0;

            // Drain headers plus the declared body before answering.
            loop {
                let n = socket.read(&mut buf[read..]).await.unwrap_or(0);
                if n == 0 {
                    break;
                }
                read += n;
                let header_end = buf[..read].windows(4).position(|w| w == b"\r\n\r\n");
                if let Some(pos) = header_end {
                    let headers = String::from_utf8_lossy(&buf[..pos]).to_lowercase();
                    let content_length = headers
                        .lines()
                        .find_map(|l| l.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if read >= pos + 4 + content_length {
                        break;
                    }
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        });

        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_send_success_returns_result() {
        let url = one_shot_server(
            "200 OK",
            r#"{"jsonrpc":"2.0","result":[{"slice-name":"net-1"}],"id":"qclient"}"#,
        )
        .await;

        let result = test_client(&url).list_slices().await;
        assert_eq!(result.unwrap()[0]["slice-name"], "net-1");
    }

    #[tokio::test]
    async fn test_send_401_returns_sentinel() {
        let url = one_shot_server("401 Unauthorized", "").await;
        let result = test_client(&url).list_slices().await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_send_504_returns_sentinel() {
        let url = one_shot_server("504 Gateway Timeout", "").await;
        let result = test_client(&url).remove_slice("net-1").await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_send_rpc_error_returns_sentinel() {
        let url = one_shot_server(
            "200 OK",
            r#"{"jsonrpc":"2.0","error":{"code":-32601,"message":"no such method"},"id":"qclient"}"#,
        )
        .await;

        let result = test_client(&url).send("bogus-method", None).await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_send_unreachable_returns_sentinel() {
        // Bind then drop so the port is very likely closed.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let result = test_client(&url).list_slices().await;
        assert!(result.is_none());
    }
}

//! fv-cli: FlowVisor admin CLI
//!
//! Command-line front end for the FlowVisor JSON-RPC API, in the shape
//! of FlowVisor's own fvctl. Endpoint and credentials come from flags or
//! from `FV_JRPC_URL` / `FV_USERNAME` / `FV_PASSWORD`.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use fv_client::FlowvisorClient;
use fv_core::addr::validate_controller_address;
use fv_core::{ControllerAddress, FlowvisorConfig};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fv-cli")]
#[command(about = "Administer FlowVisor slices and flow spaces over JSON-RPC")]
struct Args {
    /// FlowVisor JSON-RPC URL (overrides FV_JRPC_URL)
    #[arg(long)]
    url: Option<String>,

    /// Admin username (overrides FV_USERNAME)
    #[arg(long)]
    username: Option<String>,

    /// Admin password (overrides FV_PASSWORD)
    #[arg(long)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List all slices
    ListSlices,
    /// Show one slice's info
    GetSlice { slice_name: String },
    /// Create a slice delegated to a controller (`host` or `host:port`)
    AddSlice {
        slice_name: String,
        controller: String,
        #[arg(long, default_value = "of@ofc")]
        admin_contact: String,
    },
    /// Update a slice's controller endpoint
    UpdateSlice {
        slice_name: String,
        controller: String,
        #[arg(long, default_value = "of@ofc")]
        admin_contact: String,
    },
    /// Remove a slice
    RemoveSlice { slice_name: String },
    /// List flow spaces, optionally for one slice
    ListFlowspace {
        #[arg(long)]
        slice_name: Option<String>,
        #[arg(long)]
        show_disabled: bool,
    },
    /// Add a flow space granting one slice permission over a match
    AddFlowspace {
        name: String,
        /// Match predicate as JSON, e.g. '{"dl_src":"aa:bb:cc:dd:ee:ff"}'
        flow_match: String,
        /// Slice to grant permission to
        #[arg(long)]
        slice_name: String,
        #[arg(long, default_value_t = 7)]
        permission: u32,
        #[arg(long, default_value = "all")]
        dpid: String,
        #[arg(long, default_value_t = 10)]
        priority: i64,
    },
    /// Update fields of an existing flow space; omitted flags are left
    /// untouched on the controller
    UpdateFlowspace {
        name: String,
        /// New match predicate as JSON
        #[arg(long)]
        flow_match: Option<String>,
        /// Slice to regrant permission to
        #[arg(long)]
        slice_name: Option<String>,
        #[arg(long, default_value_t = 7)]
        permission: u32,
        #[arg(long)]
        dpid: Option<String>,
        #[arg(long)]
        priority: Option<i64>,
    },
    /// Remove a flow space
    RemoveFlowspace { name: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = FlowvisorConfig::from_env();
    if let Some(url) = args.url {
        config.jrpc_url = url;
    }
    if let Some(username) = args.username {
        config.username = username;
    }
    if let Some(password) = args.password {
        config.password = password;
    }

    let client = FlowvisorClient::new(&config);

    let result = match args.command {
        Commands::ListSlices => client.list_slices().await,
        Commands::GetSlice { slice_name } => client.get_slice(&slice_name).await,
        Commands::AddSlice {
            slice_name,
            controller,
            admin_contact,
        } => {
            let controller = parse_controller(&controller)?;
            client
                .add_slice(&slice_name, &controller.host, controller.port, &admin_contact)
                .await
        }
        Commands::UpdateSlice {
            slice_name,
            controller,
            admin_contact,
        } => {
            let controller = parse_controller(&controller)?;
            client
                .update_slice(&slice_name, &controller.host, controller.port, &admin_contact)
                .await
        }
        Commands::RemoveSlice { slice_name } => client.remove_slice(&slice_name).await,
        Commands::ListFlowspace {
            slice_name,
            show_disabled,
        } => {
            client
                .list_flowspaces(slice_name.as_deref(), show_disabled.then_some(true))
                .await
        }
        Commands::AddFlowspace {
            name,
            flow_match,
            slice_name,
            permission,
            dpid,
            priority,
        } => {
            let flow_match: Value = serde_json::from_str(&flow_match)?;
            client
                .add_flowspace(
                    &name,
                    &dpid,
                    &flow_match,
                    priority,
                    &[(slice_name, permission)],
                )
                .await
        }
        Commands::UpdateFlowspace {
            name,
            flow_match,
            slice_name,
            permission,
            dpid,
            priority,
        } => {
            let flow_match = flow_match
                .as_deref()
                .map(serde_json::from_str::<Value>)
                .transpose()?;
            let grants = slice_name.map(|slice_name| vec![(slice_name, permission)]);
            client
                .update_flowspace(
                    &name,
                    dpid.as_deref(),
                    flow_match.as_ref(),
                    priority,
                    grants.as_deref(),
                )
                .await
        }
        Commands::RemoveFlowspace { name } => client.remove_flowspace(&name).await,
    };

    finish(result)
}

fn parse_controller(text: &str) -> Result<ControllerAddress> {
    validate_controller_address(Some(text))?;
    match ControllerAddress::parse(text) {
        Some(controller) => Ok(controller),
        None => bail!("invalid controller address: {}", text),
    }
}

fn finish(result: Option<Value>) -> Result<()> {
    match result {
        Some(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        None => bail!("controller request failed (see log output)"),
    }
}

//! Controller association store
//!
//! One row per network that has ever declared a controller, tying the
//! network id to the `(host, port)` it was configured with. This module
//! is the only writer of `network_controller_info`.

use crate::error::Result;
use fv_core::model::Network;
use fv_core::ControllerAddress;
use sqlx::{Row, SqliteConnection};
use tracing::debug;

/// Replace the association for a network.
///
/// Always delete-then-insert, never an in-place update, so the host and
/// port columns can never drift apart across partial writes.
pub async fn upsert_ctrl_info(
    conn: &mut SqliteConnection,
    network_id: &str,
    controller: &ControllerAddress,
) -> Result<()> {
    delete_ctrl_info(&mut *conn, network_id).await?;

    sqlx::query(
        "INSERT INTO network_controller_info (network_id, controller_host, controller_port) \
         VALUES (?, ?, ?)",
    )
    .bind(network_id)
    .bind(&controller.host)
    .bind(controller.port)
    .execute(&mut *conn)
    .await?;

    debug!("Stored controller {} for network {}", controller, network_id);
    Ok(())
}

/// Remove the association for a network. An absent row is not an error.
pub async fn delete_ctrl_info(conn: &mut SqliteConnection, network_id: &str) -> Result<()> {
    sqlx::query("DELETE FROM network_controller_info WHERE network_id = ?")
        .bind(network_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// The stored controller address for a network, if any.
pub async fn get_ctrl_info(
    conn: &mut SqliteConnection,
    network_id: &str,
) -> Result<Option<ControllerAddress>> {
    let row = sqlx::query(
        "SELECT controller_host, controller_port FROM network_controller_info \
         WHERE network_id = ?",
    )
    .bind(network_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(|row| ControllerAddress {
        host: row.get("controller_host"),
        port: row.get::<i64, _>("controller_port") as u16,
    }))
}

/// Fill a network's `controller` attribute from the stored association.
///
/// Leaves an already-present attribute alone, so repeated calls on the
/// same object are idempotent.
pub async fn extend_network(conn: &mut SqliteConnection, network: &mut Network) -> Result<()> {
    if network.controller.is_some() {
        return Ok(());
    }

    network.controller = get_ctrl_info(&mut *conn, &network.id)
        .await?
        .map(|controller| controller.to_string());
    Ok(())
}

//! Row operations for networks, ports and subnets
//!
//! Every function takes `&mut SqliteConnection` so callers decide the
//! transaction scope; nothing here opens its own unit of work.

use crate::error::{Result, StoreError};
use fv_core::model::{Network, NetworkUpdate, Port, PortUpdate, Subnet, SubnetUpdate};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use tracing::debug;

pub async fn insert_network(conn: &mut SqliteConnection, network: &Network) -> Result<()> {
    sqlx::query("INSERT INTO networks (id, name, admin_state_up) VALUES (?, ?, ?)")
        .bind(&network.id)
        .bind(&network.name)
        .bind(network.admin_state_up)
        .execute(&mut *conn)
        .await?;

    debug!("Inserted network {} ({})", network.id, network.name);
    Ok(())
}

pub async fn get_network(conn: &mut SqliteConnection, network_id: &str) -> Result<Network> {
    let row = sqlx::query("SELECT id, name, admin_state_up FROM networks WHERE id = ?")
        .bind(network_id)
        .fetch_optional(&mut *conn)
        .await?;

    row.map(|row| row_to_network(&row))
        .ok_or_else(|| StoreError::NotFound(format!("network {}", network_id)))
}

pub async fn list_networks(conn: &mut SqliteConnection) -> Result<Vec<Network>> {
    let rows = sqlx::query("SELECT id, name, admin_state_up FROM networks ORDER BY id")
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows.iter().map(row_to_network).collect())
}

/// Apply an update and return the new row.
pub async fn update_network(
    conn: &mut SqliteConnection,
    network_id: &str,
    update: &NetworkUpdate,
) -> Result<Network> {
    let mut network = get_network(&mut *conn, network_id).await?;

    if let Some(name) = &update.name {
        network.name = name.clone();
    }
    if let Some(admin_state_up) = update.admin_state_up {
        network.admin_state_up = admin_state_up;
    }

    sqlx::query("UPDATE networks SET name = ?, admin_state_up = ? WHERE id = ?")
        .bind(&network.name)
        .bind(network.admin_state_up)
        .bind(network_id)
        .execute(&mut *conn)
        .await?;

    Ok(network)
}

pub async fn delete_network(conn: &mut SqliteConnection, network_id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM networks WHERE id = ?")
        .bind(network_id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound(format!("network {}", network_id)));
    }

    debug!("Deleted network {}", network_id);
    Ok(())
}

pub async fn insert_port(conn: &mut SqliteConnection, port: &Port) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO ports (id, network_id, mac_address, admin_state_up, device_owner, device_id)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&port.id)
    .bind(&port.network_id)
    .bind(&port.mac_address)
    .bind(port.admin_state_up)
    .bind(&port.device_owner)
    .bind(&port.device_id)
    .execute(&mut *conn)
    .await?;

    debug!("Inserted port {} on network {}", port.id, port.network_id);
    Ok(())
}

pub async fn get_port(conn: &mut SqliteConnection, port_id: &str) -> Result<Port> {
    let row = sqlx::query(
        "SELECT id, network_id, mac_address, admin_state_up, device_owner, device_id \
         FROM ports WHERE id = ?",
    )
    .bind(port_id)
    .fetch_optional(&mut *conn)
    .await?;

    row.map(|row| row_to_port(&row))
        .ok_or_else(|| StoreError::NotFound(format!("port {}", port_id)))
}

pub async fn list_ports(conn: &mut SqliteConnection) -> Result<Vec<Port>> {
    let rows = sqlx::query(
        "SELECT id, network_id, mac_address, admin_state_up, device_owner, device_id \
         FROM ports ORDER BY id",
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.iter().map(row_to_port).collect())
}

pub async fn list_ports_by_network(
    conn: &mut SqliteConnection,
    network_id: &str,
) -> Result<Vec<Port>> {
    let rows = sqlx::query(
        "SELECT id, network_id, mac_address, admin_state_up, device_owner, device_id \
         FROM ports WHERE network_id = ? ORDER BY id",
    )
    .bind(network_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.iter().map(row_to_port).collect())
}

/// Apply an update and return the new row.
pub async fn update_port(
    conn: &mut SqliteConnection,
    port_id: &str,
    update: &PortUpdate,
) -> Result<Port> {
    let mut port = get_port(&mut *conn, port_id).await?;

    if let Some(admin_state_up) = update.admin_state_up {
        port.admin_state_up = admin_state_up;
    }
    if let Some(device_owner) = &update.device_owner {
        port.device_owner = device_owner.clone();
    }
    if let Some(device_id) = &update.device_id {
        port.device_id = device_id.clone();
    }

    sqlx::query(
        "UPDATE ports SET admin_state_up = ?, device_owner = ?, device_id = ? WHERE id = ?",
    )
    .bind(port.admin_state_up)
    .bind(&port.device_owner)
    .bind(&port.device_id)
    .bind(port_id)
    .execute(&mut *conn)
    .await?;

    Ok(port)
}

pub async fn delete_port(conn: &mut SqliteConnection, port_id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM ports WHERE id = ?")
        .bind(port_id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound(format!("port {}", port_id)));
    }

    debug!("Deleted port {}", port_id);
    Ok(())
}

pub async fn insert_subnet(conn: &mut SqliteConnection, subnet: &Subnet) -> Result<()> {
    sqlx::query("INSERT INTO subnets (id, network_id, cidr, gateway_ip) VALUES (?, ?, ?, ?)")
        .bind(&subnet.id)
        .bind(&subnet.network_id)
        .bind(&subnet.cidr)
        .bind(&subnet.gateway_ip)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

pub async fn get_subnet(conn: &mut SqliteConnection, subnet_id: &str) -> Result<Subnet> {
    let row = sqlx::query("SELECT id, network_id, cidr, gateway_ip FROM subnets WHERE id = ?")
        .bind(subnet_id)
        .fetch_optional(&mut *conn)
        .await?;

    row.map(|row| row_to_subnet(&row))
        .ok_or_else(|| StoreError::NotFound(format!("subnet {}", subnet_id)))
}

pub async fn list_subnets_by_network(
    conn: &mut SqliteConnection,
    network_id: &str,
) -> Result<Vec<Subnet>> {
    let rows = sqlx::query(
        "SELECT id, network_id, cidr, gateway_ip FROM subnets WHERE network_id = ? ORDER BY id",
    )
    .bind(network_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.iter().map(row_to_subnet).collect())
}

/// Apply an update and return the new row.
pub async fn update_subnet(
    conn: &mut SqliteConnection,
    subnet_id: &str,
    update: &SubnetUpdate,
) -> Result<Subnet> {
    let mut subnet = get_subnet(&mut *conn, subnet_id).await?;

    if let Some(gateway_ip) = &update.gateway_ip {
        subnet.gateway_ip = Some(gateway_ip.clone());
    }

    sqlx::query("UPDATE subnets SET gateway_ip = ? WHERE id = ?")
        .bind(&subnet.gateway_ip)
        .bind(subnet_id)
        .execute(&mut *conn)
        .await?;

    Ok(subnet)
}

pub async fn delete_subnet(conn: &mut SqliteConnection, subnet_id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM subnets WHERE id = ?")
        .bind(subnet_id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound(format!("subnet {}", subnet_id)));
    }

    Ok(())
}

fn row_to_network(row: &SqliteRow) -> Network {
    Network {
        id: row.get("id"),
        name: row.get("name"),
        admin_state_up: row.get("admin_state_up"),
        controller: None,
    }
}

fn row_to_port(row: &SqliteRow) -> Port {
    Port {
        id: row.get("id"),
        network_id: row.get("network_id"),
        mac_address: row.get("mac_address"),
        admin_state_up: row.get("admin_state_up"),
        device_owner: row.get("device_owner"),
        device_id: row.get("device_id"),
    }
}

fn row_to_subnet(row: &SqliteRow) -> Subnet {
    Subnet {
        id: row.get("id"),
        network_id: row.get("network_id"),
        cidr: row.get("cidr"),
        gateway_ip: row.get("gateway_ip"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;

    fn network(id: &str) -> Network {
        Network {
            id: id.to_string(),
            name: format!("net-{}", id),
            admin_state_up: true,
            controller: None,
        }
    }

    fn port(id: &str, network_id: &str, owner: &str) -> Port {
        Port {
            id: id.to_string(),
            network_id: network_id.to_string(),
            mac_address: "aa:bb:cc:dd:ee:ff".to_string(),
            admin_state_up: true,
            device_owner: owner.to_string(),
            device_id: String::new(),
        }
    }

    #[tokio::test]
    async fn test_network_crud() {
        let store = SqliteStore::in_memory().await.unwrap();
        let mut tx = store.begin().await.unwrap();

        insert_network(&mut tx, &network("n1")).await.unwrap();
        let fetched = get_network(&mut tx, "n1").await.unwrap();
        assert_eq!(fetched.name, "net-n1");
        assert!(fetched.admin_state_up);

        let update = NetworkUpdate {
            name: Some("renamed".to_string()),
            admin_state_up: Some(false),
            ..Default::default()
        };
        let updated = update_network(&mut tx, "n1", &update).await.unwrap();
        assert_eq!(updated.name, "renamed");
        assert!(!updated.admin_state_up);

        delete_network(&mut tx, "n1").await.unwrap();
        assert!(matches!(
            get_network(&mut tx, "n1").await,
            Err(StoreError::NotFound(_))
        ));
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_missing_network_is_not_found() {
        let store = SqliteStore::in_memory().await.unwrap();
        let mut tx = store.begin().await.unwrap();
        assert!(matches!(
            delete_network(&mut tx, "ghost").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_ports_scoped_by_network() {
        let store = SqliteStore::in_memory().await.unwrap();
        let mut tx = store.begin().await.unwrap();

        insert_network(&mut tx, &network("n1")).await.unwrap();
        insert_network(&mut tx, &network("n2")).await.unwrap();
        insert_port(&mut tx, &port("p1", "n1", "network:dhcp")).await.unwrap();
        insert_port(&mut tx, &port("p2", "n1", "compute:nova")).await.unwrap();
        insert_port(&mut tx, &port("p3", "n2", "")).await.unwrap();

        let ports = list_ports_by_network(&mut tx, "n1").await.unwrap();
        assert_eq!(ports.len(), 2);
        assert_eq!(ports[0].device_owner, "network:dhcp");

        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_deleting_network_cascades_ports() {
        let store = SqliteStore::in_memory().await.unwrap();
        let mut tx = store.begin().await.unwrap();

        insert_network(&mut tx, &network("n1")).await.unwrap();
        insert_port(&mut tx, &port("p1", "n1", "")).await.unwrap();
        delete_network(&mut tx, "n1").await.unwrap();

        assert!(matches!(
            get_port(&mut tx, "p1").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_subnet_crud() {
        let store = SqliteStore::in_memory().await.unwrap();
        let mut tx = store.begin().await.unwrap();

        insert_network(&mut tx, &network("n1")).await.unwrap();
        let subnet = Subnet {
            id: "s1".to_string(),
            network_id: "n1".to_string(),
            cidr: "10.0.0.0/24".to_string(),
            gateway_ip: None,
        };
        insert_subnet(&mut tx, &subnet).await.unwrap();

        let update = SubnetUpdate {
            gateway_ip: Some("10.0.0.1".to_string()),
        };
        let updated = update_subnet(&mut tx, "s1", &update).await.unwrap();
        assert_eq!(updated.gateway_ip.as_deref(), Some("10.0.0.1"));

        assert_eq!(list_subnets_by_network(&mut tx, "n1").await.unwrap().len(), 1);
        delete_subnet(&mut tx, "s1").await.unwrap();
    }
}

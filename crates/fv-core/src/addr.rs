//! Controller address codec
//!
//! Networks carry an optional `controller` attribute written by users as
//! `host` or `host:port`. This module converts between that textual form
//! and the `(host, port)` pair stored and pushed to the controller.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// The default OpenFlow controller port, used when the user supplies a
/// bare host with no `:port` suffix.
pub const DEFAULT_OF_PORT: u16 = 6666;

/// A delegated OpenFlow controller endpoint for one network's slice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerAddress {
    pub host: String,
    pub port: u16,
}

impl ControllerAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Parse a user-supplied controller address.
    ///
    /// Empty input yields `None`. A bare host implies [`DEFAULT_OF_PORT`].
    /// A malformed port also yields `None`; callers reject that case up
    /// front via [`validate_controller_address`].
    pub fn parse(text: &str) -> Option<Self> {
        if text.is_empty() {
            return None;
        }

        match text.split_once(':') {
            None => Some(Self::new(text, DEFAULT_OF_PORT)),
            Some((host, port)) => {
                let port = port.parse().ok()?;
                Some(Self::new(host, port))
            }
        }
    }

    /// Canonical textual form, `host:port`.
    pub fn to_url(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ControllerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Validate a `controller` attribute value at the API edge, before any
/// persistence or transport happens.
///
/// Absent or empty input is valid (the attribute is optional). Otherwise
/// the host must be an IP address and the port a non-negative integer
/// that fits a u16.
pub fn validate_controller_address(text: Option<&str>) -> Result<(), ValidationError> {
    let text = match text {
        None | Some("") => return Ok(()),
        Some(t) => t,
    };

    let (host, port) = match text.split_once(':') {
        None => (text, None),
        Some((host, port)) => (host, Some(port)),
    };

    if host.parse::<IpAddr>().is_err() {
        return Err(ValidationError::InvalidHost(host.to_string()));
    }

    if let Some(port) = port {
        if port.parse::<u16>().is_err() {
            return Err(ValidationError::InvalidPort(port.to_string()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_host_gets_default_port() {
        let addr = ControllerAddress::parse("10.0.0.1").unwrap();
        assert_eq!(addr.host, "10.0.0.1");
        assert_eq!(addr.port, DEFAULT_OF_PORT);
    }

    #[test]
    fn test_parse_explicit_port() {
        let addr = ControllerAddress::parse("1.2.3.4:6633").unwrap();
        assert_eq!(addr, ControllerAddress::new("1.2.3.4", 6633));
    }

    #[test]
    fn test_parse_empty_is_none() {
        assert!(ControllerAddress::parse("").is_none());
    }

    #[test]
    fn test_parse_bad_port_is_none() {
        assert!(ControllerAddress::parse("1.2.3.4:of").is_none());
    }

    #[test]
    fn test_round_trip() {
        for text in ["1.2.3.4:6633", "192.168.0.10:6666", "10.1.1.1:0"] {
            let addr = ControllerAddress::parse(text).unwrap();
            assert_eq!(addr.to_string(), text);
        }
    }

    #[test]
    fn test_validate_accepts_absent_and_empty() {
        assert!(validate_controller_address(None).is_ok());
        assert!(validate_controller_address(Some("")).is_ok());
    }

    #[test]
    fn test_validate_accepts_ip_forms() {
        assert!(validate_controller_address(Some("10.0.0.1")).is_ok());
        assert!(validate_controller_address(Some("10.0.0.1:6633")).is_ok());
        assert!(validate_controller_address(Some("::1:6633")).is_err());
    }

    #[test]
    fn test_validate_rejects_hostname_and_bad_port() {
        assert!(matches!(
            validate_controller_address(Some("controller.local:6633")),
            Err(ValidationError::InvalidHost(_))
        ));
        assert!(matches!(
            validate_controller_address(Some("10.0.0.1:-1")),
            Err(ValidationError::InvalidPort(_))
        ));
        assert!(matches!(
            validate_controller_address(Some("10.0.0.1:99999")),
            Err(ValidationError::InvalidPort(_))
        ));
    }
}

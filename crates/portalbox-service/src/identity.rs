//! Equipment identity discovery.
//!
//! A box does not know which equipment it controls. It reads its MAC
//! address and asks the backend for the profile registered under it.

use std::path::Path;

use portalbox_backend::MacAddress;
use tracing::debug;

use crate::config::IdentitySettings;
use crate::error::{Result, ServiceError};

const LOOPBACK: &str = "lo";
const NULL_MAC: &str = "000000000000";

/// MAC address of the first non-loopback interface, in name order.
///
/// `net_class_dir` is laid out like `/sys/class/net`: one directory per
/// interface, each with an `address` file.
///
/// # Errors
///
/// Returns [`ServiceError::Identity`] if the directory cannot be listed or
/// no interface has a usable address.
pub fn host_mac_address(net_class_dir: &Path) -> Result<MacAddress> {
    let entries = std::fs::read_dir(net_class_dir)
        .map_err(|e| ServiceError::identity(format!("cannot list {}: {}", net_class_dir.display(), e)))?;

    let mut interfaces: Vec<_> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name != LOOPBACK)
        .collect();
    interfaces.sort();

    for name in interfaces {
        let Ok(text) = std::fs::read_to_string(net_class_dir.join(&name).join("address")) else {
            debug!("Interface {} has no readable address", name);
            continue;
        };
        match text.trim().parse::<MacAddress>() {
            Ok(mac) if mac.as_str() != NULL_MAC => {
                debug!("Using MAC address {} of interface {}", mac, name);
                return Ok(mac);
            }
            Ok(_) => debug!("Interface {} has a null MAC address", name),
            Err(e) => debug!("Interface {}: {}", name, e),
        }
    }

    Err(ServiceError::identity(format!(
        "no network interface with a MAC address in {}",
        net_class_dir.display()
    )))
}

/// The configured MAC address, or the host's.
///
/// # Errors
///
/// See [`host_mac_address`].
pub fn mac_address(settings: &IdentitySettings) -> Result<MacAddress> {
    match &settings.mac_address {
        Some(mac) => Ok(mac.clone()),
        None => host_mac_address(&settings.net_class_dir),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn interface(root: &Path, name: &str, address: &str) {
        let dir = root.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("address"), format!("{address}\n")).unwrap();
    }

    #[test]
    fn test_skips_loopback_and_null_addresses() {
        let root = tempfile::tempdir().unwrap();
        interface(root.path(), "lo", "00:00:00:00:00:00");
        interface(root.path(), "dummy0", "00:00:00:00:00:00");
        interface(root.path(), "wlan0", "B8:27:EB:12:34:56");

        let mac = host_mac_address(root.path()).unwrap();
        assert_eq!(mac.as_str(), "b827eb123456");
    }

    #[test]
    fn test_first_interface_in_name_order() {
        let root = tempfile::tempdir().unwrap();
        interface(root.path(), "wlan0", "b8:27:eb:00:00:02");
        interface(root.path(), "eth0", "b8:27:eb:00:00:01");

        assert_eq!(host_mac_address(root.path()).unwrap().as_str(), "b827eb000001");
    }

    #[test]
    fn test_no_interfaces() {
        let root = tempfile::tempdir().unwrap();
        interface(root.path(), "lo", "00:00:00:00:00:00");
        assert!(matches!(
            host_mac_address(root.path()),
            Err(ServiceError::Identity { .. })
        ));
    }

    #[test]
    fn test_configured_address_wins() {
        let settings = IdentitySettings {
            mac_address: Some("b8:27:eb:aa:bb:cc".parse().unwrap()),
            net_class_dir: PathBuf::from("/nonexistent"),
        };
        assert_eq!(mac_address(&settings).unwrap().as_str(), "b827ebaabbcc");
    }
}

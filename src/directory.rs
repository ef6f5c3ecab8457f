//! Hostname → device id resolution.
//!
//! Snapshot retrieval needs the controller's device id, but callers only know
//! hostnames. [`DeviceDirectory`] is rebuilt from a full inventory fetch each
//! time it is needed, so it never goes stale and needs no locking.

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, warn};

use crate::client::CatalystClient;
use crate::normalize::unwrap_envelope;

/// Snapshot of the controller's hostname → device id mapping.
#[derive(Debug, Default)]
pub struct DeviceDirectory {
    ids: HashMap<String, String>,
}

impl DeviceDirectory {
    /// Fetch the inventory and index it.
    ///
    /// A failed or malformed fetch yields an empty directory; callers see the
    /// same "not found" as for an absent hostname.
    pub async fn build(client: &CatalystClient) -> Self {
        let payload = match client.device_list().await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "inventory fetch failed, device directory is empty");
                return Self::default();
            }
        };
        match unwrap_envelope(payload) {
            Some(devices) => {
                let directory = Self::from_inventory(&devices);
                debug!(devices = directory.len(), "device directory built");
                directory
            }
            None => {
                warn!("inventory response has no device list, device directory is empty");
                Self::default()
            }
        }
    }

    /// Index raw inventory entries. Entries without a hostname or id are
    /// skipped; on duplicate hostnames the later entry wins.
    pub fn from_inventory(devices: &[Value]) -> Self {
        let mut ids = HashMap::new();
        for device in devices {
            let (Some(hostname), Some(id)) = (
                device.get("hostname").and_then(Value::as_str),
                device.get("id").and_then(Value::as_str),
            ) else {
                continue;
            };
            if let Some(previous) = ids.insert(hostname.to_string(), id.to_string()) {
                warn!(
                    hostname,
                    previous = %previous,
                    id,
                    "duplicate hostname in inventory, keeping last"
                );
            }
        }
        Self { ids }
    }

    /// Device id for `hostname`, if known.
    pub fn lookup(&self, hostname: &str) -> Option<&str> {
        self.ids.get(hostname).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

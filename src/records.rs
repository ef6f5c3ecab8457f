//! Flat, JSON-safe records returned by the tools.
//!
//! Each record is rebuilt from raw controller JSON on every query; every
//! field except the key goes through [`normalize`](crate::normalize) so the
//! only shapes that reach the tool host are strings and nulls.

use serde::Serialize;
use serde_json::Value;

use crate::normalize::{field, field_or};

/// One row of the device inventory.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    pub hostname: String,
    pub management_ip: Option<String>,
    pub family: Option<String>,
    pub platform: Option<String>,
    pub software_version: Option<String>,
    pub serial_number: Option<String>,
    pub uptime: Option<String>,
    pub last_updated: Option<String>,
}

impl DeviceRecord {
    /// Build from a `network-device` entry. Devices that never reported a
    /// hostname are keyed by their management IP.
    pub fn from_controller(raw: &Value) -> Self {
        Self {
            hostname: field_or(raw, &["hostname", "managementIpAddress"]).unwrap_or_default(),
            management_ip: field(raw, "managementIpAddress"),
            family: field(raw, "family"),
            platform: field(raw, "platformId"),
            software_version: field(raw, "softwareVersion"),
            serial_number: field(raw, "serialNumber"),
            uptime: field(raw, "upTime"),
            last_updated: field(raw, "lastUpdated"),
        }
    }
}

/// Compliance state of one device.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceRecord {
    pub hostname: Option<String>,
    pub status: Option<String>,
    /// Kept as a string so large counts survive the tool boundary unchanged.
    pub failed_rule_count: Option<String>,
}

impl ComplianceRecord {
    pub fn from_controller(raw: &Value) -> Self {
        Self {
            hostname: field(raw, "deviceName"),
            status: field(raw, "complianceStatus"),
            failed_rule_count: field(raw, "nonCompliantRuleCount"),
        }
    }
}

/// One overall client-health sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientHealthSample {
    pub score: Option<String>,
    pub category: Option<String>,
    pub total_count: Option<String>,
    pub healthy_count: Option<String>,
    pub unhealthy_count: Option<String>,
    pub timestamp: Option<String>,
}

impl ClientHealthSample {
    pub fn from_controller(raw: &Value) -> Self {
        // Older releases nest the category as {"scoreCategory": {"value": ..}}
        let category = field(raw, "category").or_else(|| {
            raw.get("scoreCategory")
                .and_then(|c| field(c, "value"))
        });
        Self {
            score: field(raw, "score"),
            category,
            total_count: field(raw, "totalCount"),
            healthy_count: field(raw, "healthyCount"),
            unhealthy_count: field_or(raw, &["unHealthyCount", "unhealthyCount"]),
            timestamp: field(raw, "timestamp"),
        }
    }
}

/// An SDA fabric site.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FabricSite {
    pub id: Option<String>,
    pub name: Option<String>,
}

impl FabricSite {
    pub fn from_controller(raw: &Value) -> Self {
        Self {
            id: field(raw, "id"),
            name: field_or(raw, &["siteNameHierarchy", "fabricName"]),
        }
    }
}

/// Line-level change summary between two configuration snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftSummary {
    pub added_lines: usize,
    pub removed_lines: usize,
    pub sample_text: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn device_record_coerces_every_field() {
        let raw = json!({
            "hostname": "edge-1.lab",
            "managementIpAddress": "10.10.20.81",
            "family": "Switches and Hubs",
            "platformId": "C9300-24U",
            "softwareVersion": "17.9.4a",
            "serialNumber": "FCW2214L0VK",
            "upTime": 1234567.89,
            "lastUpdated": 1_700_000_000_000_u64,
            "id": "uuid-1"
        });
        let rec = DeviceRecord::from_controller(&raw);
        assert_eq!(rec.hostname, "edge-1.lab");
        assert_eq!(rec.platform.as_deref(), Some("C9300-24U"));
        assert_eq!(rec.uptime.as_deref(), Some("1234567.89"));
        assert_eq!(rec.last_updated.as_deref(), Some("1700000000000"));
    }

    #[test]
    fn device_without_hostname_uses_management_ip() {
        let rec = DeviceRecord::from_controller(&json!({"managementIpAddress": "10.0.0.9"}));
        assert_eq!(rec.hostname, "10.0.0.9");
        assert_eq!(rec.family, None);
    }

    #[test]
    fn device_record_serializes_camel_case_with_nulls() {
        let rec = DeviceRecord::from_controller(&json!({"hostname": "sw1"}));
        let v = serde_json::to_value(&rec).unwrap();
        assert_eq!(v["hostname"], "sw1");
        assert!(v["managementIp"].is_null());
        assert!(v["softwareVersion"].is_null());
        assert!(v.get("software_version").is_none());
    }

    #[test]
    fn compliance_count_is_string() {
        let rec = ComplianceRecord::from_controller(&json!({
            "deviceName": "sw1",
            "complianceStatus": "NON_COMPLIANT",
            "nonCompliantRuleCount": 3
        }));
        assert_eq!(rec.failed_rule_count.as_deref(), Some("3"));
        let v = serde_json::to_value(&rec).unwrap();
        assert_eq!(v["failedRuleCount"], "3");
    }

    #[test]
    fn client_health_reads_nested_category() {
        let rec = ClientHealthSample::from_controller(&json!({
            "score": 87,
            "scoreCategory": {"scoreCategory": "CLIENT_TYPE", "value": "WIRED"},
            "unHealthyCount": 2
        }));
        assert_eq!(rec.category.as_deref(), Some("WIRED"));
        assert_eq!(rec.unhealthy_count.as_deref(), Some("2"));
        assert_eq!(rec.score.as_deref(), Some("87"));
    }

    #[test]
    fn fabric_site_name_fallback() {
        let a = FabricSite::from_controller(&json!({"id": "f1", "siteNameHierarchy": "Global/SJC"}));
        let b = FabricSite::from_controller(&json!({"fabricName": "Default LAN Fabric"}));
        assert_eq!(a.name.as_deref(), Some("Global/SJC"));
        assert_eq!(b.name.as_deref(), Some("Default LAN Fabric"));
        assert_eq!(b.id, None);
    }
}

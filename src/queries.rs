//! Query layer between the tools and the controller.
//!
//! [`NetworkQueries`] owns the [`CatalystClient`] for the life of the process
//! and exposes one method per tool. Every method unwraps the controller
//! envelope, normalizes records, and reports absence or failure as a
//! [`QueryError`]; the tools layer turns those into `{"message": ...}`
//! results so nothing faults across the tool boundary.
//!
//! Calls are strictly sequential: the drift query fetches the inventory, then
//! the current config, then the historical one.

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::client::{CatalystClient, ClientError};
use crate::directory::DeviceDirectory;
use crate::drift::{diff_configs, snapshot_timestamp_ms};
use crate::normalize::{unwrap_envelope, unwrap_text};
use crate::records::{ClientHealthSample, ComplianceRecord, DeviceRecord, DriftSummary, FabricSite};

/// Client-health sampling interval on the controller.
const HEALTH_BUCKET_MS: i64 = 300_000;

/// Why a query produced no records.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The requested device or snapshot does not exist.
    #[error("{0}")]
    NotFound(String),
    /// The controller answered but had nothing to report.
    #[error("{0}")]
    EmptyData(String),
    /// The controller call failed.
    #[error("Catalyst Center request failed: {0}")]
    Upstream(#[from] ClientError),
    /// The controller answered with an unexpected shape.
    #[error("Catalyst Center returned malformed data: {0}")]
    Malformed(String),
}

impl QueryError {
    /// Whether this is a controller-side failure rather than an absence.
    pub fn is_upstream(&self) -> bool {
        matches!(self, QueryError::Upstream(_) | QueryError::Malformed(_))
    }
}

/// Tool-facing queries over a single controller.
pub struct NetworkQueries {
    client: CatalystClient,
}

impl NetworkQueries {
    pub fn new(client: CatalystClient) -> Self {
        Self { client }
    }

    /// Full device inventory.
    pub async fn inventory(&self) -> Result<Vec<DeviceRecord>, QueryError> {
        let devices = records(self.client.device_list().await?, "device list")?;
        if devices.is_empty() {
            return Err(QueryError::EmptyData(
                "Catalyst Center returned no devices.".into(),
            ));
        }
        Ok(devices.iter().map(DeviceRecord::from_controller).collect())
    }

    /// Compliance for all devices, or only `hostname`.
    pub async fn compliance_summary(
        &self,
        hostname: Option<&str>,
    ) -> Result<Vec<ComplianceRecord>, QueryError> {
        let items = records(self.client.device_compliance().await?, "compliance")?;
        if items.is_empty() {
            return Err(QueryError::EmptyData(
                "Catalyst Center returned no compliance data.".into(),
            ));
        }

        let rows = items.iter().map(ComplianceRecord::from_controller);
        let Some(hostname) = hostname else {
            return Ok(rows.collect());
        };
        let matched: Vec<ComplianceRecord> = rows
            .filter(|row| row.hostname.as_deref() == Some(hostname))
            .collect();
        if matched.is_empty() {
            return Err(QueryError::NotFound(format!(
                "No compliance data for '{}'.",
                hostname
            )));
        }
        Ok(matched)
    }

    /// Overall client health at `now_ms`, falling back to the enclosing
    /// five-minute bucket when the live query has no samples yet.
    pub async fn client_health(&self, now_ms: i64) -> Result<Vec<ClientHealthSample>, QueryError> {
        let mut samples = records(self.client.client_health(now_ms).await?, "client health")?;
        if samples.is_empty() {
            let bucket = now_ms.div_euclid(HEALTH_BUCKET_MS) * HEALTH_BUCKET_MS;
            debug!(bucket, "no live client-health samples, trying previous bucket");
            samples = records(self.client.client_health(bucket).await?, "client health")?;
        }

        if samples.iter().all(|s| s.get("score").map_or(true, Value::is_null)) {
            return Err(QueryError::EmptyData(
                "No client-health samples in the last 5 minutes.".into(),
            ));
        }
        Ok(samples.iter().map(ClientHealthSample::from_controller).collect())
    }

    /// SDA fabric sites.
    pub async fn sda_fabrics(&self) -> Result<Vec<FabricSite>, QueryError> {
        let sites = records(self.client.fabric_sites().await?, "fabric sites")?;
        if sites.is_empty() {
            return Err(QueryError::EmptyData("No SDA fabric configured.".into()));
        }
        Ok(sites.iter().map(FabricSite::from_controller).collect())
    }

    /// Diff the current configuration of `hostname` against its snapshot
    /// from `hours_back` hours before `now_ms`.
    pub async fn config_drift(
        &self,
        hostname: &str,
        hours_back: u32,
        now_ms: i64,
    ) -> Result<DriftSummary, QueryError> {
        let directory = DeviceDirectory::build(&self.client).await;
        if directory.is_empty() {
            debug!(hostname, "device directory is empty");
        }
        let device_id = directory
            .lookup(hostname)
            .ok_or_else(|| QueryError::NotFound(format!("Device '{}' not found.", hostname)))?;

        let current = self
            .client
            .device_config(device_id, None)
            .await
            .map_err(|e| {
                snapshot_error(e, || {
                    format!("Current configuration for '{}' unavailable", hostname)
                })
            })?;
        let current = unwrap_text(current).ok_or_else(|| {
            QueryError::NotFound(format!(
                "Current configuration for '{}' unavailable: controller returned no configuration",
                hostname
            ))
        })?;

        let past_ms = snapshot_timestamp_ms(now_ms, hours_back);
        debug!(hostname, device_id, past_ms, "fetching historical snapshot");
        let past = self
            .client
            .device_config(device_id, Some(past_ms))
            .await
            .map_err(|e| snapshot_error(e, || format!("No snapshot ~{}h ago", hours_back)))?;
        let past = unwrap_text(past).ok_or_else(|| {
            QueryError::NotFound(format!(
                "No snapshot ~{}h ago: controller returned no configuration",
                hours_back
            ))
        })?;

        Ok(diff_configs(&past, &current))
    }
}

/// A 404 on a config fetch means the snapshot does not exist; anything else
/// is a controller failure.
fn snapshot_error(err: ClientError, context: impl FnOnce() -> String) -> QueryError {
    if err.is_not_found() {
        QueryError::NotFound(format!("{}: {}", context(), err))
    } else {
        QueryError::Upstream(err)
    }
}

/// Unwrap a list payload or report it as malformed.
fn records(payload: Value, what: &str) -> Result<Vec<Value>, QueryError> {
    unwrap_envelope(payload).ok_or_else(|| QueryError::Malformed(format!("{} is not a list", what)))
}

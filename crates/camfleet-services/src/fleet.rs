//! Fleet fan-out.
//!
//! One operation is issued to every camera at once and the coordinator waits
//! for all of them to settle. A failing camera never stops the others. When
//! at least one camera fails, exactly one batched alert is dispatched for the
//! whole fan-out.

use std::future::Future;
use std::sync::Arc;

use camfleet_core::{
    DeviceEndpoint, FailureAlert, FleetResult, LogLevel, MediaFile, OperationOutcome,
};
use camfleet_device::{CameraDevice, DeviceClient};
use camfleet_infra::AlertSink;
use chrono::Utc;
use futures::future::join_all;

/// Settled results of one fan-out, in device configuration order.
#[derive(Debug)]
pub struct FleetReport<T> {
    pub action: String,
    pub outcomes: Vec<OperationOutcome<T>>,
}

impl<T> FleetReport<T> {
    /// Aggregate success: every device succeeded.
    pub fn succeeded(&self) -> bool {
        self.outcomes.iter().all(OperationOutcome::succeeded)
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes.len() - self.success_count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &OperationOutcome<T>> {
        self.outcomes.iter().filter(|o| !o.succeeded())
    }

    /// The batched alert for this report, or `None` when nothing failed.
    pub fn failure_alert(&self) -> Option<FailureAlert> {
        let mut alert = FailureAlert::new(self.action.clone(), Utc::now());
        for outcome in self.failures() {
            if let Some(error) = outcome.error() {
                alert.push(outcome.device_id.clone(), error.to_string());
            }
        }
        (!alert.is_empty()).then_some(alert)
    }
}

pub struct FleetCoordinator {
    devices: Vec<Arc<dyn CameraDevice>>,
    alerts: Arc<dyn AlertSink>,
}

impl FleetCoordinator {
    pub fn new(devices: Vec<Arc<dyn CameraDevice>>, alerts: Arc<dyn AlertSink>) -> Self {
        Self { devices, alerts }
    }

    /// One `DeviceClient` per endpoint, in configuration order.
    pub fn from_endpoints(
        endpoints: Vec<DeviceEndpoint>,
        alerts: Arc<dyn AlertSink>,
    ) -> FleetResult<Self> {
        let devices = endpoints
            .into_iter()
            .map(|endpoint| {
                DeviceClient::new(endpoint).map(|c| Arc::new(c) as Arc<dyn CameraDevice>)
            })
            .collect::<FleetResult<Vec<_>>>()?;
        Ok(Self::new(devices, alerts))
    }

    pub fn devices(&self) -> &[Arc<dyn CameraDevice>] {
        &self.devices
    }

    /// Run `op` against every device concurrently and wait for all of them.
    pub async fn run<T, F, Fut>(&self, action: &str, op: F) -> FleetReport<T>
    where
        F: Fn(Arc<dyn CameraDevice>) -> Fut,
        Fut: Future<Output = FleetResult<T>>,
    {
        tracing::info!(action = %action, devices = self.devices.len(), "Starting fleet operation");

        let pending = self.devices.iter().map(|device| {
            let device_id = device.id().to_string();
            let fut = op(Arc::clone(device));
            async move { OperationOutcome::new(device_id, fut.await) }
        });
        let outcomes = join_all(pending).await;

        self.settle(action, outcomes).await
    }

    /// Log per-device outcomes and dispatch the batched alert, if any.
    ///
    /// Alert delivery problems are logged and never change the report.
    pub async fn settle<T>(&self, action: &str, outcomes: Vec<OperationOutcome<T>>) -> FleetReport<T> {
        for outcome in &outcomes {
            match outcome.error() {
                None => tracing::info!(action = %action, device = %outcome.device_id, "Device succeeded"),
                Some(e) => match e.log_level() {
                    LogLevel::Warn => tracing::warn!(
                        action = %action,
                        device = %outcome.device_id,
                        error_code = e.error_code(),
                        error = %e,
                        "Device failed"
                    ),
                    _ => tracing::error!(
                        action = %action,
                        device = %outcome.device_id,
                        error_code = e.error_code(),
                        error = %e,
                        "Device failed"
                    ),
                },
            }
        }

        let report = FleetReport {
            action: action.to_string(),
            outcomes,
        };

        if let Some(alert) = report.failure_alert() {
            if let Err(e) = self.alerts.dispatch(&alert).await {
                tracing::warn!(action = %action, error = %e, "Failed to deliver failure alert");
            }
        }

        tracing::info!(
            action = %action,
            succeeded = report.success_count(),
            failed = report.failure_count(),
            "Fleet operation finished"
        );
        report
    }

    pub async fn start_capture(&self) -> FleetReport<()> {
        self.run("start", |device| async move { device.start_capture().await })
            .await
    }

    pub async fn stop_capture(&self) -> FleetReport<()> {
        self.run("stop", |device| async move { device.stop_capture().await })
            .await
    }

    pub async fn status(&self) -> FleetReport<serde_json::Value> {
        self.run("status", |device| async move { device.get_status().await })
            .await
    }

    pub async fn list_media(&self) -> FleetReport<Vec<MediaFile>> {
        self.run("list", |device| async move { device.list_media().await })
            .await
    }

    /// Wipe every camera's storage. Callers gate this behind an explicit
    /// confirmation.
    pub async fn delete_all(&self) -> FleetReport<()> {
        self.run("delete", |device| async move { device.delete_all().await })
            .await
    }

    /// Poke every camera; never fails.
    pub async fn keep_alive(&self) {
        join_all(self.devices.iter().map(|device| device.keep_alive())).await;
    }
}

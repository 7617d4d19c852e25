//! camfleet Services Layer
//!
//! Orchestration on top of the device client, archive and alerting crates:
//! `fleet` fans one operation out to every camera and reports failures as a
//! single batched alert; `pipeline` chains download, upload and cleanup per
//! camera with the guarantee that local media is only removed once it is
//! archived. The CLI depends on this crate as its single facade.

pub mod fleet;
pub mod local_files;
pub mod pipeline;

pub use camfleet_core::{
    load_devices, Config, DeviceEndpoint, FleetError, FleetResult, MediaFile, OperationOutcome,
};
pub use camfleet_device::{settings_of, CameraDevice, DeviceClient};
pub use camfleet_infra::{build_alert_sink, AlertSink};
pub use camfleet_storage::{create_storage, ArchiveUploader, ArchivedObject, Storage};
pub use fleet::{FleetCoordinator, FleetReport};
pub use local_files::{LocalFiles, TokioLocalFiles};
pub use pipeline::{DownloadBatch, TransferPipeline, TransferRecord, TransferState, TransferSummary};

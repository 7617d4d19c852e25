mod helpers;

use std::path::Path;
use std::sync::Arc;

use camfleet_device::CameraDevice;
use camfleet_services::{FleetCoordinator, TransferPipeline, TransferState};
use camfleet_storage::ArchiveUploader;
use helpers::{CountingLocalFiles, FakeDevice, MemoryStorage, RecordingSink};

struct Harness {
    _root: tempfile::TempDir,
    download_dir: std::path::PathBuf,
    storage: Arc<MemoryStorage>,
    local: Arc<CountingLocalFiles>,
    sink: Arc<RecordingSink>,
}

impl Harness {
    fn new(storage: MemoryStorage) -> Self {
        let root = tempfile::tempdir().unwrap();
        Self {
            download_dir: root.path().join("downloads"),
            _root: root,
            storage: Arc::new(storage),
            local: Arc::new(CountingLocalFiles::default()),
            sink: Arc::new(RecordingSink::default()),
        }
    }

    fn pipeline(&self, cleanup: bool) -> TransferPipeline {
        let archive = ArchiveUploader::new(self.storage.clone(), "");
        TransferPipeline::new(archive, &self.download_dir, cleanup)
            .with_local_files(self.local.clone())
    }

    fn fleet(&self, devices: Vec<Arc<FakeDevice>>) -> FleetCoordinator {
        FleetCoordinator::new(
            devices
                .into_iter()
                .map(|d| d as Arc<dyn CameraDevice>)
                .collect(),
            self.sink.clone(),
        )
    }

    fn device_dir(&self, ip: &str) -> std::path::PathBuf {
        self.download_dir.join(ip.replace('.', "_"))
    }
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn successful_transfer_archives_then_cleans() {
    let harness = Harness::new(MemoryStorage::default());
    let camera = Arc::new(
        FakeDevice::new("192.168.1.10")
            .with_file("GOPR0001.JPG", b"jpeg")
            .with_file("GX010002.MP4", b"video bytes"),
    );

    let summary = harness
        .pipeline(true)
        .run(&harness.fleet(vec![camera]))
        .await;

    assert!(summary.succeeded());
    assert_eq!(summary.files_uploaded(), 2);
    assert_eq!(summary.devices_succeeded(), 1);
    assert_eq!(summary.records[0].state, TransferState::Cleaned);

    let keys = harness.storage.keys();
    assert_eq!(keys.len(), 2);
    assert!(keys.iter().all(|k| k.starts_with("192.168.1.10/")));
    assert!(keys.iter().any(|k| k.ends_with("/GX010002.MP4")));
    let video_key = keys.iter().find(|k| k.ends_with(".MP4")).unwrap();
    assert_eq!(
        harness.storage.content_type(video_key).as_deref(),
        Some("video/mp4")
    );

    assert_eq!(harness.local.removed_files(), 2);
    assert!(!harness.device_dir("192.168.1.10").exists());
    assert!(harness.sink.alerts().is_empty());
}

#[tokio::test]
async fn upload_failure_never_deletes_local_files() {
    let harness = Harness::new(MemoryStorage::failing_on("GX010002"));
    let camera = Arc::new(
        FakeDevice::new("192.168.1.10")
            .with_file("GOPR0001.JPG", b"jpeg")
            .with_file("GX010002.MP4", b"video bytes"),
    );

    let summary = harness
        .pipeline(true)
        .run(&harness.fleet(vec![camera]))
        .await;

    assert!(!summary.succeeded());
    let record = &summary.records[0];
    assert_eq!(record.state, TransferState::UploadFailed);
    assert_eq!(
        record.error.as_ref().map(|e| e.error_code()),
        Some("UPLOAD_ERROR")
    );
    // the file that did upload is listed, but nothing is cleaned
    assert_eq!(record.uploaded.len(), 1);
    assert_eq!(record.cleaned, 0);
    assert_eq!(harness.local.removed_files(), 0);
    assert_eq!(
        file_names(&harness.device_dir("192.168.1.10")),
        ["GOPR0001.JPG", "GX010002.MP4"]
    );

    let alerts = harness.sink.alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].action, "transfer");
}

#[tokio::test]
async fn download_failure_skips_upload_and_cleanup() {
    let harness = Harness::new(MemoryStorage::default());
    let camera = Arc::new(
        FakeDevice::new("192.168.1.10")
            .with_file("GOPR0001.JPG", b"jpeg")
            .with_file("GX010002.MP4", b"video bytes")
            .with_file("GOPR0003.JPG", b"jpeg 3")
            .failing_download("GX010002.MP4"),
    );

    let summary = harness
        .pipeline(true)
        .run(&harness.fleet(vec![camera.clone()]))
        .await;

    let record = &summary.records[0];
    assert_eq!(record.state, TransferState::DownloadFailed);
    assert_eq!(
        record.error.as_ref().map(|e| e.error_code()),
        Some("DOWNLOAD_ERROR")
    );
    assert!(harness.storage.keys().is_empty());
    assert_eq!(harness.local.removed_files(), 0);

    // remaining files were still fetched
    assert!(camera.calls().contains(&"download GOPR0003.JPG".to_string()));
    assert_eq!(
        file_names(&harness.device_dir("192.168.1.10")),
        ["GOPR0001.JPG", "GOPR0003.JPG"]
    );
}

#[tokio::test]
async fn one_failing_camera_does_not_stop_the_others() {
    let harness = Harness::new(MemoryStorage::default());
    let good = Arc::new(FakeDevice::new("10.0.0.1").with_file("GOPR0001.JPG", b"jpeg"));
    let down = Arc::new(FakeDevice::new("10.0.0.2").unreachable());

    let summary = harness
        .pipeline(false)
        .run(&harness.fleet(vec![good, down]))
        .await;

    assert!(!summary.succeeded());
    assert_eq!(summary.devices_succeeded(), 1);
    assert_eq!(summary.files_uploaded(), 1);
    assert_eq!(summary.records[0].state, TransferState::Done);
    assert_eq!(summary.records[1].state, TransferState::DownloadFailed);

    let alerts = harness.sink.alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].device_id(), Some("10.0.0.2"));
}

#[tokio::test]
async fn cleanup_disabled_keeps_local_copies() {
    let harness = Harness::new(MemoryStorage::default());
    let camera = Arc::new(FakeDevice::new("10.0.0.1").with_file("GOPR0001.JPG", b"jpeg"));

    let summary = harness
        .pipeline(false)
        .run(&harness.fleet(vec![camera]))
        .await;

    assert_eq!(summary.records[0].state, TransferState::Done);
    assert_eq!(harness.local.removed_files(), 0);
    assert_eq!(file_names(&harness.device_dir("10.0.0.1")), ["GOPR0001.JPG"]);
}

#[tokio::test]
async fn empty_camera_is_a_successful_transfer() {
    let harness = Harness::new(MemoryStorage::default());
    let camera = Arc::new(FakeDevice::new("10.0.0.1"));

    let summary = harness
        .pipeline(true)
        .run(&harness.fleet(vec![camera]))
        .await;

    assert!(summary.succeeded());
    assert_eq!(summary.files_uploaded(), 0);
    assert!(harness.sink.alerts().is_empty());
}

#[tokio::test]
async fn size_mismatch_is_reported_not_fatal() {
    let harness = Harness::new(MemoryStorage::default());
    let camera = Arc::new(FakeDevice::new("10.0.0.1").with_file_reporting(
        "GX010001.MP4",
        b"truncated",
        4096,
    ));

    let summary = harness
        .pipeline(false)
        .run(&harness.fleet(vec![camera]))
        .await;

    let record = &summary.records[0];
    assert_eq!(record.state, TransferState::Done);
    assert_eq!(record.size_mismatches, ["GX010001.MP4"]);
}

#[tokio::test]
async fn standalone_upload_reads_the_device_directory() {
    let harness = Harness::new(MemoryStorage::default());
    let dir = harness.device_dir("10.0.0.1");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("GOPR0001.JPG"), b"jpeg").unwrap();
    std::fs::write(dir.join("GOPR0002.JPG"), b"jpeg").unwrap();

    let camera = Arc::new(FakeDevice::new("10.0.0.1"));
    let missing = Arc::new(FakeDevice::new("10.0.0.2"));
    let report = harness
        .pipeline(true)
        .upload_local(&harness.fleet(vec![camera, missing]))
        .await;

    assert_eq!(report.outcomes[0].value().map(Vec::len), Some(2));
    assert_eq!(
        report.outcomes[1].error().map(|e| e.error_code()),
        Some("UPLOAD_ERROR")
    );
    // standalone upload never deletes
    assert_eq!(harness.local.removed_files(), 0);
    assert_eq!(file_names(&dir).len(), 2);
}

#[tokio::test]
async fn cleanup_local_removes_device_directories() {
    let harness = Harness::new(MemoryStorage::default());
    let dir = harness.device_dir("10.0.0.1");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("GOPR0001.JPG"), b"jpeg").unwrap();

    let report = harness
        .pipeline(false)
        .cleanup_local(&harness.fleet(vec![
            Arc::new(FakeDevice::new("10.0.0.1")),
            Arc::new(FakeDevice::new("10.0.0.2")),
        ]))
        .await;

    assert!(report.succeeded());
    assert!(!dir.exists());
}

#[tokio::test]
async fn download_all_collects_files_per_device() {
    let harness = Harness::new(MemoryStorage::default());
    let camera = Arc::new(
        FakeDevice::new("10.0.0.1")
            .with_file("GOPR0001.JPG", b"a")
            .with_file("GOPR0002.JPG", b"bb"),
    );

    let report = harness
        .pipeline(false)
        .download_all(&harness.fleet(vec![camera]))
        .await;

    assert!(report.succeeded());
    let batch = report.outcomes[0].value().unwrap();
    assert_eq!(batch.files.len(), 2);
    assert_eq!(batch.files[1].bytes_written, 2);
    assert!(harness.storage.keys().is_empty());
}

#[tokio::test]
async fn pipeline_without_archive_downloads_but_refuses_upload() {
    let harness = Harness::new(MemoryStorage::default());
    let pipeline = TransferPipeline::without_archive(&harness.download_dir)
        .with_local_files(harness.local.clone());
    let fleet = harness.fleet(vec![Arc::new(
        FakeDevice::new("10.0.0.1").with_file("GOPR0001.JPG", b"jpeg"),
    )]);

    assert!(pipeline.download_all(&fleet).await.succeeded());

    let report = pipeline.upload_local(&fleet).await;
    assert_eq!(
        report.outcomes[0].error().map(|e| e.error_code()),
        Some("CONFIG_INVALID")
    );
    assert_eq!(file_names(&harness.device_dir("10.0.0.1")), ["GOPR0001.JPG"]);
}

#[tokio::test]
async fn cleanup_removes_only_the_batch() {
    let harness = Harness::new(MemoryStorage::default());
    let dir = harness.device_dir("192.168.1.10");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("notes.txt"), b"rig 2, card swapped").unwrap();
    let camera = Arc::new(
        FakeDevice::new("192.168.1.10")
            .with_file("GOPR0001.JPG", b"jpeg")
            .with_file("GX010002.MP4", b"video bytes"),
    );

    let summary = harness
        .pipeline(true)
        .run(&harness.fleet(vec![camera]))
        .await;

    assert!(summary.succeeded());
    assert_eq!(summary.records[0].state, TransferState::Cleaned);
    assert_eq!(harness.local.removed_files(), 2);
    assert!(dir.is_dir());
    assert_eq!(file_names(&dir), ["notes.txt"]);
    assert!(!harness.storage.keys().iter().any(|k| k.ends_with("notes.txt")));
}

#[tokio::test]
async fn same_name_in_two_folders_fails_download_without_overwrite() {
    let harness = Harness::new(MemoryStorage::default());
    let camera = Arc::new(
        FakeDevice::new("192.168.1.10")
            .with_file_in("100GOPRO", "GOPR0001.JPG", b"first card folder")
            .with_file_in("101GOPRO", "GOPR0001.JPG", b"second")
            .with_file_in("101GOPRO", "GOPR0002.JPG", b"jpeg 2"),
    );

    let summary = harness
        .pipeline(true)
        .run(&harness.fleet(vec![camera.clone()]))
        .await;

    let record = &summary.records[0];
    assert_eq!(record.state, TransferState::DownloadFailed);
    assert_eq!(
        record.error.as_ref().map(|e| e.error_code()),
        Some("DOWNLOAD_ERROR")
    );
    assert!(harness.storage.keys().is_empty());

    let calls = camera.calls();
    assert_eq!(
        calls.iter().filter(|c| *c == "download GOPR0001.JPG").count(),
        1
    );
    assert!(calls.contains(&"download GOPR0002.JPG".to_string()));

    let dir = harness.device_dir("192.168.1.10");
    assert_eq!(file_names(&dir), ["GOPR0001.JPG", "GOPR0002.JPG"]);
    assert_eq!(
        std::fs::read(dir.join("GOPR0001.JPG")).unwrap(),
        b"first card folder"
    );
}

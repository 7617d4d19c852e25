use serde::Serialize;
use std::path::PathBuf;

/// One downloadable file on a camera.
///
/// Regenerated from the device listing on every request; never persisted.
/// Members of a grouped capture report size 0 except the first, which carries
/// the size of the whole group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaFile {
    pub folder: String,
    pub name: String,
    pub size: u64,
    pub created: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_member_id: Option<String>,
}

impl MediaFile {
    pub fn is_group_item(&self) -> bool {
        self.group_id.is_some()
    }

    /// `{folder}/{name}` as the camera addresses it.
    pub fn remote_path(&self) -> String {
        format!("{}/{}", self.folder, self.name)
    }
}

/// A file written to local storage by a completed download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub path: PathBuf,
    pub bytes_written: u64,
}

impl DownloadedFile {
    /// True when the camera reported a per-file size and the bytes on disk differ.
    ///
    /// Grouped members are never compared: the camera reports the group total on
    /// the first member only.
    pub fn size_mismatch(&self, reported: &MediaFile) -> bool {
        !reported.is_group_item() && reported.size > 0 && reported.size != self.bytes_written
    }
}

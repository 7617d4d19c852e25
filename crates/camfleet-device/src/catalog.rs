//! Media catalog resolution
//!
//! The camera reports burst, time-lapse and night-lapse sequences as a single
//! record spanning a member-ID range (`b`..=`l`). This module expands those
//! records into one `MediaFile` per member so the downloader can iterate a flat
//! list. Order follows the camera: per folder, per record. Nothing is sorted or
//! de-duplicated, so re-listing unchanged state yields the same sequence.

use std::sync::LazyLock;

use camfleet_core::MediaFile;
use regex::Regex;
use serde::Deserialize;

/// `G<group:3><member:4>.<ext>`, e.g. `G0010001.JPG`.
static GROUPED_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^G(\d{3})(\d{4})\.(.+)$").expect("grouped filename pattern is valid")
});

/// Member IDs are four digits in the filename.
const MAX_MEMBER_ID: u64 = 9999;

static JPG_EXTENSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.(JPG|jpg)$").expect("jpg extension pattern is valid"));

/// Raw `/gopro/media/list` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaListResponse {
    #[serde(default)]
    pub media: Vec<MediaDirectory>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaDirectory {
    /// Folder name, e.g. `100GOPRO`.
    pub d: String,
    #[serde(default)]
    pub fs: Vec<MediaRecord>,
}

/// One file record. The camera sends numbers as strings; both forms are accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaRecord {
    pub n: String,
    #[serde(default)]
    pub s: Option<Scalar>,
    #[serde(default)]
    pub cre: Option<Scalar>,
    #[serde(default, rename = "mod")]
    pub modified: Option<Scalar>,
    /// First group member ID.
    #[serde(default)]
    pub b: Option<Scalar>,
    /// Last group member ID.
    #[serde(default)]
    pub l: Option<Scalar>,
    /// `"1"` when a RAW (`.GPR`) companion exists.
    #[serde(default)]
    pub raw: Option<Scalar>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(u64),
    Text(String),
}

impl Scalar {
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Scalar::Int(v) => Some(*v),
            Scalar::Text(s) => s.trim().parse().ok(),
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            Scalar::Int(v) => v.to_string(),
            Scalar::Text(s) => s.clone(),
        }
    }
}

enum Grouping {
    Single,
    Range { first: u64, last: u64 },
    Malformed,
}

impl MediaRecord {
    fn size(&self) -> u64 {
        self.s.as_ref().and_then(Scalar::as_u64).unwrap_or(0)
    }

    fn created(&self) -> String {
        self.cre
            .as_ref()
            .or(self.modified.as_ref())
            .map(Scalar::as_text)
            .unwrap_or_default()
    }

    fn has_raw(&self) -> bool {
        self.raw.as_ref().and_then(Scalar::as_u64) == Some(1)
    }

    fn grouping(&self) -> Grouping {
        match (&self.b, &self.l) {
            (Some(b), Some(l)) => match (b.as_u64(), l.as_u64()) {
                (Some(first), Some(last)) if first <= last && last <= MAX_MEMBER_ID => {
                    Grouping::Range { first, last }
                }
                _ => Grouping::Malformed,
            },
            _ => Grouping::Single,
        }
    }
}

/// Parsed `G<group><member>.<ext>` filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupedName {
    pub group_id: String,
    pub member_id: u64,
    pub extension: String,
}

impl GroupedName {
    /// `None` when the name does not follow the grouped pattern.
    pub fn parse(name: &str) -> Option<Self> {
        let caps = GROUPED_NAME.captures(name)?;
        Some(Self {
            group_id: caps[1].to_string(),
            member_id: caps[2].parse().ok()?,
            extension: caps[3].to_string(),
        })
    }

    pub fn member_name(&self, member_id: u64, extension: &str) -> String {
        format!("G{}{:04}.{}", self.group_id, member_id, extension)
    }
}

/// Flatten a raw listing into downloadable files.
pub fn resolve_listing(listing: &MediaListResponse) -> Vec<MediaFile> {
    let mut files = Vec::new();
    for directory in &listing.media {
        for record in &directory.fs {
            resolve_record(&directory.d, record, &mut files);
        }
    }
    files
}

fn resolve_record(folder: &str, record: &MediaRecord, out: &mut Vec<MediaFile>) {
    let created = record.created();

    let range = match record.grouping() {
        Grouping::Single => None,
        Grouping::Range { first, last } => Some((first, last)),
        Grouping::Malformed => {
            tracing::warn!(
                folder = %folder,
                name = %record.n,
                "Grouped record has an unusable member range, listing it as a single file"
            );
            None
        }
    };

    let parsed = range.and_then(|r| GroupedName::parse(&record.n).map(|name| (r, name)));

    match parsed {
        Some(((first, last), name)) => {
            for member_id in first..=last {
                let member = format!("{:04}", member_id);
                out.push(MediaFile {
                    folder: folder.to_string(),
                    name: name.member_name(member_id, &name.extension),
                    size: if member_id == first { record.size() } else { 0 },
                    created: created.clone(),
                    group_id: Some(name.group_id.clone()),
                    group_member_id: Some(member.clone()),
                });
                if record.has_raw() {
                    out.push(MediaFile {
                        folder: folder.to_string(),
                        name: name.member_name(member_id, "GPR"),
                        size: 0,
                        created: created.clone(),
                        group_id: Some(name.group_id.clone()),
                        group_member_id: Some(member),
                    });
                }
            }
        }
        None => {
            if range.is_some() {
                tracing::warn!(
                    folder = %folder,
                    name = %record.n,
                    "Grouped file doesn't match expected pattern, listing it as a single file"
                );
            }
            out.push(MediaFile {
                folder: folder.to_string(),
                name: record.n.clone(),
                size: record.size(),
                created: created.clone(),
                group_id: None,
                group_member_id: None,
            });
            if record.has_raw() && JPG_EXTENSION.is_match(&record.n) {
                out.push(MediaFile {
                    folder: folder.to_string(),
                    name: JPG_EXTENSION.replace(&record.n, ".GPR").into_owned(),
                    size: 0,
                    created,
                    group_id: None,
                    group_member_id: None,
                });
            }
        }
    }
}

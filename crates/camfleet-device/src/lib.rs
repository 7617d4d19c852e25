//! Camera device access.
//!
//! `DeviceClient` talks to exactly one camera over its authenticated HTTPS
//! channel. `catalog` turns the camera's compact media listing into the flat
//! list of files a downloader iterates. The `CameraDevice` trait is the seam the
//! fleet services program against, so they can be exercised without cameras.

pub mod catalog;
pub mod client;
pub mod traits;

pub use catalog::{resolve_listing, GroupedName, MediaListResponse};
pub use client::{settings_of, DeviceClient};
pub use traits::CameraDevice;

use camfleet_core::constants::GENERIC_CONTENT_TYPE;
use std::path::Path;

/// Content type for an archived file, chosen by extension (case-insensitive).
pub fn content_type_for(filename: &str) -> &'static str {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("jpg" | "jpeg" | "thm") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("mp4" | "lrv") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("avi") => "video/x-msvideo",
        _ => GENERIC_CONTENT_TYPE,
    }
}

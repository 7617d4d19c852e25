//! Output helpers for the `camfleet` binary.

use camfleet_core::{MediaFile, OperationOutcome};
use camfleet_services::{settings_of, FleetReport, TransferRecord, TransferState};

/// Longest error text shown on a single result line.
pub const MAX_ERROR_WIDTH: usize = 160;

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// `12.34 MB`
pub fn format_size_mb(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / 1024.0 / 1024.0)
}

/// `{"status": .., "settings": ..}` built from a single state fetch.
pub fn status_json(state: serde_json::Value) -> serde_json::Value {
    let settings = settings_of(&state);
    serde_json::json!({ "status": state, "settings": settings })
}

/// One line per device: a check mark and `detail` on success, the error otherwise.
pub fn outcome_line<T>(outcome: &OperationOutcome<T>, detail: impl Fn(&T) -> String) -> String {
    match &outcome.result {
        Ok(value) => {
            let detail = detail(value);
            if detail.is_empty() {
                format!("✓ {}", outcome.device_id)
            } else {
                format!("✓ {}: {}", outcome.device_id, detail)
            }
        }
        Err(e) => format!(
            "✗ {}: [{}] {}",
            outcome.device_id,
            e.error_code(),
            truncate_string(&e.to_string(), MAX_ERROR_WIDTH)
        ),
    }
}

/// `action: 3/4 cameras succeeded`
pub fn report_footer<T>(report: &FleetReport<T>) -> String {
    format!(
        "{}: {}/{} cameras succeeded",
        report.action,
        report.success_count(),
        report.outcomes.len()
    )
}

/// Listing line for one file. Grouped members other than the first report
/// size 0, so no size is shown for them.
pub fn media_line(file: &MediaFile) -> String {
    let mut line = format!("  {}", file.remote_path());
    if file.size > 0 {
        line.push_str(&format!(" ({})", format_size_mb(file.size)));
        if file.is_group_item() {
            line.push_str(" whole group");
        }
    }
    if let (Some(group), Some(member)) = (&file.group_id, &file.group_member_id) {
        line.push_str(&format!(" [group {} #{}]", group, member));
    }
    line
}

/// `{"action", "succeeded", "devices": [{"device", "ok", "value" | "error"}]}`
pub fn report_json<T>(
    report: &FleetReport<T>,
    value: impl Fn(&T) -> serde_json::Value,
) -> serde_json::Value {
    let devices: Vec<_> = report
        .outcomes
        .iter()
        .map(|outcome| match &outcome.result {
            Ok(v) => serde_json::json!({
                "device": outcome.device_id,
                "ok": true,
                "value": value(v),
            }),
            Err(e) => serde_json::json!({
                "device": outcome.device_id,
                "ok": false,
                "error_code": e.error_code(),
                "error": e.to_string(),
            }),
        })
        .collect();
    serde_json::json!({
        "action": report.action,
        "succeeded": report.succeeded(),
        "devices": devices,
    })
}

pub fn transfer_line(record: &TransferRecord) -> String {
    let state = match record.state {
        TransferState::Cleaned => "archived and cleaned",
        TransferState::Done => "archived",
        TransferState::DownloadFailed => "download failed",
        TransferState::UploadFailed => "upload failed",
        _ => "incomplete",
    };
    let mark = if record.state.is_success() { '✓' } else { '✗' };
    let mut line = format!(
        "{} {}: {} ({} downloaded, {} uploaded, {} removed)",
        mark,
        record.device_id,
        state,
        record.downloaded.len(),
        record.uploaded.len(),
        record.cleaned
    );
    if !record.size_mismatches.is_empty() {
        line.push_str(&format!(
            "; size mismatch: {}",
            record.size_mismatches.join(", ")
        ));
    }
    if let Some(e) = &record.error {
        line.push_str(&format!(
            "; [{}] {}",
            e.error_code(),
            truncate_string(&e.to_string(), MAX_ERROR_WIDTH)
        ));
    }
    line
}

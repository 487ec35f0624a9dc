use clap::ValueEnum;
use streamsync_core::models::{RemoteVideo, RemoteVideoTotals, VideoMetadata};
use streamsync_core::{LogLevel, SyncError};

/// Output format for listing commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Render the provider's video list as a fixed-width table
pub fn format_video_table(videos: &[RemoteVideo]) -> String {
    let mut out = format!(
        "{:<32} {:<30} {:<13} {:>10} {:>12} {:>11}\n",
        "UID", "Name", "ReadyToStream", "Size (MB)", "Duration (s)", "Dimensions"
    );
    out.push_str(&"-".repeat(113));
    out.push('\n');

    for video in videos {
        let duration = match video.duration {
            Some(seconds) if seconds >= 0.0 => format!("{:.1}", seconds),
            _ => "-".to_string(),
        };
        out.push_str(&format!(
            "{:<32} {:<30} {:<13} {:>10.2} {:>12} {:>11}\n",
            truncate_string(&video.uid, 32),
            truncate_string(video.name.as_deref().unwrap_or("[Unknown Name]"), 30),
            video.ready_to_stream,
            video.size_mb(),
            duration,
            video.dimensions()
        ));
    }

    out
}

/// Render local metadata records as a fixed-width table
pub fn format_metadata_table(records: &[VideoMetadata]) -> String {
    let mut out = format!(
        "{:<36} {:<32} {:<16} {}\n",
        "Asset", "UID", "Updated", "HLS"
    );
    out.push_str(&"-".repeat(100));
    out.push('\n');

    for record in records {
        let hls = if record.hls_uri.is_empty() {
            "-"
        } else {
            record.hls_uri.as_str()
        };
        out.push_str(&format!(
            "{:<36} {:<32} {:<16} {}\n",
            record.asset_id,
            truncate_string(record.remote_id.as_str(), 32),
            record.updated_at.format("%Y-%m-%d %H:%M"),
            hls
        ));
    }

    out
}

pub fn format_totals(totals: &RemoteVideoTotals) -> String {
    format!(
        "Total {:.2} minutes / {:.2} mb",
        totals.minutes, totals.megabytes
    )
}

/// Log a failed command at the severity its error kind calls for
pub fn report_error(err: &SyncError) {
    let code = err.error_code();
    let recoverable = err.is_recoverable();
    match err.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error_code = code, recoverable, error = %err, "Command failed")
        }
        LogLevel::Warn => {
            tracing::warn!(error_code = code, recoverable, error = %err, "Command failed")
        }
        LogLevel::Error => {
            tracing::error!(error_code = code, recoverable, error = %err, "Command failed")
        }
    }

    if recoverable {
        eprintln!("Run the command again to retry ({})", code);
    }
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

// file: src/utils/logging.rs
// description: Tracing subscriber initialization with console and rotating file output

use crate::config::LoggingConfig;
use crate::error::{MindGardenError, Result};
use chrono::Local;
use colored::*;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub const LOG_FILE_NAME: &str = "mindgarden.log";

pub struct LogSettings<'a> {
    pub logging: &'a LoggingConfig,
    pub logs_dir: &'a Path,
    pub colored_output: bool,
    pub verbose: bool,
}

pub fn init_logger(settings: LogSettings<'_>) -> Result<()> {
    fs::create_dir_all(settings.logs_dir)
        .map_err(|e| MindGardenError::file_operation(settings.logs_dir, e))?;

    let log_path = settings.logs_dir.join(LOG_FILE_NAME);
    let max_bytes = settings.logging.max_file_size_mb * 1024 * 1024;
    rotate_log_file(&log_path, max_bytes)?;
    prune_rotated_logs(
        settings.logs_dir,
        Duration::from_secs(settings.logging.retention_days * 24 * 60 * 60),
    )?;

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(|e| MindGardenError::file_operation(&log_path, e))?;

    let console_level = if settings.verbose {
        "debug"
    } else {
        settings.logging.level.as_str()
    };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(true)
        .with_line_number(true)
        .compact()
        .with_ansi(settings.colored_output)
        .with_filter(parse_filter(console_level)?);

    let file_layer = fmt::layer()
        .with_writer(Arc::new(file))
        .with_target(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_filter(parse_filter(&settings.logging.file_level)?);

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| MindGardenError::Config(format!("Failed to initialize logging: {}", e)))
}

fn parse_filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(level.to_lowercase())
        .map_err(|e| MindGardenError::Config(format!("Invalid log level '{}': {}", level, e)))
}

/// Moves the active log aside once it grows past `max_bytes`.
/// Returns the rotated path when a rotation happened.
pub fn rotate_log_file(log_path: &Path, max_bytes: u64) -> Result<Option<PathBuf>> {
    let metadata = match fs::metadata(log_path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(MindGardenError::file_operation(log_path, e)),
    };

    if metadata.len() <= max_bytes {
        return Ok(None);
    }

    let suffix = Local::now().format("%Y%m%dT%H%M%S");
    let rotated = log_path.with_file_name(format!("{}.{}", LOG_FILE_NAME, suffix));
    fs::rename(log_path, &rotated).map_err(|e| MindGardenError::file_operation(log_path, e))?;

    Ok(Some(rotated))
}

/// Deletes rotated logs whose modification time is older than `retention`.
pub fn prune_rotated_logs(logs_dir: &Path, retention: Duration) -> Result<usize> {
    let prefix = format!("{}.", LOG_FILE_NAME);
    let cutoff = SystemTime::now()
        .checked_sub(retention)
        .unwrap_or(SystemTime::UNIX_EPOCH);

    let entries =
        fs::read_dir(logs_dir).map_err(|e| MindGardenError::file_operation(logs_dir, e))?;

    let mut removed = 0;
    for entry in entries.flatten() {
        let name = entry.file_name();
        if !name.to_string_lossy().starts_with(&prefix) {
            continue;
        }

        let modified = entry.metadata().and_then(|m| m.modified());
        if let Ok(modified) = modified
            && modified < cutoff
        {
            fs::remove_file(entry.path())
                .map_err(|e| MindGardenError::file_operation(entry.path(), e))?;
            removed += 1;
        }
    }

    Ok(removed)
}

pub fn format_success(msg: &str) -> String {
    format!("{} {}", "✓".green().bold(), msg.green())
}

pub fn format_error(msg: &str) -> String {
    format!("{} {}", "Error:".red().bold(), msg)
}

pub fn format_warning(msg: &str) -> String {
    format!("{} {}", "⚠".yellow().bold(), msg.yellow())
}

pub fn format_info(msg: &str) -> String {
    format!("{} {}", "ℹ".blue().bold(), msg)
}

/// Chat transcript line: `<speaker>: <text>` with the speaker highlighted.
pub fn format_speaker(speaker: &str, text: &str, is_user: bool) -> String {
    let label = if is_user {
        speaker.blue().bold()
    } else {
        speaker.green().bold()
    };
    format!("{}: {}", label, text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_rotate_skips_small_or_missing_file() {
        let temp = TempDir::new().unwrap();
        let log_path = temp.path().join(LOG_FILE_NAME);

        assert_eq!(rotate_log_file(&log_path, 10).unwrap(), None);

        fs::write(&log_path, "tiny").unwrap();
        assert_eq!(rotate_log_file(&log_path, 10).unwrap(), None);
        assert!(log_path.exists());
    }

    #[test]
    fn test_rotate_moves_large_file() {
        let temp = TempDir::new().unwrap();
        let log_path = temp.path().join(LOG_FILE_NAME);
        fs::write(&log_path, "x".repeat(64)).unwrap();

        let rotated = rotate_log_file(&log_path, 16).unwrap().unwrap();

        assert!(!log_path.exists());
        assert!(rotated.exists());
        assert!(
            rotated
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("mindgarden.log.")
        );
    }

    #[test]
    fn test_prune_only_touches_rotated_logs() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(LOG_FILE_NAME), "active").unwrap();
        fs::write(temp.path().join("mindgarden.log.20200101T000000"), "old").unwrap();
        fs::write(temp.path().join("notes.txt"), "keep").unwrap();

        // 1ms retention: every rotated file is already expired.
        std::thread::sleep(Duration::from_millis(20));
        let removed = prune_rotated_logs(temp.path(), Duration::from_millis(1)).unwrap();

        assert_eq!(removed, 1);
        assert!(temp.path().join(LOG_FILE_NAME).exists());
        assert!(temp.path().join("notes.txt").exists());
    }

    #[test]
    fn test_prune_keeps_recent_logs() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("mindgarden.log.20990101T000000"), "fresh").unwrap();

        let removed =
            prune_rotated_logs(temp.path(), Duration::from_secs(7 * 24 * 60 * 60)).unwrap();
        assert_eq!(removed, 0);
    }

    #[test]
    fn test_format_speaker_contains_parts() {
        let line = format_speaker("Quinn", "Hello!", false);
        assert!(line.contains("Quinn"));
        assert!(line.contains("Hello!"));
    }
}

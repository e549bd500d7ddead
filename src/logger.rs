use anyhow::{Context, Result};
use chrono::Local;
use once_cell::sync::OnceCell;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::config::LoggingConfig;
use crate::constants::MAX_BUFFERED_LOG_LINES;

static INSTALLED: OnceCell<Logger> = OnceCell::new();

/// Shared buffer of recent log lines, fed by the global `fern` dispatch.
#[derive(Clone)]
pub struct Logger {
    logs: Arc<Mutex<Vec<String>>>,
    log_file: Option<PathBuf>,
}

impl Logger {
    /// Install the global `log` backend once and return the shared logger.
    ///
    /// Every record is formatted with a timestamp and kept in the in-memory
    /// buffer; when logging is enabled in the config, records are also
    /// appended to [`Logger::get_log_file_path`]. Later calls return the
    /// logger installed by the first one.
    pub fn install(config: &LoggingConfig) -> Result<Logger> {
        INSTALLED
            .get_or_try_init(|| -> Result<Logger> {
                let level = config.level_filter()?;
                let log_file = if config.enabled { Some(Self::get_log_file_path()?) } else { None };
                let logger = Logger {
                    logs: Arc::new(Mutex::new(Vec::new())),
                    log_file,
                };

                let buffer = logger.clone();
                let mut dispatch = fern::Dispatch::new()
                    .format(|out, message, record| {
                        out.finish(format_args!(
                            "[{}] {:<5} {}: {}",
                            Local::now().format("%H:%M:%S%.3f"),
                            record.level(),
                            record.target(),
                            message
                        ))
                    })
                    .level(level)
                    .chain(fern::Output::call(move |record| buffer.push(record.args().to_string())));

                if let Some(path) = &logger.log_file {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)
                            .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
                    }
                    let file = fern::log_file(path)
                        .with_context(|| format!("Failed to open log file: {}", path.display()))?;
                    dispatch = dispatch.chain(file);
                }

                dispatch
                    .apply()
                    .map_err(|e| anyhow::anyhow!("Failed to install logger: {}", e))?;
                Ok(logger)
            })
            .cloned()
    }

    fn push(&self, line: String) {
        if let Ok(mut logs) = self.logs.lock() {
            if logs.len() >= MAX_BUFFERED_LOG_LINES {
                logs.remove(0);
            }
            logs.push(line);
        }
    }

    /// Get all logs, newest first
    pub fn get_logs(&self) -> Vec<String> {
        if let Ok(logs) = self.logs.lock() {
            let mut sorted_logs = logs.clone();
            sorted_logs.reverse();
            sorted_logs
        } else {
            Vec::new()
        }
    }

    /// Whether records are also written to a file
    pub fn is_enabled(&self) -> bool {
        self.log_file.is_some()
    }

    pub fn log_file(&self) -> Option<&PathBuf> {
        self.log_file.as_ref()
    }

    /// Location of the log file under the platform data directory
    pub fn get_log_file_path() -> Result<PathBuf> {
        dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))
            .map(|dir| dir.join("checklist").join("checklist.log"))
    }
}

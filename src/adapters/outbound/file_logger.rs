use crate::domains::logger::DomainLogger;
use chrono::Utc;
use std::sync::Arc;

struct FileBridge;

impl DomainLogger for FileBridge {
    fn info(&self, msg: &str) {
        log::info!("{} - {}", Utc::now().to_rfc3339(), msg);
    }

    fn warn(&self, msg: &str) {
        log::warn!("{} - {}", Utc::now().to_rfc3339(), msg);
    }

    fn error(&self, msg: &str) {
        log::error!("{} - {}", Utc::now().to_rfc3339(), msg);
    }
}

/// Initialize `fast_log` with console echo plus a rolling file appender and
/// return the domain logger handle the application injects.
pub fn init_file_logger(path: &str) -> Result<Arc<dyn DomainLogger>, String> {
    fast_log::init(
        fast_log::config::Config::new()
            .console()
            .file(path)
            .level(log::LevelFilter::Info),
    )
    .map_err(|e| format!("failed to initialize fast_log: {}", e))?;
    Ok(Arc::new(FileBridge {}))
}

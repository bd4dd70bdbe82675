use std::sync::Arc;

/// Domain-level logging port (hexagonal port). Playback code reports through
/// this instead of a concrete backend; adapters bridge to the console or a
/// rolling log file. Intentionally small and non-fallible from the domain's
/// perspective.
pub trait DomainLogger: Send + Sync + 'static {
    fn info(&self, msg: &str);
    fn warn(&self, msg: &str);
    fn error(&self, msg: &str);
}

pub type DynLogger = Arc<dyn DomainLogger>;

pub mod episode;
pub mod logger;
pub mod replay;

pub use logger::{DomainLogger, DynLogger};

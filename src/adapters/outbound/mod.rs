pub mod console_logger;
pub mod file_logger;
pub mod settings_writer;
pub mod sim_stub;
pub mod sim_tcp;

pub use console_logger::*;
pub use file_logger::*;
pub use settings_writer::*;
pub use sim_stub::*;
pub use sim_tcp::*;

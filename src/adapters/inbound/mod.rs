pub mod episode_file;

pub use episode_file::*;

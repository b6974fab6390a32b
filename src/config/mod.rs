//! Storage location and optional configuration file.

pub mod settings;

pub use settings::{data_dir, ensure_data_dir, Settings, APP_DIR_NAME};

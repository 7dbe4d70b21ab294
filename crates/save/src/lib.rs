//! Persistence for the expanded unit pool: the settings file and the
//! per-save metadata dictionary.

mod atomic_write;
pub mod file_header;
pub mod metadata_codec;
mod save_error;
mod save_plugin;
pub mod settings_file;

pub use save_error::SaveError;
pub use save_plugin::{SavePlugin, SettingsPath};

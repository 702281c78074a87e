//! Config module.
//! Provides configuration types, the media category table, default paths, XML loading,
//! tag parsing and validation.

pub mod media;
pub mod paths;
pub mod tags;
pub mod types;
mod validate;
pub mod xml;

pub use media::MediaCategory;
pub use paths::{default_config_path, path_has_symlink_ancestor};
pub use tags::filter_from_tags;
pub use types::{Config, LogLevel};
pub use validate::{validate_no_whitespace, validate_staging_root};
pub use xml::{load_config, load_config_from_xml_path};

/// Defaults shared across submodules.
pub const DEFAULT_DESTINATION: &str = ".";
pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_EXTENSIONS: &str = "mkv,mp4,avi,mov,rmvb";
pub const DEFAULT_TEMP_ROOT: &str = ".temp";
pub const DEFAULT_FILEBOT_BIN: &str = "filebot";
/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "QBOT_CONFIG";

//! Configuration loading and application-scoped directories.
//!
//! Config files: `skilldeck.toml`, `skilldeck.yaml`, or `skilldeck.json`
//! Searched in `./` then `~/.config/skilldeck/`.

pub mod loader;
pub mod schema;

pub use {
    loader::{
        clear_data_dir, config_dir, data_dir, discover_and_load, find_or_default_config_path,
        load_config, save_config, set_data_dir,
    },
    schema::{CustomPathEntry, SkilldeckConfig},
};

/// Configuration system
///
/// - `macros`: `config_struct!` for single-declaration structs with defaults
/// - `schemas`: the config sections
/// - `utils`: loading, environment overrides and global access
mod macros;
pub mod schemas;
pub mod utils;

pub use schemas::*;
pub use utils::{
    apply_env_overrides, get_config_clone, load_config_from_path, parse_config,
    read_config_file, reload_config_from_path, with_config, CONFIG,
};

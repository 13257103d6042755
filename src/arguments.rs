/// Centralized command-line argument handling
///
/// Arguments are captured once into a global so any module (logger,
/// config loading, main) can query flags without threading them around.
/// Tests override them with `set_cmd_args`.
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::env;

use crate::logger::LogTag;

/// Global command-line arguments storage
pub static CMD_ARGS: Lazy<Mutex<Vec<String>>> = Lazy::new(|| Mutex::new(env::args().collect()));

/// Override the captured arguments
pub fn set_cmd_args(args: Vec<String>) {
    *CMD_ARGS.lock() = args;
}

/// Copy of the current arguments
pub fn get_cmd_args() -> Vec<String> {
    CMD_ARGS.lock().clone()
}

/// Checks if a specific argument is present
pub fn has_arg(arg: &str) -> bool {
    get_cmd_args().iter().any(|a| a == arg)
}

/// Value following a flag (`--port 3000`), or `--flag=value`
pub fn get_arg_value(flag: &str) -> Option<String> {
    let args = get_cmd_args();
    let inline_prefix = format!("{}=", flag);
    for (i, arg) in args.iter().enumerate() {
        if arg == flag {
            return args.get(i + 1).cloned();
        }
        if let Some(value) = arg.strip_prefix(&inline_prefix) {
            return Some(value.to_string());
        }
    }
    None
}

// =============================================================================
// FLAGS
// =============================================================================

pub fn is_help_requested() -> bool {
    has_arg("--help") || has_arg("-h")
}

pub fn is_version_requested() -> bool {
    has_arg("--version") || has_arg("-V")
}

/// Hub dispatch debug mode
pub fn is_debug_hub_enabled() -> bool {
    has_arg("--debug-hub")
}

/// Per-connection debug mode
pub fn is_debug_connection_enabled() -> bool {
    has_arg("--debug-connection")
}

/// Webserver debug mode
pub fn is_debug_webserver_enabled() -> bool {
    has_arg("--debug-webserver")
}

/// Config file override (`--config <path>`)
pub fn get_config_path_override() -> Option<String> {
    get_arg_value("--config")
}

/// Bind host override (`--host <addr>`)
pub fn get_host_override() -> Option<String> {
    get_arg_value("--host")
}

/// Port override (`--port <n>`); unparseable values are ignored
pub fn get_port_override() -> Option<u16> {
    get_arg_value("--port").and_then(|v| v.parse().ok())
}

/// Print usage
pub fn print_help() {
    println!("livesync {}", env!("CARGO_PKG_VERSION"));
    println!("Live presentation state hub over WebSocket\n");
    println!("USAGE:\n    livesync [OPTIONS]\n");
    println!("OPTIONS:");
    println!("    --config <path>       Config file (default: <data dir>/config.toml)");
    println!("    --host <addr>         Bind address (overrides config)");
    println!("    --port <port>         Bind port (overrides config)");
    println!("    --log-level <level>   error | warning | info | debug | verbose");
    println!("    --verbose             Enable verbose output for all tags");
    println!("    --quiet               Only warnings and errors");
    println!("    --no-log-file         Disable file logging");
    println!("    -h, --help            Print help");
    println!("    -V, --version         Print version\n");
    println!("DEBUG FLAGS:");
    for tag in LogTag::all() {
        println!("    --debug-{}", tag.to_debug_key());
    }
}

/// Print which debug modes are active
pub fn print_debug_info() {
    let enabled: Vec<String> = get_cmd_args()
        .into_iter()
        .filter(|a| a.starts_with("--debug-") || a.starts_with("--verbose"))
        .collect();
    if !enabled.is_empty() {
        crate::logger::info(
            LogTag::System,
            &format!("Debug modes enabled: {}", enabled.join(", ")),
        );
    }
}

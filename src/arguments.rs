/// Centralized argument handling for gradwatch
///
/// Consolidates command-line argument parsing and debug flag checking.
/// Binaries and tests can override the argument list via `set_cmd_args`.
use once_cell::sync::Lazy;
use std::env;
use std::sync::Mutex;

/// Global command-line arguments storage
pub static CMD_ARGS: Lazy<Mutex<Vec<String>>> = Lazy::new(|| Mutex::new(env::args().collect()));

/// Sets the global command-line arguments
pub fn set_cmd_args(args: Vec<String>) {
    if let Ok(mut cmd_args) = CMD_ARGS.lock() {
        *cmd_args = args;
    }
}

/// Gets a copy of the current command-line arguments
pub fn get_cmd_args() -> Vec<String> {
    match CMD_ARGS.lock() {
        Ok(args) => args.clone(),
        Err(_) => env::args().collect(),
    }
}

/// Checks if a specific argument is present in the command line
pub fn has_arg(arg: &str) -> bool {
    get_cmd_args().iter().any(|a| a == arg)
}

/// Gets the value of a command-line argument that follows a flag
pub fn get_arg_value(flag: &str) -> Option<String> {
    let args = get_cmd_args();
    for (i, arg) in args.iter().enumerate() {
        if arg == flag && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
    }
    None
}

pub fn is_run_enabled() -> bool {
    has_arg("--run")
}

pub fn is_help_requested() -> bool {
    has_arg("--help") || has_arg("-h")
}

pub fn is_debug_monitor_enabled() -> bool {
    has_arg("--debug-monitor")
}

pub fn is_debug_enrich_enabled() -> bool {
    has_arg("--debug-enrich")
}

pub fn is_debug_api_enabled() -> bool {
    has_arg("--debug-api")
}

pub fn is_debug_rpc_enabled() -> bool {
    has_arg("--debug-rpc")
}

pub fn is_debug_websocket_enabled() -> bool {
    has_arg("--debug-websocket")
}

pub fn is_debug_stream_enabled() -> bool {
    has_arg("--debug-stream")
}

/// Print CLI usage
pub fn print_help() {
    println!("gradwatch - pump.fun graduation monitor and scorer");
    println!();
    println!("USAGE:");
    println!("    gradwatch --run [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --run                 Start the monitor and HTTP server");
    println!("    --port <PORT>         Override listen port (also: PORT env var)");
    println!("    --debug-monitor       Verbose monitor logs");
    println!("    --debug-enrich        Verbose enrichment logs");
    println!("    --debug-api           Verbose provider API logs");
    println!("    --debug-rpc           Verbose chain RPC logs");
    println!("    --debug-websocket     Verbose upstream websocket logs");
    println!("    --debug-stream        Verbose SSE stream logs");
    println!("    --help                Show this help");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arg_value_extraction() {
        set_cmd_args(vec![
            "gradwatch".to_string(),
            "--run".to_string(),
            "--port".to_string(),
            "9000".to_string(),
        ]);
        assert!(has_arg("--run"));
        assert_eq!(get_arg_value("--port"), Some("9000".to_string()));
        assert_eq!(get_arg_value("--missing"), None);
    }
}

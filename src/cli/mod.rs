//! Command-line interface for AgroSense.

pub mod commands;
pub mod output;
pub mod types;

pub use types::{Cli, Commands};

/// Report `err` and exit the process with status 1.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let payload = serde_json::json!({
            "success": false,
            "error": format!("{err:#}"),
        });
        println!("{}", serde_json::to_string_pretty(&payload).unwrap_or_default());
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1);
}

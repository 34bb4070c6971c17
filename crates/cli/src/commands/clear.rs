//! clear command - Remove the stored configuration
//!
//! Deletes the config file, discarding the access token. The next run of
//! any deploying command requires `ipd setup` again.

use ipd_core::ConfigManager;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Arguments for the clear command
#[derive(clap::Args, Debug)]
pub struct ClearArgs {}

/// Execute the clear command
pub fn execute(_args: ClearArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let manager = match ConfigManager::new() {
        Ok(m) => m,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::from(&e);
        }
    };

    let existed = manager.exists();
    if let Err(e) = manager.clear() {
        formatter.error(&format!("Failed to remove configuration: {e}"));
        return ExitCode::from(&e);
    }

    if formatter.is_json() {
        formatter.json(&serde_json::json!({ "cleared": existed }));
    } else if existed {
        formatter.success("Configuration cleared");
    } else {
        formatter.println("No configuration to clear");
    }
    ExitCode::Success
}

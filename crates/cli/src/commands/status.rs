//! status command - Show configuration and account identity
//!
//! Reports the stored configuration and, when a token is present, probes
//! the account so an expired token is noticed before a deploy.

use ipd_core::{ConfigManager, Error, RemoteStore};
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Arguments for the status command
#[derive(clap::Args, Debug)]
pub struct StatusArgs {}

#[derive(Serialize)]
struct StatusOutput {
    configured: bool,
    storage_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    binary_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,
}

/// Execute the status command
pub async fn execute(_args: StatusArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let manager = match ConfigManager::new() {
        Ok(m) => m,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::from(&e);
        }
    };
    let config = match manager.load() {
        Ok(c) => c,
        Err(e) => {
            formatter.error(&format!("Failed to load configuration: {e}"));
            return ExitCode::from(&e);
        }
    };

    let mut output = StatusOutput {
        configured: config.is_configured(),
        storage_path: config.storage_path.clone(),
        binary_path: config
            .binary_path
            .as_ref()
            .map(|p| p.display().to_string()),
        account_id: None,
        display_name: None,
    };

    if config.access_token.is_some() {
        let client = match super::client_from_config(&config) {
            Ok(c) => c,
            Err(e) => {
                formatter.error(&e.to_string());
                return ExitCode::from(&e);
            }
        };

        match client.account_info().await {
            Ok(account) => {
                output.account_id = Some(account.account_id);
                output.display_name = account.display_name;
            }
            Err(e @ Error::AuthExpired(_)) => {
                formatter.error("Access token has expired. Run \"ipd setup\" again.");
                return ExitCode::from(&e);
            }
            Err(e) => {
                formatter.error(&e.to_string());
                return ExitCode::from(&e);
            }
        }
    }

    if formatter.is_json() {
        formatter.json(&output);
        return ExitCode::Success;
    }

    if !output.configured {
        formatter.warning("Not configured. Run \"ipd setup\" first.");
    }
    formatter.println(&format!("Storage path : {}", output.storage_path));
    if let Some(binary_path) = &output.binary_path {
        formatter.println(&format!("Binary path  : {binary_path}"));
    }
    if let Some(account_id) = &output.account_id {
        formatter.println(&format!("Account      : {account_id}"));
    }
    if let Some(name) = &output.display_name {
        formatter.println(&format!("Name         : {name}"));
    }
    ExitCode::Success
}

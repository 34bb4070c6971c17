//! setup command - Configure the access token and deployment paths
//!
//! Interactive first-run flow: collects an access token, the local
//! directory holding built .ipa archives, and the remote storage folder.
//! Every value is validated before it is stored: the token by shape and a
//! live account probe, the binary path against the filesystem, and the
//! storage path against remote metadata. `NotFound` on the storage path is
//! acceptable (the folder is created by the first upload); an existing
//! non-directory is not.

use std::path::PathBuf;

use dialoguer::{Input, Password};
use ipd_core::{ConfigManager, Error, RemotePath, RemoteStore};
use ipd_dropbox::{ClientOptions, DropboxClient};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Arguments for the setup command
#[derive(clap::Args, Debug)]
pub struct SetupArgs {
    /// OAuth2 access token (prompted for when omitted)
    #[arg(long)]
    pub token: Option<String>,

    /// Local directory containing built .ipa archives (prompted for when omitted)
    #[arg(long)]
    pub binary_path: Option<PathBuf>,

    /// Remote folder that receives builds (prompted for when omitted)
    #[arg(long)]
    pub storage_path: Option<String>,

    /// Pinned CA bundle (PEM) for TLS validation
    #[arg(long)]
    pub ca_bundle: Option<PathBuf>,
}

/// Execute the setup command
pub async fn execute(mut args: SetupArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let manager = match ConfigManager::new() {
        Ok(m) => m,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::from(&e);
        }
    };
    let mut config = match manager.load() {
        Ok(c) => c,
        Err(e) => {
            formatter.error(&format!("Failed to load configuration: {e}"));
            return ExitCode::from(&e);
        }
    };
    if let Some(ca_bundle) = args.ca_bundle.take() {
        config.ca_bundle = Some(ca_bundle);
    }

    // Access token: shape check at construction, then a live probe.
    let token_from_flag = args.token.is_some();
    let client = loop {
        let raw = match args.token.take() {
            Some(t) => t,
            None => match Password::new()
                .with_prompt("Dropbox access token")
                .interact()
            {
                Ok(t) => t,
                Err(e) => {
                    formatter.error(&format!("Prompt failed: {e}"));
                    return ExitCode::GeneralError;
                }
            },
        };

        let options = ClientOptions {
            ca_bundle: config.ca_bundle.clone(),
            ..Default::default()
        };
        let client = match DropboxClient::with_options(&raw, options) {
            Ok(c) => c,
            Err(e) => {
                formatter.error(&e.to_string());
                if token_from_flag {
                    return ExitCode::from(&e);
                }
                continue;
            }
        };

        match client.account_info().await {
            Ok(account) => {
                let who = account
                    .display_name
                    .unwrap_or_else(|| account.account_id.clone());
                formatter.success(&format!("Authenticated as {who}"));
                config.access_token = Some(raw);
                break client;
            }
            Err(e @ Error::AuthExpired(_)) => {
                formatter.error("Access token has expired");
                if token_from_flag {
                    return ExitCode::from(&e);
                }
            }
            Err(e) => {
                formatter.error(&e.to_string());
                return ExitCode::from(&e);
            }
        }
    };

    // Local directory holding the built archives.
    let binary_from_flag = args.binary_path.is_some();
    loop {
        let candidate = match args.binary_path.take() {
            Some(p) => p,
            None => {
                let raw: String = match Input::new()
                    .with_prompt("Path containing .ipa files")
                    .interact_text()
                {
                    Ok(r) => r,
                    Err(e) => {
                        formatter.error(&format!("Prompt failed: {e}"));
                        return ExitCode::GeneralError;
                    }
                };
                PathBuf::from(raw)
            }
        };

        if candidate.is_dir() {
            config.binary_path = Some(candidate);
            break;
        }
        formatter.error("Invalid path");
        if binary_from_flag {
            return ExitCode::UsageError;
        }
    }

    // Remote storage folder, probed for existence and directory-ness.
    let storage_from_flag = args.storage_path.is_some();
    loop {
        let raw = match args.storage_path.take() {
            Some(p) => p,
            None => match Input::new()
                .with_prompt("Dropbox folder to store .ipa files")
                .default(config.storage_path.clone())
                .interact_text()
            {
                Ok(r) => r,
                Err(e) => {
                    formatter.error(&format!("Prompt failed: {e}"));
                    return ExitCode::GeneralError;
                }
            },
        };

        let path = RemotePath::new(&raw);
        if path.is_root() {
            formatter.error("Storage path cannot be the root folder");
            if storage_from_flag {
                return ExitCode::UsageError;
            }
            continue;
        }

        match client.metadata(&path).await {
            Ok(entry) if !entry.is_dir => {
                formatter.error("Target path is not a directory");
                if storage_from_flag {
                    return ExitCode::UsageError;
                }
                continue;
            }
            Ok(_) => {}
            Err(e) if e.is_not_found() => {
                formatter.println("Folder does not exist yet; it will be created on first deploy");
            }
            Err(e) => {
                formatter.error(&e.to_string());
                return ExitCode::from(&e);
            }
        }

        config.storage_path = path.as_str().to_string();
        break;
    }

    if let Err(e) = manager.save(&config) {
        formatter.error(&format!("Failed to save configuration: {e}"));
        return ExitCode::from(&e);
    }

    if formatter.is_json() {
        formatter.json(&serde_json::json!({
            "configured": true,
            "storage_path": config.storage_path,
        }));
    } else {
        formatter.success("Setup finished");
    }
    ExitCode::Success
}

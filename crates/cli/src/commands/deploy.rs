//! deploy command - Upload a build and print its install link
//!
//! The deployment layout under the storage folder is
//! `<storage>/<title>/<version>/` holding the .ipa and its
//! `manifest.plist`, plus an `index.html` history page per app listing all
//! deployed versions newest-first.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use bytes::Bytes;
use indicatif::{ProgressBar, ProgressStyle};
use ipd_core::{Config, ConfigManager, EntryInfo, Error, RemotePath, RemoteStore, Result};
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::manifest::{self, BuildInfo, HistoryEntry};
use crate::output::{Formatter, OutputConfig};

/// Arguments for the deploy command
#[derive(clap::Args, Debug)]
#[command(disable_version_flag = true)]
pub struct DeployArgs {
    /// Archive to deploy (defaults to the newest .ipa in the configured binary path)
    #[arg(long)]
    pub ipa: Option<PathBuf>,

    /// Remote folder override for this run
    #[arg(long)]
    pub storage_path: Option<String>,

    /// Display title (defaults to the archive file stem)
    #[arg(long)]
    pub title: Option<String>,

    /// iOS bundle identifier (defaults to com.example.<title>)
    #[arg(long)]
    pub bundle_id: Option<String>,

    /// Bundle version
    #[arg(long, default_value = "1.0")]
    pub version: String,
}

#[derive(Serialize)]
struct DeployOutput {
    title: String,
    version: String,
    remote_path: String,
    install_url: String,
    history_url: String,
}

/// Execute the deploy command
pub async fn execute(args: DeployArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let config = match load_config(&formatter) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let client = match super::client_from_config(&config) {
        Ok(c) => c,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::from(&e);
        }
    };

    // Validate the token before anything else touches the network.
    formatter.println("Validating access token...");
    let account = match client.account_info().await {
        Ok(a) => a,
        Err(e @ Error::AuthExpired(_)) => {
            formatter.error("Access token has expired. Run \"ipd setup\" again.");
            return ExitCode::from(&e);
        }
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::from(&e);
        }
    };

    let storage = RemotePath::new(
        args.storage_path
            .as_deref()
            .unwrap_or(&config.storage_path),
    );

    formatter.println(&format!("Validating storage path [{storage}]..."));
    match client.metadata(&storage).await {
        Ok(entry) if !entry.is_dir => {
            formatter.error("Target path is not a directory");
            return ExitCode::UsageError;
        }
        Ok(_) => {}
        Err(e) if e.is_not_found() => {} // created by the first upload
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::from(&e);
        }
    }

    let ipa_path = match args.ipa.clone().map(Ok).unwrap_or_else(|| {
        let dir = config
            .binary_path
            .as_deref()
            .ok_or_else(|| Error::Config("no binary path configured".into()))?;
        newest_ipa(dir)
    }) {
        Ok(p) => p,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::from(&e);
        }
    };

    let file_name = match ipa_path.file_name().and_then(|n| n.to_str()) {
        Some(n) => n.to_string(),
        None => {
            formatter.error(&format!("Invalid archive path: {}", ipa_path.display()));
            return ExitCode::UsageError;
        }
    };
    let title = args.title.clone().unwrap_or_else(|| {
        file_name.trim_end_matches(".ipa").to_string()
    });
    let build = BuildInfo {
        bundle_id: args
            .bundle_id
            .clone()
            .unwrap_or_else(|| format!("com.example.{}", slug(&title))),
        title,
        version: args.version.clone(),
    };

    let content = match std::fs::read(&ipa_path) {
        Ok(c) => c,
        Err(e) => {
            formatter.error(&format!("Failed to read {}: {e}", ipa_path.display()));
            return ExitCode::GeneralError;
        }
    };

    let spinner = spinner(&formatter, &format!("Uploading {file_name}..."));

    let app_folder = storage.join(&build.title);
    let version_folder = app_folder.join(&build.version);
    let result = push_build(
        &client,
        &account.account_id,
        &version_folder,
        &app_folder,
        &build,
        &file_name,
        Bytes::from(content),
    )
    .await;

    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    match result {
        Ok(output) => {
            if formatter.is_json() {
                formatter.json(&output);
            } else {
                formatter.success(&format!("Deployed {} {}", output.title, output.version));
                formatter.println(&format!("Install link : {}", output.install_url));
                formatter.println(&format!("History page : {}", output.history_url));
            }
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&e.to_string());
            ExitCode::from(&e)
        }
    }
}

/// Upload the archive, its manifest, and the refreshed history page
async fn push_build(
    client: &impl RemoteStore,
    account_id: &str,
    version_folder: &RemotePath,
    app_folder: &RemotePath,
    build: &BuildInfo,
    file_name: &str,
    content: Bytes,
) -> Result<DeployOutput> {
    let ipa_remote = version_folder.join(file_name);
    client.put_file(&ipa_remote, content).await?;

    let ipa_url = manifest::public_url(account_id, &ipa_remote)?;
    let plist = manifest::render_manifest(build, &ipa_url);
    let manifest_remote = version_folder.join("manifest.plist");
    client
        .put_file(&manifest_remote, Bytes::from(plist))
        .await?;

    // Remote listing is oldest-first; the page shows newest first.
    let versions = client.list_folder(app_folder).await?;
    let entries = history_entries(account_id, app_folder, build, &versions)?;
    let html = manifest::render_history(&entries);
    let history_remote = app_folder.join("index.html");
    client
        .put_file(&history_remote, Bytes::from(html))
        .await?;

    let manifest_url = manifest::public_url(account_id, &manifest_remote)?;
    let history_url = manifest::public_url(account_id, &history_remote)?;
    Ok(DeployOutput {
        title: build.title.clone(),
        version: build.version.clone(),
        remote_path: ipa_remote.as_str().to_string(),
        install_url: manifest::install_link(&manifest_url),
        history_url: history_url.to_string(),
    })
}

/// Map the version folders of one app to history rows, newest first
fn history_entries(
    account_id: &str,
    app_folder: &RemotePath,
    build: &BuildInfo,
    listing: &[EntryInfo],
) -> Result<Vec<HistoryEntry>> {
    let mut entries = Vec::new();
    for version in listing.iter().rev().filter(|e| e.is_dir) {
        let manifest_remote = app_folder.join(&version.name).join("manifest.plist");
        let manifest_url = manifest::public_url(account_id, &manifest_remote)?;
        entries.push(HistoryEntry {
            title: format!("{} {}", build.title, version.name),
            install_url: manifest::install_link(&manifest_url),
            deployed_at: version
                .modified
                .map(|ts| ts.strftime("%Y-%m-%d %H:%M").to_string()),
        });
    }
    Ok(entries)
}

fn load_config(formatter: &Formatter) -> std::result::Result<Config, ExitCode> {
    let manager = ConfigManager::new().map_err(|e| {
        formatter.error(&e.to_string());
        ExitCode::from(&e)
    })?;
    let config = manager.load().map_err(|e| {
        formatter.error(&format!("Failed to load configuration: {e}"));
        ExitCode::from(&e)
    })?;

    if config.access_token.is_none() {
        formatter.error("Setup required. Run \"ipd setup\" first.");
        return Err(ExitCode::UsageError);
    }
    Ok(config)
}

/// The most recently modified .ipa in a directory
fn newest_ipa(dir: &Path) -> Result<PathBuf> {
    let mut newest: Option<(SystemTime, PathBuf)> = None;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_ipa = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("ipa"))
            .unwrap_or(false);
        if !is_ipa {
            continue;
        }
        let modified = entry.metadata()?.modified()?;
        if newest.as_ref().map(|(t, _)| modified > *t).unwrap_or(true) {
            newest = Some((modified, path));
        }
    }
    newest.map(|(_, p)| p).ok_or_else(|| {
        Error::Config(format!("no .ipa archives found in {}", dir.display()))
    })
}

fn slug(title: &str) -> String {
    let slug: String = title
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    if slug.is_empty() {
        "app".to_string()
    } else {
        slug
    }
}

fn spinner(formatter: &Formatter, message: &str) -> Option<ProgressBar> {
    if formatter.is_json() || formatter.is_quiet() {
        return None;
    }
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    Some(spinner)
}

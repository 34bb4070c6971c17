//! Installation manifest and history page generation
//!
//! A device installs an ad-hoc build by following an `itms-services://`
//! link that points at a plist manifest describing the hosted .ipa. The
//! history page is a static HTML listing of every deployed build, newest
//! first, with one install link per build.

use ipd_core::{RemotePath, Result};
use url::Url;

/// Host serving public file content for an account
pub const PUBLIC_CONTENT_HOST: &str = "https://dl.dropboxusercontent.com";

/// Identity of one deployable build
#[derive(Debug, Clone)]
pub struct BuildInfo {
    /// Display title shown during installation
    pub title: String,
    /// iOS bundle identifier
    pub bundle_id: String,
    /// Bundle version string
    pub version: String,
}

/// One row of the deployment history page
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    /// Build title (folder name)
    pub title: String,
    /// Install link for this build
    pub install_url: String,
    /// Modification timestamp, preformatted
    pub deployed_at: Option<String>,
}

/// Build the public URL for a deployed file
///
/// Files under `/Public` are served from the account's public content
/// namespace, addressed by the numeric part of the account identifier.
pub fn public_url(account_id: &str, path: &RemotePath) -> Result<Url> {
    let uid = account_id.strip_prefix("dbid:").unwrap_or(account_id);
    let mut url = Url::parse(PUBLIC_CONTENT_HOST)?;
    let rest = path
        .as_str()
        .strip_prefix("/Public")
        .unwrap_or(path.as_str());
    url.set_path(&format!("/u/{uid}{rest}"));
    Ok(url)
}

/// Build the `itms-services://` link a device follows to install
pub fn install_link(manifest_url: &Url) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(manifest_url.as_str().as_bytes()).collect();
    format!("itms-services://?action=download-manifest&url={encoded}")
}

/// Render the plist installation manifest for one build
pub fn render_manifest(build: &BuildInfo, ipa_url: &Url) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
  <key>items</key>
  <array>
    <dict>
      <key>assets</key>
      <array>
        <dict>
          <key>kind</key>
          <string>software-package</string>
          <key>url</key>
          <string>{ipa_url}</string>
        </dict>
      </array>
      <key>metadata</key>
      <dict>
        <key>bundle-identifier</key>
        <string>{bundle_id}</string>
        <key>bundle-version</key>
        <string>{version}</string>
        <key>kind</key>
        <string>software</string>
        <key>title</key>
        <string>{title}</string>
      </dict>
    </dict>
  </array>
</dict>
</plist>
"#,
        ipa_url = xml_escape(ipa_url.as_str()),
        bundle_id = xml_escape(&build.bundle_id),
        version = xml_escape(&build.version),
        title = xml_escape(&build.title),
    )
}

/// Render the HTML deployment history page
///
/// Entries are emitted in the order given; the caller passes them newest
/// first.
pub fn render_history(entries: &[HistoryEntry]) -> String {
    let mut rows = String::new();
    for entry in entries {
        let deployed = entry.deployed_at.as_deref().unwrap_or("");
        rows.push_str(&format!(
            "    <li><a href=\"{href}\">{title}</a> <span class=\"date\">{deployed}</span></li>\n",
            href = xml_escape(&entry.install_url),
            title = xml_escape(&entry.title),
            deployed = xml_escape(deployed),
        ));
    }

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>Deployment history</title>
  <style>
    body {{ font-family: -apple-system, sans-serif; margin: 2em; }}
    li {{ margin: 0.5em 0; }}
    .date {{ color: #888; font-size: 0.9em; }}
  </style>
</head>
<body>
  <h1>Deployment history</h1>
  <ul>
{rows}  </ul>
</body>
</html>
"#
    )
}

fn xml_escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build() -> BuildInfo {
        BuildInfo {
            title: "My App".into(),
            bundle_id: "com.example.myapp".into(),
            version: "1.0".into(),
        }
    }

    #[test]
    fn test_public_url_maps_public_prefix() {
        let url = public_url(
            "dbid:12345",
            &RemotePath::new("/Public/Deployment/App/1.0/app.ipa"),
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://dl.dropboxusercontent.com/u/12345/Deployment/App/1.0/app.ipa"
        );
    }

    #[test]
    fn test_public_url_without_public_prefix() {
        let url = public_url("12345", &RemotePath::new("/Deployment/app.ipa")).unwrap();
        assert_eq!(
            url.as_str(),
            "https://dl.dropboxusercontent.com/u/12345/Deployment/app.ipa"
        );
    }

    #[test]
    fn test_install_link_encodes_manifest_url() {
        let manifest = Url::parse("https://dl.dropboxusercontent.com/u/1/App/manifest.plist").unwrap();
        let link = install_link(&manifest);
        assert!(link.starts_with("itms-services://?action=download-manifest&url="));
        assert!(link.contains("https%3A%2F%2Fdl.dropboxusercontent.com"));
    }

    #[test]
    fn test_manifest_contains_build_fields() {
        let ipa = Url::parse("https://dl.dropboxusercontent.com/u/1/App/1.0/app.ipa").unwrap();
        let plist = render_manifest(&build(), &ipa);
        assert!(plist.contains("<string>software-package</string>"));
        assert!(plist.contains("<string>com.example.myapp</string>"));
        assert!(plist.contains("<string>1.0</string>"));
        assert!(plist.contains("<string>My App</string>"));
        assert!(plist.contains(ipa.as_str()));
    }

    #[test]
    fn test_manifest_escapes_xml() {
        let mut info = build();
        info.title = "Fish & Chips <beta>".into();
        let ipa = Url::parse("https://example.com/app.ipa").unwrap();
        let plist = render_manifest(&info, &ipa);
        assert!(plist.contains("Fish &amp; Chips &lt;beta&gt;"));
        assert!(!plist.contains("<beta>"));
    }

    #[test]
    fn test_history_preserves_given_order() {
        let entries = vec![
            HistoryEntry {
                title: "2.0".into(),
                install_url: "itms-services://?action=download-manifest&url=x".into(),
                deployed_at: Some("2026-08-25".into()),
            },
            HistoryEntry {
                title: "1.0".into(),
                install_url: "itms-services://?action=download-manifest&url=y".into(),
                deployed_at: None,
            },
        ];
        let html = render_history(&entries);
        let newest = html.find("2.0").unwrap();
        let oldest = html.find("1.0").unwrap();
        assert!(newest < oldest);
        assert!(html.contains("Deployment history"));
    }
}

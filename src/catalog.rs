//! Release catalog client
//!
//! Lists the releases of an `owner/repo` source and resolves a configured app
//! (release tag + asset name) into an [`AcquisitionRequest`].

use crate::config::{AppConfig, CatalogConfig, DownloadConfig};
use crate::error::{Error, NetworkError, Result};
use crate::types::AcquisitionRequest;
use crate::validation::SourceIdentifier;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A downloadable file attached to a release
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseAsset {
    /// File name
    pub name: String,
    /// Direct download URL
    #[serde(rename = "browser_download_url")]
    pub url: String,
}

/// One published release
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// Release tag
    #[serde(rename = "tag_name")]
    pub tag: String,
    /// Attached files
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
    /// Release notes
    #[serde(rename = "body", default)]
    pub notes: Option<String>,
}

impl Release {
    /// Asset with exactly this name
    pub fn find_asset(&self, name: &str) -> Option<&ReleaseAsset> {
        self.assets.iter().find(|asset| asset.name == name)
    }

    /// Version advertised for `app_name` in the release notes
    ///
    /// Notes list apps as `app: <name>` lines, each followed by a
    /// `version: <version>` line. Keys and app names match case-insensitively.
    pub fn version_for(&self, app_name: &str) -> Option<String> {
        let notes = self.notes.as_deref()?;
        let mut in_app = false;
        for line in notes.lines() {
            let line = line.trim();
            if let Some(app) = strip_key(line, "app:") {
                in_app = app.eq_ignore_ascii_case(app_name);
            } else if in_app && let Some(version) = strip_key(line, "version:") {
                return Some(version.to_string());
            }
        }
        None
    }
}

fn strip_key<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let head = line.get(..key.len())?;
    head.eq_ignore_ascii_case(key)
        .then(|| line[key.len()..].trim())
}

/// Release with exactly this tag
pub fn find_release<'a>(releases: &'a [Release], tag: &str) -> Option<&'a Release> {
    releases.iter().find(|release| release.tag == tag)
}

/// Resolve an app's configured release tag and asset into a download request
pub fn plan_acquisition(app: &AppConfig, releases: &[Release]) -> Result<AcquisitionRequest> {
    let release = find_release(releases, &app.github.release_tag).ok_or_else(|| {
        Error::validation(
            "release_tag",
            format!("release '{}' not found", app.github.release_tag),
        )
    })?;
    let asset = release.find_asset(&app.github.asset_name).ok_or_else(|| {
        Error::validation(
            "asset_name",
            format!(
                "asset '{}' not found in release '{}'",
                app.github.asset_name, release.tag
            ),
        )
    })?;

    Ok(AcquisitionRequest {
        url: asset.url.clone(),
        package_id: app.package_name.clone(),
        relative_path: app.target_path.clone(),
        expected_digest: app.github.expected_sha256.clone(),
    })
}

/// Source of published releases
#[async_trait]
pub trait ReleaseCatalog: Send + Sync {
    /// List the releases of `source`
    ///
    /// # Errors
    ///
    /// [`Error::Network`] with the HTTP status for 404 (not found), 403/429
    /// (rate limited) and 5xx (server error), or a transport failure;
    /// [`Error::Serialization`] when the listing is not valid release JSON.
    async fn list_releases(&self, source: &SourceIdentifier) -> Result<Vec<Release>>;
}

/// GitHub REST API release catalog
pub struct GitHubReleaseCatalog {
    client: reqwest::Client,
    api_base: String,
}

impl GitHubReleaseCatalog {
    /// Build a catalog client sharing the download timeouts
    pub fn new(catalog: &CatalogConfig, download: &DownloadConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(download.connect_timeout)
            .timeout(download.connect_timeout + download.read_timeout)
            .user_agent(download.user_agent.as_str())
            .build()?;
        Ok(Self {
            client,
            api_base: catalog.api_base.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ReleaseCatalog for GitHubReleaseCatalog {
    async fn list_releases(&self, source: &SourceIdentifier) -> Result<Vec<Release>> {
        let url = format!(
            "{}/repos/{}/{}/releases",
            self.api_base,
            source.owner(),
            source.name()
        );
        debug!(%url, "fetching releases");

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(%source, status = status.as_u16(), "release listing failed");
            return Err(NetworkError::Status {
                status: status.as_u16(),
            }
            .into());
        }

        let body = response.text().await?;
        let releases: Vec<Release> = serde_json::from_str(&body)?;
        debug!(%source, count = releases.len(), "fetched releases");
        Ok(releases)
    }
}

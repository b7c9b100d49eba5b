//! Provider configuration download
//!
//! A provider publishes its host definition files as a zip archive inside
//! versioned folders of a directory listing (`<base>/v2.6.0-1/configs.zip`).
//! Refreshing fetches the newest archive and replaces the local directory
//! with its contents.

use super::VpnProvider;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use regex::Regex;
use reqwest::Client;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use url::Url;

/// Timeout for fetching a provider's version listing
const LISTING_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for fetching the archive itself
const ARCHIVE_TIMEOUT: Duration = Duration::from_secs(60);

/// Archive file name inside each version folder
pub const ARCHIVE_NAME: &str = "configs.zip";

const DOWNLOAD_TEMPLATE: &str = "Downloading {msg} [{bar:40}] {bytes}/{total_bytes}";

/// Version folder name in a provider listing, such as `v2.6.0-1`.
///
/// Orders by major, minor, patch, then build; a missing build counts as 0.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ConfigVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub build: u32,
    /// Folder name as listed, used to build the archive URL
    pub name: String,
}

impl ConfigVersion {
    /// Parse a listed folder name; `None` if it is not a version folder
    pub fn parse(name: &str) -> Option<Self> {
        let pattern = Regex::new(r"^v(\d+)\.(\d+)\.(\d+)(?:-(\d+))?").ok()?;
        let captures = pattern.captures(name)?;
        let number = |index: usize| -> Option<u32> {
            match captures.get(index) {
                Some(m) => m.as_str().parse().ok(),
                None => Some(0),
            }
        };

        Some(Self {
            major: number(1)?,
            minor: number(2)?,
            patch: number(3)?,
            build: number(4)?,
            name: name.to_string(),
        })
    }
}

/// Version folder names linked from the table rows of a listing page
pub fn listed_versions(html: &str) -> Vec<String> {
    let (Ok(rows), Ok(links)) = (
        Regex::new(r"(?is)<tr\b.*?</tr>"),
        Regex::new(r#"(?i)<a\s[^>]*href\s*=\s*["']([^"']+)["']"#),
    ) else {
        return Vec::new();
    };

    rows.find_iter(html)
        .flat_map(|row| links.captures_iter(row.as_str()))
        .filter_map(|captures| captures.get(1).map(|href| folder_name(href.as_str())))
        .filter(|name| ConfigVersion::parse(name).is_some())
        .collect()
}

/// Last path component of a listing link
fn folder_name(href: &str) -> String {
    let trimmed = href.trim_end_matches("/index.html").trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed).to_string()
}

/// What a refresh did
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadSummary {
    pub version: String,
    pub files_extracted: usize,
    pub directory: PathBuf,
}

/// Result of asking for a provider refresh
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadOutcome {
    Downloaded(DownloadSummary),
    /// No downloader is registered for this provider key
    Unsupported(String),
}

/// Fetches a provider's host definition files into a local directory
#[async_trait]
pub trait ConfigDownloader: Send + Sync {
    /// Replace `directory` with the newest files published under `base_url`
    async fn download_configs(&self, directory: &Path, base_url: &str) -> Result<DownloadSummary>;
}

/// Downloader for IPVanish's versioned archive listing
pub struct IpVanishDownloader {
    client: Client,
    show_progress: bool,
}

impl IpVanishDownloader {
    pub fn new(show_progress: bool) -> Result<Self> {
        let client = Client::builder()
            .user_agent(format!("{}/{}", crate::PKG_NAME, crate::VERSION))
            .build()
            .map_err(|e| AppError::download(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, show_progress })
    }

    /// Newest version folder listed under `base_url`
    pub async fn find_latest_version(&self, base_url: &Url) -> Result<ConfigVersion> {
        let response = self
            .client
            .get(base_url.clone())
            .timeout(LISTING_TIMEOUT)
            .send()
            .await
            .map_err(|e| AppError::download(format!("Failed to fetch listing from '{}': {}", base_url, e)))?;

        if !response.status().is_success() {
            return Err(AppError::download(format!(
                "Failed to fetch listing: HTTP {} from '{}'",
                response.status(),
                base_url
            )));
        }

        let html = response.text().await?;
        listed_versions(&html)
            .iter()
            .filter_map(|name| ConfigVersion::parse(name))
            .max()
            .ok_or_else(|| AppError::download(format!("No versions found at {}", base_url)))
    }

    /// Stream `url` into `destination`, removing a partial file on failure
    pub async fn download_file(&self, url: &Url, destination: &Path) -> Result<u64> {
        let written = self.stream_to_file(url, destination).await;
        if written.is_err() {
            let _ = tokio::fs::remove_file(destination).await;
        }
        written
    }

    async fn stream_to_file(&self, url: &Url, destination: &Path) -> Result<u64> {
        let response = self
            .client
            .get(url.clone())
            .timeout(ARCHIVE_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;

        let progress = self.progress_bar(response.content_length(), url);
        let mut file = tokio::fs::File::create(destination).await?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
            progress.set_position(written);
        }
        file.flush().await?;
        progress.finish_and_clear();

        Ok(written)
    }

    fn progress_bar(&self, length: Option<u64>, url: &Url) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::with_draw_target(length, ProgressDrawTarget::hidden());
        }

        let bar = ProgressBar::new(length.unwrap_or(0));
        if let Ok(style) = ProgressStyle::with_template(DOWNLOAD_TEMPLATE) {
            bar.set_style(style.progress_chars("=> "));
        }
        bar.set_message(url.path().rsplit('/').next().unwrap_or(ARCHIVE_NAME).to_string());
        bar
    }
}

#[async_trait]
impl ConfigDownloader for IpVanishDownloader {
    async fn download_configs(&self, directory: &Path, base_url: &str) -> Result<DownloadSummary> {
        let base = listing_url(base_url)?;
        let version = self.find_latest_version(&base).await?;
        let archive_url = base
            .join(&format!("{}/{}", version.name, ARCHIVE_NAME))
            .map_err(|e| AppError::download(format!("Invalid archive URL: {}", e)))?;

        let archive = archive_path(directory);
        let replaced = async {
            self.download_file(&archive_url, &archive).await?;
            purge_directory(directory).await?;
            tokio::fs::create_dir_all(directory).await?;
            extract_archive(&archive, directory).await
        }
        .await;

        // The archive never outlives the refresh
        let _ = tokio::fs::remove_file(&archive).await;

        Ok(DownloadSummary {
            version: version.name,
            files_extracted: replaced?,
            directory: directory.to_path_buf(),
        })
    }
}

/// Downloader registered for `provider`
pub fn downloader_for(provider: VpnProvider, show_progress: bool) -> Result<Box<dyn ConfigDownloader>> {
    match provider {
        VpnProvider::IpVanish => Ok(Box::new(IpVanishDownloader::new(show_progress)?)),
    }
}

/// Refresh `directory` for the provider named `provider_key`.
///
/// An unknown key is not an error here; it yields [`DownloadOutcome::Unsupported`]
/// so the caller can carry on with the files already on disk.
pub async fn download_provider_configs(
    provider_key: &str,
    base_url: &str,
    directory: &Path,
    show_progress: bool,
) -> Result<DownloadOutcome> {
    let provider = match provider_key.parse::<VpnProvider>() {
        Ok(provider) => provider,
        Err(_) => return Ok(DownloadOutcome::Unsupported(provider_key.trim().to_string())),
    };

    let downloader = downloader_for(provider, show_progress)?;
    let summary = downloader.download_configs(directory, base_url).await?;
    Ok(DownloadOutcome::Downloaded(summary))
}

/// Parse a listing URL, making sure it ends in `/` so joins stay below it
fn listing_url(base_url: &str) -> Result<Url> {
    let trimmed = base_url.trim();
    let normalized = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    };
    Url::parse(&normalized).map_err(|e| AppError::download(format!("Invalid download URL '{}': {}", base_url, e)))
}

/// Archive location next to `directory`
fn archive_path(directory: &Path) -> PathBuf {
    let name = directory
        .file_name()
        .map(|name| format!(".{}-{}", name.to_string_lossy(), ARCHIVE_NAME))
        .unwrap_or_else(|| format!(".{}", ARCHIVE_NAME));
    directory.with_file_name(name)
}

/// Remove `directory` and everything in it, if it exists
pub async fn purge_directory(directory: &Path) -> Result<()> {
    match tokio::fs::remove_dir_all(directory).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(AppError::io(format!("Failed to remove {}: {}", directory.display(), e))),
    }
}

/// Unpack `archive` into `directory` and return the number of files in it
pub async fn extract_archive(archive: &Path, directory: &Path) -> Result<usize> {
    let archive = archive.to_path_buf();
    let directory = directory.to_path_buf();

    tokio::task::spawn_blocking(move || -> Result<usize> {
        let mut zip = zip::ZipArchive::new(File::open(&archive)?)?;
        let mut files = 0;
        for index in 0..zip.len() {
            if !zip.by_index(index)?.is_dir() {
                files += 1;
            }
        }
        zip.extract(&directory)?;
        Ok(files)
    })
    .await
    .map_err(|e| AppError::internal(format!("Archive extraction task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use wiremock::{
        matchers::{method, path},
        Mock, MockServer, ResponseTemplate,
    };
    use zip::write::SimpleFileOptions;

    const LISTING: &str = r#"<html><body><table>
        <tr><th>Name</th></tr>
        <tr><td><a href="../">Parent Directory</a></td></tr>
        <tr><td><a href="v2.5.9/">v2.5.9/</a></td></tr>
        <tr><td><a href="/openvpn/v2.6.0-0/index.html">v2.6.0-0</a></td></tr>
        <tr><td><a href="v2.6.0-2/">v2.6.0-2/</a></td></tr>
        <tr><td><a href="v2.6.0-10/">v2.6.0-10/</a></td></tr>
        <tr><td><a href="latest.txt">latest.txt</a></td></tr>
        </table><a href="v9.9.9/">outside the table</a></body></html>"#;

    fn archive_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        writer.add_directory("nested/", SimpleFileOptions::default()).unwrap();
        for (name, body) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_version_ordering() {
        let older = ConfigVersion::parse("v2.6.0").unwrap();
        let build = ConfigVersion::parse("v2.6.0-2").unwrap();
        let newer = ConfigVersion::parse("v2.6.0-10").unwrap();

        assert_eq!(older.build, 0);
        assert_eq!(newer.build, 10);
        assert!(older < build);
        assert!(build < newer);
        assert!(ConfigVersion::parse("v10.0.0").unwrap() > newer);
        assert_eq!(ConfigVersion::parse("latest"), None);
        assert_eq!(ConfigVersion::parse("2.6.0"), None);
    }

    #[test]
    fn test_listing_links_inside_table_rows() {
        let versions = listed_versions(LISTING);
        assert_eq!(versions, vec!["v2.5.9", "v2.6.0-0", "v2.6.0-2", "v2.6.0-10"]);
    }

    #[test]
    fn test_listing_url_gets_trailing_slash() {
        let url = listing_url("https://configs.example/openvpn").unwrap();
        assert_eq!(url.as_str(), "https://configs.example/openvpn/");
        assert!(listing_url("not a url").is_err());
    }

    #[test]
    fn test_archive_sits_beside_directory() {
        assert_eq!(archive_path(Path::new("/srv/IPVanish")), PathBuf::from("/srv/.IPVanish-configs.zip"));
    }

    #[tokio::test]
    async fn test_extract_counts_files() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("configs.zip");
        std::fs::write(&archive, archive_bytes(&[("a.ovpn", "remote a 443"), ("nested/b.ovpn", "remote b")])).unwrap();

        let target = dir.path().join("out");
        let files = extract_archive(&archive, &target).await.unwrap();

        assert_eq!(files, 2);
        assert!(target.join("a.ovpn").exists());
        assert!(target.join("nested/b.ovpn").exists());
    }

    #[tokio::test]
    async fn test_extract_rejects_non_archive() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("configs.zip");
        std::fs::write(&archive, "<html>not found</html>").unwrap();

        let error = extract_archive(&archive, &dir.path().join("out")).await.unwrap_err();
        assert!(matches!(error, AppError::Download(_)));
    }

    #[tokio::test]
    async fn test_purge_missing_directory_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("IPVanish");
        std::fs::create_dir_all(existing.join("old")).unwrap();

        purge_directory(&existing).await.unwrap();
        purge_directory(&existing).await.unwrap();
        assert!(!existing.exists());
    }

    #[tokio::test]
    async fn test_download_replaces_directory_with_latest_archive() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/openvpn/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(LISTING))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/openvpn/v2.6.0-10/configs.zip"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(archive_bytes(&[(
                "ipvanish-CH-Zurich-zrh-c18.ovpn",
                "remote zrh-c18.ipvanish.com 443",
            )])))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let directory = dir.path().join("IPVanish");
        std::fs::create_dir_all(&directory).unwrap();
        std::fs::write(directory.join("stale.ovpn"), "remote stale 443").unwrap();

        let base_url = format!("{}/openvpn", server.uri());
        let outcome = download_provider_configs("ipvanish", &base_url, &directory, false)
            .await
            .unwrap();

        match outcome {
            DownloadOutcome::Downloaded(summary) => {
                assert_eq!(summary.version, "v2.6.0-10");
                assert_eq!(summary.files_extracted, 1);
            }
            other => panic!("expected a download, got {:?}", other),
        }
        assert!(directory.join("ipvanish-CH-Zurich-zrh-c18.ovpn").exists());
        assert!(!directory.join("stale.ovpn").exists());
        assert!(!archive_path(&directory).exists());
    }

    #[tokio::test]
    async fn test_failed_archive_keeps_existing_files() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/openvpn/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(LISTING))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/openvpn/v2.6.0-10/configs.zip"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let directory = dir.path().join("IPVanish");
        std::fs::create_dir_all(&directory).unwrap();
        std::fs::write(directory.join("kept.ovpn"), "remote kept 443").unwrap();

        let downloader = IpVanishDownloader::new(false).unwrap();
        let result = downloader
            .download_configs(&directory, &format!("{}/openvpn/", server.uri()))
            .await;

        assert!(matches!(result, Err(AppError::Download(_))));
        assert!(directory.join("kept.ovpn").exists());
        assert!(!archive_path(&directory).exists());
    }

    #[tokio::test]
    async fn test_empty_listing_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<table></table>"))
            .mount(&server)
            .await;

        let downloader = IpVanishDownloader::new(false).unwrap();
        let base = listing_url(&server.uri()).unwrap();
        let error = downloader.find_latest_version(&base).await.unwrap_err();

        assert!(error.to_string().contains("No versions found"));
    }

    #[tokio::test]
    async fn test_unknown_provider_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = download_provider_configs("nordvpn", "https://configs.example/", dir.path(), false)
            .await
            .unwrap();

        assert_eq!(outcome, DownloadOutcome::Unsupported("nordvpn".to_string()));
    }
}

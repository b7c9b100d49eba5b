//! Host definition file discovery
//!
//! Scans a directory of OpenVPN `.ovpn` files and turns each readable file
//! with a `remote` line into a [`HostTarget`].

pub mod countries;

pub use countries::country_name;

use crate::{
    error::{AppError, Result},
    providers::FileNamingRule,
    types::HostTarget,
};
use std::fs;
use std::path::{Path, PathBuf};

/// File extension of host definition files
pub const HOST_FILE_EXTENSION: &str = "ovpn";

/// A host definition file that could not be used
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedFile {
    pub file_name: String,
    pub reason: String,
}

/// Targets found in a directory plus the files that were skipped
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    pub targets: Vec<HostTarget>,
    pub skipped: Vec<SkippedFile>,
    /// Number of `.ovpn` files seen
    pub files_found: usize,
}

/// Discover host targets in `directory`.
///
/// Files are visited in file-name order so batches are reproducible. The
/// file name becomes the target id and the naming rule supplies the region.
pub fn discover_hosts(directory: &Path, rule: &FileNamingRule) -> Result<Discovery> {
    if !directory.is_dir() {
        return Err(AppError::discovery(format!(
            "Directory {} does not exist",
            directory.display()
        )));
    }

    let mut files: Vec<PathBuf> = fs::read_dir(directory)
        .map_err(|e| AppError::discovery(format!("Cannot read {}: {}", directory.display(), e)))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| is_host_file(path))
        .collect();
    files.sort();

    let mut discovery = Discovery { files_found: files.len(), ..Discovery::default() };

    for path in files {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        match read_remote_host(&path) {
            Ok(Some(hostname)) => {
                let region_tag = rule.region_tag(&file_name);
                discovery.targets.push(HostTarget::new(file_name, hostname, region_tag));
            }
            Ok(None) => discovery.skipped.push(SkippedFile {
                file_name,
                reason: "No 'remote' line found".to_string(),
            }),
            Err(e) => discovery.skipped.push(SkippedFile {
                file_name,
                reason: format!("Could not read file: {}", e),
            }),
        }
    }

    Ok(discovery)
}

fn is_host_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case(HOST_FILE_EXTENSION))
            .unwrap_or(false)
}

fn read_remote_host(path: &Path) -> Result<Option<String>> {
    let bytes = fs::read(path)?;
    Ok(parse_remote_host(&String::from_utf8_lossy(&bytes)))
}

/// Hostname from the first `remote <host> [port] [proto]` directive
pub fn parse_remote_host(content: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let mut parts = line.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some("remote"), Some(host)) => Some(host.to_string()),
            _ => None,
        }
    })
}

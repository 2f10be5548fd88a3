//! Marker files for checking volume mounts
//!
//! Creates randomly named files under a directory and lists what is there, so
//! an operator can tell whether a path survives pod restarts (persistent
//! volume) or not (pod-local volume). Failures are logged and the caller
//! still gets a best-effort listing.

use crate::observability::StructuredLogger;
use rand::Rng;
use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;

/// Length of the random part of a marker file name
pub const MARKER_NAME_LEN: usize = 10;

const MARKER_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Error)]
pub enum VolumeError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create file {path}: {source}")]
    CreateFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Random marker file name: ten lowercase letters plus `.txt`
pub fn marker_file_name() -> String {
    let mut rng = rand::rng();
    let stem: String = (0..MARKER_NAME_LEN)
        .map(|_| MARKER_ALPHABET[rng.random_range(0..MARKER_ALPHABET.len())] as char)
        .collect();
    format!("{}.txt", stem)
}

/// Creates and lists marker files under one directory
#[derive(Debug, Clone)]
pub struct MarkerVolume {
    dir: PathBuf,
    logger: StructuredLogger,
}

impl MarkerVolume {
    pub fn new(dir: impl Into<PathBuf>, logger: StructuredLogger) -> Self {
        Self {
            dir: dir.into(),
            logger,
        }
    }

    /// Create one marker file, then return the directory listing
    pub async fn create_marker(&self) -> String {
        match self.try_create_marker().await {
            Ok(path) => self.logger.log_marker_file_created(&path.display().to_string()),
            Err(e) => warn!(error = %e, "Marker file not created"),
        }
        self.listing().await
    }

    /// Space-separated file names, descending by name; empty on error
    pub async fn listing(&self) -> String {
        match self.try_list().await {
            Ok(names) => names.join(" "),
            Err(e) => {
                warn!(error = %e, "Marker directory not readable");
                String::new()
            }
        }
    }

    async fn try_create_marker(&self) -> Result<PathBuf, VolumeError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| VolumeError::CreateDir {
                path: self.dir.clone(),
                source,
            })?;

        let path = self.dir.join(marker_file_name());
        tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|source| VolumeError::CreateFile {
                path: path.clone(),
                source,
            })?;

        Ok(path)
    }

    async fn try_list(&self) -> Result<Vec<String>, VolumeError> {
        let read_err = |source| VolumeError::ReadDir {
            path: self.dir.clone(),
            source,
        };

        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(read_err)?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(read_err)? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }

        names.sort_unstable_by(|a, b| b.cmp(a));
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn volume(dir: impl Into<PathBuf>) -> MarkerVolume {
        MarkerVolume::new(dir, StructuredLogger::new("test-node"))
    }

    fn is_marker_name(name: &str) -> bool {
        match name.strip_suffix(".txt") {
            Some(stem) => {
                stem.len() == MARKER_NAME_LEN && stem.bytes().all(|b| b.is_ascii_lowercase())
            }
            None => false,
        }
    }

    #[test]
    fn test_marker_file_name_shape() {
        for _ in 0..50 {
            let name = marker_file_name();
            assert!(is_marker_name(&name), "bad marker name {}", name);
        }
    }

    #[tokio::test]
    async fn test_create_twice_lists_two_markers() {
        let tmp = tempfile::tempdir().unwrap();
        let volume = volume(tmp.path().join("pv"));

        let first = volume.create_marker().await;
        assert_eq!(first.split(' ').count(), 1);

        let second = volume.create_marker().await;
        let names: Vec<&str> = second.split(' ').collect();
        assert_eq!(names.len(), 2);
        assert_ne!(names[0], names[1]);
        assert!(names.iter().all(|n| is_marker_name(n)));
        assert!(names[0] > names[1], "listing should be in descending order");
    }

    #[tokio::test]
    async fn test_listing_missing_directory_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let volume = volume(tmp.path().join("does-not-exist"));
        assert_eq!(volume.listing().await, "");
    }

    #[tokio::test]
    async fn test_create_under_file_path_degrades() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();

        let volume = volume(blocker.join("nested"));
        assert_eq!(volume.create_marker().await, "");
    }

    #[tokio::test]
    async fn test_listing_includes_foreign_files() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("a.log"), b"").unwrap();
        std::fs::write(tmp.path().join("b.log"), b"").unwrap();

        let volume = volume(tmp.path());
        assert_eq!(volume.listing().await, "b.log a.log");
    }
}

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use tokio::fs;

use crate::downloader::MediaKind;
use crate::error::FetchError;

const PARTIAL_SUFFIX: &str = ".part";

/// Final on-disk location of one work item, `{dir}/{identity}.{ext}`.
///
/// Bytes are staged in a sibling `.part` file and only renamed onto the
/// final path once complete, so the final path existing means "done".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    path: PathBuf,
}

impl DownloadTarget {
    pub fn new(dir: &Path, identity: &str, kind: MediaKind) -> Self {
        Self {
            path: dir.join(format!("{}.{}", identity, kind.extension())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn partial_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(PARTIAL_SUFFIX);
        PathBuf::from(name)
    }

    /// Existence gate. A probe error counts as absent.
    pub async fn exists(&self) -> bool {
        fs::try_exists(&self.path).await.unwrap_or(false)
    }

    /// Stages `bytes` and moves them into place.
    pub async fn write_all(&self, bytes: &[u8]) -> Result<(), FetchError> {
        let partial = self.partial_path();
        if let Err(source) = fs::write(&partial, bytes).await {
            self.discard().await;
            return Err(FetchError::Io {
                path: partial,
                source,
            });
        }
        self.commit().await
    }

    pub async fn commit(&self) -> Result<(), FetchError> {
        let partial = self.partial_path();
        if let Err(source) = fs::rename(&partial, &self.path).await {
            self.discard().await;
            return Err(FetchError::Io {
                path: self.path.clone(),
                source,
            });
        }
        Ok(())
    }

    pub async fn discard(&self) {
        let _ = fs::remove_file(self.partial_path()).await;
    }
}

impl fmt::Display for DownloadTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

use std::fmt;

use futures::Future;
use serde::{Deserialize, Serialize};

use crate::path::{Path, PathBuf};
use crate::Result;

/// Commit state of a local entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Commit {
    /// Synchronized before; the entry's etag records the last known
    /// remote fingerprint.
    Committed,
    /// Present locally, never pushed.
    Uncommitted,
    /// Tombstone: the local deletion must be propagated to the remote
    /// side before local metadata can be dropped.
    AwaitingRemoteDeletion,
}

impl Commit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Commit::Committed => "Committed",
            Commit::Uncommitted => "Uncommitted",
            Commit::AwaitingRemoteDeletion => "AwaitingRemoteDeletion",
        }
    }
}

impl fmt::Display for Commit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entry of the local tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalEntry {
    pub path: PathBuf,
    pub is_dir: bool,
    /// Etag of the last committed remote state; empty for directories.
    pub etag: String,
    pub commit: Commit,
}

impl LocalEntry {
    pub fn dir<P: Into<PathBuf>>(path: P, commit: Commit) -> Self {
        Self {
            path: path.into(),
            is_dir: true,
            etag: String::new(),
            commit,
        }
    }

    pub fn file<P: Into<PathBuf>>(path: P, etag: &str, commit: Commit) -> Self {
        Self {
            path: path.into(),
            is_dir: false,
            etag: etag.to_string(),
            commit,
        }
    }

    pub fn path(&self) -> &Path {
        self.path.as_path()
    }
}

/// An entry of the remote tree. The remote is authoritative for its own
/// contents, so there is no commit state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteEntry {
    pub path: PathBuf,
    pub is_dir: bool,
    pub etag: String,
}

impl RemoteEntry {
    pub fn dir<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            is_dir: true,
            etag: String::new(),
        }
    }

    pub fn file<P: Into<PathBuf>>(path: P, etag: &str) -> Self {
        Self {
            path: path.into(),
            is_dir: false,
            etag: etag.to_string(),
        }
    }

    pub fn path(&self) -> &Path {
        self.path.as_path()
    }
}

/// Listing capability over the local tree.
///
/// `/` lists the root; an empty list is a valid answer. Listings must be
/// safe to call re-entrantly: the stability check re-enters them while a
/// walk derived from the same provider is conceptually still pending.
pub trait LocalTree {
    /// Direct children of `parent`, in the backend's own order.
    fn children<'a>(
        &'a self,
        parent: &'a Path,
    ) -> impl Future<Output = Result<Vec<LocalEntry>>> + Send + 'a;
}

/// Listing capability over the remote tree.
pub trait RemoteTree {
    fn children<'a>(
        &'a self,
        parent: &'a Path,
    ) -> impl Future<Output = Result<Vec<RemoteEntry>>> + Send + 'a;
}

use std::fmt;

use futures::Future;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::path::PathBuf;
use crate::storage::{LocalEntry, RemoteEntry};
use crate::Result;

/// What the executor must do for one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DecisionFlag {
    UploadLocal,
    CreateDirLocal,
    CreateDirRemote,
    DownloadRemote,
    DeleteLocal,
    DeleteRemote,
    Conflict,
    /// Declared for hosts that track sync metadata; the engine never
    /// emits it.
    DeleteMetadata,
    /// Replace a local file by the directory found at the same remote
    /// path.
    DeleteLocalAndCreateDirLocal,
    /// Replace a local directory by the file found at the same remote
    /// path.
    DeleteLocalAndDownloadRemote,
}

impl fmt::Display for DecisionFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DecisionFlag::UploadLocal => "UploadLocal",
            DecisionFlag::CreateDirLocal => "CreateDirLocal",
            DecisionFlag::CreateDirRemote => "CreateDirRemote",
            DecisionFlag::DownloadRemote => "DownloadRemote",
            DecisionFlag::DeleteLocal => "DeleteLocal",
            DecisionFlag::DeleteRemote => "DeleteRemote",
            DecisionFlag::Conflict => "Conflict",
            DecisionFlag::DeleteMetadata => "DeleteMetadata",
            DecisionFlag::DeleteLocalAndCreateDirLocal => "DeleteLocalAndCreateDirLocal",
            DecisionFlag::DeleteLocalAndDownloadRemote => "DeleteLocalAndDownloadRemote",
        };
        f.write_str(s)
    }
}

/// Diagnostic record of the (local, remote) entry pair a decision was
/// derived from. Purely informational.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Why {
    #[serde(rename = "local-present")]
    pub local_present: bool,
    #[serde(rename = "local-isDir")]
    pub local_is_dir: bool,
    #[serde(rename = "local-etag")]
    pub local_etag: String,
    /// Human readable commit state; empty when no local entry took part.
    #[serde(rename = "local-commit")]
    pub local_commit: String,
    #[serde(rename = "remote-present")]
    pub remote_present: bool,
    #[serde(rename = "remote-isDir")]
    pub remote_is_dir: bool,
    #[serde(rename = "remote-etag")]
    pub remote_etag: String,
}

impl Why {
    pub fn record(local: Option<&LocalEntry>, remote: Option<&RemoteEntry>) -> Self {
        let mut why = Why::default();
        if let Some(local) = local {
            why.local_present = true;
            why.local_is_dir = local.is_dir;
            why.local_etag = local.etag.clone();
            why.local_commit = local.commit.as_str().to_string();
        }
        if let Some(remote) = remote {
            why.remote_present = true;
            why.remote_is_dir = remote.is_dir;
            why.remote_etag = remote.etag.clone();
        }
        why
    }
}

/// One emitted sync decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub path: PathBuf,
    pub flag: DecisionFlag,
    /// Remote etag observed when the decision was derived, so the
    /// executor can detect an intervening remote change. Empty when no
    /// remote entry took part.
    pub remote_valid_etag: String,
    /// Kind at decision time, remote side preferred.
    pub remote_is_dir: bool,
    pub why: Why,
}

impl Decision {
    pub(crate) fn from_local(flag: DecisionFlag, local: &LocalEntry) -> Self {
        Self {
            path: local.path.clone(),
            flag,
            remote_valid_etag: String::new(),
            remote_is_dir: local.is_dir,
            why: Why::record(Some(local), None),
        }
    }

    pub(crate) fn from_remote(flag: DecisionFlag, remote: &RemoteEntry) -> Self {
        Self {
            path: remote.path.clone(),
            flag,
            remote_valid_etag: remote.etag.clone(),
            remote_is_dir: remote.is_dir,
            why: Why::record(None, Some(remote)),
        }
    }

    pub(crate) fn from_pair(flag: DecisionFlag, local: &LocalEntry, remote: &RemoteEntry) -> Self {
        Self {
            path: local.path.clone(),
            flag,
            remote_valid_etag: remote.etag.clone(),
            remote_is_dir: remote.is_dir,
            why: Why::record(Some(local), Some(remote)),
        }
    }

    /// True when `other` carries the same actionable content. The `why`
    /// diagnostic is ignored; this is the tuple the stability check
    /// compares.
    pub fn same_outcome(&self, other: &Decision) -> bool {
        self.path == other.path
            && self.flag == other.flag
            && self.remote_valid_etag == other.remote_valid_etag
            && self.remote_is_dir == other.remote_is_dir
    }
}

/// Receives decisions in emission order.
pub trait DecisionSink {
    /// Handle one decision. Returning an error aborts the walk; a sink
    /// that checks `cancel` turns host-side cancellation into
    /// [`Error::Cancelled`](crate::Error::Cancelled).
    fn emit(
        &self,
        cancel: &CancellationToken,
        decision: Decision,
    ) -> impl Future<Output = Result<()>> + Send;
}

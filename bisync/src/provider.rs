use std::sync::Mutex;

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::decision::{Decision, DecisionFlag, DecisionSink};
use crate::path::Path;
use crate::storage::{Commit, LocalEntry, LocalTree, RemoteEntry, RemoteTree};
use crate::{Error, Result};

/// Reconciliation options.
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    /// The local backend can delete a non-empty folder in one
    /// operation. When set, per-child deletes under a wholly deletable
    /// folder are suppressed in favor of the single folder-level
    /// decision.
    pub local_folders_can_be_deleted_non_empty: bool,
    /// Symmetric on the remote side.
    pub remote_folders_can_be_deleted_non_empty: bool,
}

/// The decision engine driver.
///
/// Holds the two listing capabilities and the host's sink; every walk is
/// stateless, all per-call state travels through parameters.
pub struct Provider<L, R, S> {
    local: L,
    remote: R,
    sink: S,
    opts: Options,
}

/// Aggregate-deletion verdict a subtree walk reports to its caller.
#[derive(Debug, Clone, Copy, Default)]
struct Deleted {
    local: bool,
    remote: bool,
}

struct Pair {
    local: LocalEntry,
    remote: RemoteEntry,
}

struct Groups {
    export: Vec<LocalEntry>,
    import: Vec<RemoteEntry>,
    both: Vec<Pair>,
}

/// Partition sibling lists by path equality, preserving listing order:
/// `export` and `both` follow the local order, `import` the remote one.
fn classify(locals: Vec<LocalEntry>, remotes: Vec<RemoteEntry>) -> Groups {
    let mut matched = vec![false; remotes.len()];
    let mut export = Vec::new();
    let mut both = Vec::new();

    for local in locals {
        match remotes.iter().position(|r| r.path == local.path) {
            Some(ix) => {
                matched[ix] = true;
                both.push(Pair {
                    local,
                    remote: remotes[ix].clone(),
                });
            }
            None => export.push(local),
        }
    }

    let import = remotes
        .into_iter()
        .zip(matched)
        .filter_map(|(remote, m)| (!m).then_some(remote))
        .collect();

    Groups {
        export,
        import,
        both,
    }
}

async fn send<K>(sink: &K, cancel: &CancellationToken, decision: Decision) -> Result<()>
where
    K: DecisionSink + Sync,
{
    log::trace!("decision {} for {}", decision.flag, decision.path);
    sink.emit(cancel, decision).await
}

/// Sink for the deletion-feasibility probe: discards decisions but still
/// respects cancellation.
struct NullSink;

impl DecisionSink for NullSink {
    fn emit(
        &self,
        cancel: &CancellationToken,
        _decision: Decision,
    ) -> impl futures::Future<Output = Result<()>> + Send {
        let cancelled = cancel.is_cancelled();
        async move {
            if cancelled {
                Err(Error::Cancelled)
            } else {
                Ok(())
            }
        }
    }
}

/// Sink for the stability check: keeps the first decision derived for
/// the watched path, discards the rest.
struct CaptureSink<'a> {
    path: &'a Path,
    captured: Mutex<Option<Decision>>,
}

impl<'a> CaptureSink<'a> {
    fn new(path: &'a Path) -> Self {
        Self {
            path,
            captured: Mutex::new(None),
        }
    }

    fn into_captured(self) -> Option<Decision> {
        self.captured.into_inner().unwrap()
    }
}

impl DecisionSink for CaptureSink<'_> {
    fn emit(
        &self,
        cancel: &CancellationToken,
        decision: Decision,
    ) -> impl futures::Future<Output = Result<()>> + Send {
        async move {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            if decision.path.as_path() == self.path {
                let mut slot = self.captured.lock().unwrap();
                if slot.is_none() {
                    *slot = Some(decision);
                }
            }
            Ok(())
        }
    }
}

impl<L, R, S> Provider<L, R, S> {
    pub fn new(local: L, remote: R, sink: S, opts: Options) -> Self {
        Self {
            local,
            remote,
            sink,
            opts,
        }
    }

    pub fn local(&self) -> &L {
        &self.local
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn options(&self) -> Options {
        self.opts
    }
}

impl<L, R, S> Provider<L, R, S>
where
    L: LocalTree + Sync,
    R: RemoteTree + Sync,
    S: DecisionSink + Sync,
{
    /// Full reconciliation from the root.
    pub async fn initial_sync(&self, cancel: &CancellationToken) -> Result<()> {
        self.reconcile(cancel, Path::root()).await
    }

    /// Reconcile the subtree rooted at `path` (absolute).
    pub async fn reconcile(&self, cancel: &CancellationToken, path: &Path) -> Result<()> {
        if !path.is_absolute() {
            return Err(Error::Other(format!("expected an absolute path: {path}")));
        }
        log::debug!("reconciling {path}");
        self.walk(&self.sink, cancel, path, false, false, None)
            .await?;
        Ok(())
    }

    /// Re-derive `decision` against the current trees and report whether
    /// it still stands. `Ok(false)` means the path no longer yields the
    /// same decision; listing failures are errors.
    pub async fn check_decision(
        &self,
        cancel: &CancellationToken,
        decision: &Decision,
    ) -> Result<bool> {
        let target = decision.path.as_path();
        let parent = target.parent().unwrap_or(Path::root());
        let capture = CaptureSink::new(target);

        self.walk(&capture, cancel, parent, false, false, Some(target))
            .await?;

        let stable = match capture.into_captured() {
            Some(fresh) => fresh.same_outcome(decision),
            None => false,
        };
        log::debug!(
            "decision {} for {} is {}",
            decision.flag,
            decision.path,
            if stable { "stable" } else { "not stable" }
        );
        Ok(stable)
    }

    /// One recursion step of the reconciler.
    ///
    /// Lists both sides of `path`, classifies, runs the export, import
    /// and conflict phases in that order, then settles the buffered
    /// deletes. `keep_only` narrows this step (not the recursion below
    /// it) to a single child, for the stability check.
    fn walk<'a, K>(
        &'a self,
        sink: &'a K,
        cancel: &'a CancellationToken,
        path: &'a Path,
        try_local_delete: bool,
        try_remote_delete: bool,
        keep_only: Option<&'a Path>,
    ) -> BoxFuture<'a, Result<Deleted>>
    where
        K: DecisionSink + Sync,
    {
        Box::pin(async move {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let mut locals = self.local.children(path).await?;
            let mut remotes = self.remote.children(path).await?;

            if let Some(keep) = keep_only {
                locals.retain(|e| e.path.as_path() == keep);
                remotes.retain(|e| e.path.as_path() == keep);
            }

            let Groups {
                export,
                import,
                both,
            } = classify(locals, remotes);

            let mut pending_local: Vec<Decision> = Vec::new();
            let mut pending_remote: Vec<Decision> = Vec::new();

            // Export: local-only entries.
            let exp_total = export.len();
            let mut exp_deleted = 0usize;
            for entry in export {
                match (entry.commit, entry.is_dir) {
                    (Commit::Committed, true) => {
                        // Remotely deleted folder: only deletable once its
                        // own subtree drained.
                        let sub = self
                            .walk(sink, cancel, entry.path(), true, false, None)
                            .await?;
                        if sub.local {
                            pending_local
                                .push(Decision::from_local(DecisionFlag::DeleteLocal, &entry));
                            exp_deleted += 1;
                        } else {
                            // The subtree has surviving content; the folder
                            // must exist remotely again for it to be pushed.
                            send(
                                sink,
                                cancel,
                                Decision::from_local(DecisionFlag::CreateDirRemote, &entry),
                            )
                            .await?;
                        }
                    }
                    (Commit::Committed, false) => {
                        pending_local.push(Decision::from_local(DecisionFlag::DeleteLocal, &entry));
                        exp_deleted += 1;
                    }
                    (Commit::Uncommitted, true) => {
                        send(
                            sink,
                            cancel,
                            Decision::from_local(DecisionFlag::CreateDirRemote, &entry),
                        )
                        .await?;
                        self.walk(sink, cancel, entry.path(), false, false, None)
                            .await?;
                    }
                    (Commit::Uncommitted, false) => {
                        send(
                            sink,
                            cancel,
                            Decision::from_local(DecisionFlag::UploadLocal, &entry),
                        )
                        .await?;
                    }
                    (Commit::AwaitingRemoteDeletion, _) => {
                        // The remote counterpart is already gone; the
                        // tombstone resolves locally.
                        pending_local.push(Decision::from_local(DecisionFlag::DeleteLocal, &entry));
                        exp_deleted += 1;
                    }
                }
            }

            // Import: remote-only entries.
            let imp_total = import.len();
            for entry in import {
                if entry.is_dir {
                    send(
                        sink,
                        cancel,
                        Decision::from_remote(DecisionFlag::CreateDirLocal, &entry),
                    )
                    .await?;
                    self.walk(sink, cancel, entry.path(), false, false, None)
                        .await?;
                } else if entry.etag.is_empty() {
                    // No stable fingerprint; do not download an
                    // unversioned object.
                    log::debug!("skipping {}: remote file has no etag", entry.path);
                } else {
                    send(
                        sink,
                        cancel,
                        Decision::from_remote(DecisionFlag::DownloadRemote, &entry),
                    )
                    .await?;
                }
            }

            // Conflict: entries present on both sides.
            let con_total = both.len();
            let mut con_deleted = 0usize;
            for Pair { local, remote } in both {
                match local.commit {
                    // Committed: the remote is the source of truth.
                    Commit::Committed => {
                        if local.is_dir && !remote.is_dir {
                            // The remote replaced the folder by a file.
                            // Only safe to follow if the local folder is
                            // effectively empty; probe with a discarding
                            // sink.
                            let probe = self
                                .walk(&NullSink, cancel, local.path(), true, false, None)
                                .await?;
                            if probe.local && !remote.etag.is_empty() {
                                send(
                                    sink,
                                    cancel,
                                    Decision::from_pair(
                                        DecisionFlag::DeleteLocalAndDownloadRemote,
                                        &local,
                                        &remote,
                                    ),
                                )
                                .await?;
                            } else {
                                send(
                                    sink,
                                    cancel,
                                    Decision::from_pair(DecisionFlag::Conflict, &local, &remote),
                                )
                                .await?;
                            }
                        } else if !local.is_dir && remote.is_dir {
                            // The remote replaced the file by a folder.
                            send(
                                sink,
                                cancel,
                                Decision::from_pair(
                                    DecisionFlag::DeleteLocalAndCreateDirLocal,
                                    &local,
                                    &remote,
                                ),
                            )
                            .await?;
                            self.walk(sink, cancel, local.path(), false, false, None)
                                .await?;
                        } else if local.is_dir {
                            self.walk(sink, cancel, local.path(), false, false, None)
                                .await?;
                        } else if remote.etag.is_empty() {
                            log::debug!("skipping {}: remote file has no etag", remote.path);
                        } else if local.etag != remote.etag {
                            send(
                                sink,
                                cancel,
                                Decision::from_pair(DecisionFlag::DownloadRemote, &local, &remote),
                            )
                            .await?;
                        }
                    }
                    Commit::Uncommitted => {
                        if local.is_dir != remote.is_dir {
                            send(
                                sink,
                                cancel,
                                Decision::from_pair(DecisionFlag::Conflict, &local, &remote),
                            )
                            .await?;
                        } else if local.is_dir {
                            // Same folder created on both sides; settle the
                            // contents, then materialize the folder itself.
                            self.walk(sink, cancel, local.path(), false, false, None)
                                .await?;
                            send(
                                sink,
                                cancel,
                                Decision::from_pair(DecisionFlag::CreateDirLocal, &local, &remote),
                            )
                            .await?;
                        } else if local.etag == remote.etag {
                            // The stored etag is the last known remote
                            // state; matching means no intervening remote
                            // change, safe to push.
                            send(
                                sink,
                                cancel,
                                Decision::from_pair(DecisionFlag::UploadLocal, &local, &remote),
                            )
                            .await?;
                        } else {
                            send(
                                sink,
                                cancel,
                                Decision::from_pair(DecisionFlag::Conflict, &local, &remote),
                            )
                            .await?;
                        }
                    }
                    Commit::AwaitingRemoteDeletion => {
                        if !local.is_dir && remote.is_dir {
                            // The remote replaced the deleted file with a
                            // folder; adopt the remote view.
                            send(
                                sink,
                                cancel,
                                Decision::from_pair(DecisionFlag::CreateDirLocal, &local, &remote),
                            )
                            .await?;
                            self.walk(sink, cancel, local.path(), false, false, None)
                                .await?;
                        } else if local.is_dir && !remote.is_dir {
                            if !remote.etag.is_empty() {
                                send(
                                    sink,
                                    cancel,
                                    Decision::from_pair(
                                        DecisionFlag::DownloadRemote,
                                        &local,
                                        &remote,
                                    ),
                                )
                                .await?;
                            }
                        } else if local.is_dir {
                            let sub = self
                                .walk(sink, cancel, local.path(), false, true, None)
                                .await?;
                            if sub.remote {
                                pending_remote.push(Decision::from_pair(
                                    DecisionFlag::DeleteRemote,
                                    &local,
                                    &remote,
                                ));
                                con_deleted += 1;
                            } else {
                                // The remote subtree has live descendants;
                                // the tombstone cannot complete, re-adopt
                                // the folder.
                                send(
                                    sink,
                                    cancel,
                                    Decision::from_pair(
                                        DecisionFlag::CreateDirLocal,
                                        &local,
                                        &remote,
                                    ),
                                )
                                .await?;
                            }
                        } else if local.etag == remote.etag {
                            pending_remote.push(Decision::from_pair(
                                DecisionFlag::DeleteRemote,
                                &local,
                                &remote,
                            ));
                            con_deleted += 1;
                        } else if remote.etag.is_empty() {
                            log::debug!("skipping {}: remote file has no etag", remote.path);
                        } else {
                            // The remote changed after the delete intent;
                            // favor the remote.
                            send(
                                sink,
                                cancel,
                                Decision::from_pair(DecisionFlag::DownloadRemote, &local, &remote),
                            )
                            .await?;
                        }
                    }
                }
            }

            // Aggregate deletion eligibility: every export child drained,
            // nothing imported, no conflict survivor.
            let empty = exp_deleted == exp_total && imp_total == 0 && con_deleted == con_total;
            let deleted = Deleted {
                local: try_local_delete && empty,
                remote: try_remote_delete && empty,
            };

            // The caller emits a single folder-level delete when a side
            // reports deleted; per-child deletes are then redundant only
            // if the backend accepts non-empty folder deletion.
            if !(deleted.local && self.opts.local_folders_can_be_deleted_non_empty) {
                for decision in pending_local {
                    send(sink, cancel, decision).await?;
                }
            }
            if !(deleted.remote && self.opts.remote_folders_can_be_deleted_non_empty) {
                for decision in pending_remote {
                    send(sink, cancel, decision).await?;
                }
            }

            Ok(deleted)
        })
    }
}

//! Default-options scenario matrix, ported from the reconciler's
//! reference behavior: each case is a pair of flat tree snapshots and
//! the decision set the walk must produce.

use bisync::Commit::{AwaitingRemoteDeletion, Committed, Uncommitted};
use bisync::DecisionFlag::*;
use bisync::{LocalEntry, RemoteEntry};

use crate::harness::{assert_execution_ordered, check_scenario};

#[tokio::test]
async fn empty_local_initial_merge() {
    let decisions = check_scenario(
        vec![],
        vec![
            RemoteEntry::dir("/a"),
            RemoteEntry::dir("/a/b"),
            RemoteEntry::file("/a/b/c", "v1"),
            RemoteEntry::file("/a/d", "v1"),
            RemoteEntry::dir("/b"),
            RemoteEntry::file("/c", "v1"),
        ],
        &[
            (CreateDirLocal, "/a"),
            (CreateDirLocal, "/a/b"),
            (DownloadRemote, "/a/b/c"),
            (DownloadRemote, "/a/d"),
            (CreateDirLocal, "/b"),
            (DownloadRemote, "/c"),
        ],
    )
    .await;

    assert_execution_ordered(&decisions);
}

#[tokio::test]
async fn empty_remote_initial_merge() {
    let decisions = check_scenario(
        vec![
            LocalEntry::dir("/a", Uncommitted),
            LocalEntry::dir("/a/b", Uncommitted),
            LocalEntry::file("/a/b/c", "v1", Uncommitted),
            LocalEntry::file("/a/d", "v1", Uncommitted),
            LocalEntry::dir("/b", Uncommitted),
            LocalEntry::file("/c", "v1", Uncommitted),
        ],
        vec![],
        &[
            (CreateDirRemote, "/a"),
            (CreateDirRemote, "/a/b"),
            (UploadLocal, "/a/b/c"),
            (UploadLocal, "/a/d"),
            (CreateDirRemote, "/b"),
            (UploadLocal, "/c"),
        ],
    )
    .await;

    assert_execution_ordered(&decisions);
}

fn in_sync_local() -> Vec<LocalEntry> {
    vec![
        LocalEntry::dir("/a", Committed),
        LocalEntry::dir("/a/b", Committed),
        LocalEntry::file("/a/b/c", "v1", Committed),
        LocalEntry::file("/a/d", "v1", Committed),
        LocalEntry::dir("/b", Committed),
        LocalEntry::file("/c", "v1", Committed),
    ]
}

fn in_sync_remote() -> Vec<RemoteEntry> {
    vec![
        RemoteEntry::dir("/a"),
        RemoteEntry::dir("/a/b"),
        RemoteEntry::file("/a/b/c", "v1"),
        RemoteEntry::file("/a/d", "v1"),
        RemoteEntry::dir("/b"),
        RemoteEntry::file("/c", "v1"),
    ]
}

#[tokio::test]
async fn in_sync_nothing_to_do() {
    check_scenario(in_sync_local(), in_sync_remote(), &[]).await;
}

#[tokio::test]
async fn files_and_folder_deleted_on_server() {
    let decisions = check_scenario(
        in_sync_local(),
        vec![
            RemoteEntry::dir("/a"),
            RemoteEntry::file("/a/d", "v1"),
            RemoteEntry::dir("/b"),
        ],
        &[
            (DeleteLocal, "/a/b"),
            (DeleteLocal, "/a/b/c"),
            (DeleteLocal, "/c"),
        ],
    )
    .await;

    // Deterministic walk order: deepest delete first, then its parent,
    // then the root-level leftover.
    let paths: Vec<&str> = decisions.iter().map(|d| d.path.as_str()).collect();
    assert_eq!(paths, ["/a/b/c", "/a/b", "/c"]);
    assert_execution_ordered(&decisions);
}

#[tokio::test]
async fn files_and_folder_deleted_on_local() {
    let decisions = check_scenario(
        vec![
            LocalEntry::dir("/a", Committed),
            LocalEntry::dir("/a/b", AwaitingRemoteDeletion),
            LocalEntry::file("/a/b/c", "v1", AwaitingRemoteDeletion),
            LocalEntry::file("/a/d", "v1", Committed),
            LocalEntry::dir("/b", Committed),
            LocalEntry::file("/c", "v1", AwaitingRemoteDeletion),
        ],
        in_sync_remote(),
        &[
            (DeleteRemote, "/a/b"),
            (DeleteRemote, "/a/b/c"),
            (DeleteRemote, "/c"),
        ],
    )
    .await;

    let paths: Vec<&str> = decisions.iter().map(|d| d.path.as_str()).collect();
    assert_eq!(paths, ["/a/b/c", "/a/b", "/c"]);
    assert_execution_ordered(&decisions);
}

#[tokio::test]
async fn whole_tree_deleted_on_server() {
    let decisions = check_scenario(
        vec![
            LocalEntry::dir("/a", Committed),
            LocalEntry::dir("/a/b", Committed),
            LocalEntry::file("/a/b/c", "v1", Committed),
        ],
        vec![],
        &[
            (DeleteLocal, "/a"),
            (DeleteLocal, "/a/b"),
            (DeleteLocal, "/a/b/c"),
        ],
    )
    .await;

    let paths: Vec<&str> = decisions.iter().map(|d| d.path.as_str()).collect();
    assert_eq!(paths, ["/a/b/c", "/a/b", "/a"]);
    assert_execution_ordered(&decisions);
}

#[tokio::test]
async fn file_conflict() {
    let decisions = check_scenario(
        vec![LocalEntry::file("/a", "v2", Uncommitted)],
        vec![RemoteEntry::file("/a", "v1")],
        &[(Conflict, "/a")],
    )
    .await;

    // The diagnostic record carries the pair that produced the conflict.
    let d = &decisions[0];
    assert_eq!(d.remote_valid_etag, "v1");
    assert!(!d.remote_is_dir);
    assert!(d.why.local_present && d.why.remote_present);
    assert_eq!(d.why.local_commit, "Uncommitted");
    assert_eq!(d.why.local_etag, "v2");
    assert_eq!(d.why.remote_etag, "v1");
}

#[tokio::test]
async fn file_and_folder_conflict() {
    check_scenario(
        vec![
            LocalEntry::dir("/a", Committed),
            LocalEntry::file("/a/b", "v1", Uncommitted),
            LocalEntry::file("/c", "v1", Uncommitted),
        ],
        vec![
            RemoteEntry::file("/a", "v1"),
            RemoteEntry::dir("/c"),
            RemoteEntry::file("/c/d", "v1"),
        ],
        &[(Conflict, "/a"), (Conflict, "/c")],
    )
    .await;
}

#[tokio::test]
async fn file_tombstone_replaced_by_remote_dir() {
    check_scenario(
        vec![LocalEntry::file("/a", "v1", AwaitingRemoteDeletion)],
        vec![RemoteEntry::dir("/a"), RemoteEntry::file("/a/b", "v1")],
        &[(CreateDirLocal, "/a"), (DownloadRemote, "/a/b")],
    )
    .await;
}

#[tokio::test]
async fn uncommitted_dir_gone_remotely_is_pushed() {
    check_scenario(
        vec![
            LocalEntry::dir("/a", Uncommitted),
            LocalEntry::file("/a/b", "v1", Uncommitted),
        ],
        vec![],
        &[(CreateDirRemote, "/a"), (UploadLocal, "/a/b")],
    )
    .await;
}

#[tokio::test]
async fn same_dir_created_on_both_sides_with_partial_conflict() {
    check_scenario(
        vec![
            LocalEntry::dir("/a", Uncommitted),
            LocalEntry::file("/a/b", "v1", Uncommitted),
            LocalEntry::file("/a/c", "v1", Uncommitted),
        ],
        vec![
            RemoteEntry::dir("/a"),
            RemoteEntry::file("/a/c", "v2"),
            RemoteEntry::file("/a/d", "v1"),
        ],
        &[
            (CreateDirLocal, "/a"),
            (UploadLocal, "/a/b"),
            (Conflict, "/a/c"),
            (DownloadRemote, "/a/d"),
        ],
    )
    .await;
}

#[tokio::test]
async fn dir_tombstone_with_live_remote_subtree_is_readopted() {
    check_scenario(
        vec![LocalEntry::dir("/a", AwaitingRemoteDeletion)],
        vec![
            RemoteEntry::dir("/a"),
            RemoteEntry::dir("/a/b"),
            RemoteEntry::file("/a/b/c", "v1"),
            RemoteEntry::file("/a/d", "v1"),
        ],
        &[
            (CreateDirLocal, "/a"),
            (CreateDirLocal, "/a/b"),
            (DownloadRemote, "/a/b/c"),
            (DownloadRemote, "/a/d"),
        ],
    )
    .await;
}

#[tokio::test]
async fn new_file_on_local() {
    check_scenario(
        vec![
            LocalEntry::dir("/a", Committed),
            LocalEntry::file("/a/b", "v1", Uncommitted),
        ],
        vec![RemoteEntry::dir("/a"), RemoteEntry::file("/a/b", "v1")],
        &[(UploadLocal, "/a/b")],
    )
    .await;
}

#[tokio::test]
async fn new_version_on_remote() {
    check_scenario(
        vec![
            LocalEntry::dir("/a", Committed),
            LocalEntry::file("/a/b", "v1", Committed),
        ],
        vec![RemoteEntry::dir("/a"), RemoteEntry::file("/a/b", "v2")],
        &[(DownloadRemote, "/a/b")],
    )
    .await;
}

#[tokio::test]
async fn tombstone_without_remote_counterpart() {
    check_scenario(
        vec![
            LocalEntry::dir("/a", Committed),
            LocalEntry::file("/a/b", "v1", AwaitingRemoteDeletion),
        ],
        vec![RemoteEntry::dir("/a")],
        &[(DeleteLocal, "/a/b")],
    )
    .await;
}

#[tokio::test]
async fn out_of_sync_merge_with_diff_on_both_sides() {
    check_scenario(
        vec![
            LocalEntry::dir("/a", Uncommitted),
            LocalEntry::file("/a/b", "v1", Uncommitted),
            LocalEntry::file("/c", "v1", Uncommitted),
        ],
        vec![
            RemoteEntry::file("/a", "v1"),
            RemoteEntry::dir("/c"),
            RemoteEntry::file("/c/d", "v1"),
        ],
        &[(Conflict, "/a"), (Conflict, "/c")],
    )
    .await;
}

#[tokio::test]
async fn file_tombstone_with_new_remote_version() {
    check_scenario(
        vec![LocalEntry::file("/a", "v1", AwaitingRemoteDeletion)],
        vec![RemoteEntry::file("/a", "v2")],
        &[(DownloadRemote, "/a")],
    )
    .await;
}

#[tokio::test]
async fn deep_uncommitted_chain_is_fully_created() {
    check_scenario(
        vec![
            LocalEntry::dir("/a", Committed),
            LocalEntry::dir("/a/b", Uncommitted),
            LocalEntry::dir("/a/b/c", Uncommitted),
            LocalEntry::file("/a/b/c/d", "v1", Uncommitted),
        ],
        vec![],
        &[
            (CreateDirRemote, "/a"),
            (CreateDirRemote, "/a/b"),
            (CreateDirRemote, "/a/b/c"),
            (UploadLocal, "/a/b/c/d"),
        ],
    )
    .await;
}

#[tokio::test]
async fn committed_dir_swapped_for_remote_file() {
    let decisions = check_scenario(
        vec![LocalEntry::dir("/a", Committed)],
        vec![RemoteEntry::file("/a", "v1")],
        &[(DeleteLocalAndDownloadRemote, "/a")],
    )
    .await;

    assert_eq!(decisions[0].remote_valid_etag, "v1");
    assert!(!decisions[0].remote_is_dir);
}

#[tokio::test]
async fn committed_dir_with_live_content_swapped_for_remote_file() {
    // The feasibility probe finds a surviving uncommitted child, so the
    // swap degrades to a conflict and nothing from the probe leaks out.
    check_scenario(
        vec![
            LocalEntry::dir("/a", Committed),
            LocalEntry::file("/a/b", "v1", Uncommitted),
        ],
        vec![RemoteEntry::file("/a", "v1")],
        &[(Conflict, "/a")],
    )
    .await;
}

#[tokio::test]
async fn committed_file_swapped_for_remote_dir() {
    check_scenario(
        vec![LocalEntry::file("/a", "v1", Committed)],
        vec![RemoteEntry::dir("/a"), RemoteEntry::file("/a/b", "v1")],
        &[
            (DeleteLocalAndCreateDirLocal, "/a"),
            (DownloadRemote, "/a/b"),
        ],
    )
    .await;
}

#[tokio::test]
async fn remote_files_without_etag_are_skipped() {
    check_scenario(
        vec![
            LocalEntry::file("/b", "v1", Committed),
            LocalEntry::file("/c", "v1", AwaitingRemoteDeletion),
        ],
        vec![
            RemoteEntry::file("/a", ""),
            RemoteEntry::file("/b", ""),
            RemoteEntry::file("/c", ""),
        ],
        &[],
    )
    .await;
}

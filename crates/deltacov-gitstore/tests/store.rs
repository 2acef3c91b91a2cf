mod common;

use deltacov_core::{DeltacovError, RevisionRef};
use deltacov_gitstore::{RevisionStore, StoreOptions, SyncOutcome};
use git2::Repository;

fn open(path: &std::path::Path) -> RevisionStore {
    RevisionStore::open(path, StoreOptions::default()).unwrap()
}

#[test]
fn resolves_branch_tag_and_commit() {
    let dir = tempfile::tempdir().unwrap();
    let repo = common::init_repo(dir.path());
    let first = common::commit(&repo, &[("A.java", "class A {}\n")], &[], "first");
    let second = common::commit(&repo, &[("A.java", "class A { void f() {} }\n")], &[], "second");
    common::tag(&repo, "v1", first);
    common::annotated_tag(&repo, "v2", second);

    let store = open(dir.path());

    let main = store.resolve(&RevisionRef::Branch("main".into())).unwrap();
    assert_eq!(main.commit, second);

    let v1 = store.resolve(&RevisionRef::Tag("v1".into())).unwrap();
    assert_eq!(v1.commit, first);

    let v2 = store.resolve(&RevisionRef::Tag("v2".into())).unwrap();
    assert_eq!(v2.commit, second, "annotated tags peel to their commit");

    let short = first.to_string()[..8].to_string();
    let by_id = store.resolve(&RevisionRef::Commit(short)).unwrap();
    assert_eq!(by_id.commit, first);
    assert_eq!(by_id.tree, repo.find_commit(first).unwrap().tree_id());
}

#[test]
fn unknown_revisions_are_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let repo = common::init_repo(dir.path());
    common::commit(&repo, &[("A.java", "class A {}\n")], &[], "first");
    let store = open(dir.path());

    for revision in [
        RevisionRef::Branch("missing".into()),
        RevisionRef::Tag("v9".into()),
        RevisionRef::Commit("0000000000000000000000000000000000000001".into()),
    ] {
        let err = store.resolve(&revision).unwrap_err();
        assert!(
            matches!(err, DeltacovError::RevisionNotFound { .. }),
            "{revision}: {err}"
        );
    }
}

#[test]
fn read_file_returns_content_at_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let repo = common::init_repo(dir.path());
    let first = common::commit(&repo, &[("src/A.java", "one\n")], &[], "first");
    common::commit(&repo, &[("src/A.java", "two\n")], &[], "second");
    let store = open(dir.path());

    let old = store.resolve(&RevisionRef::Commit(first.to_string())).unwrap();
    let new = store.resolve(&RevisionRef::Branch("main".into())).unwrap();
    assert_eq!(store.read_file(&old, "src/A.java").unwrap(), b"one\n");
    assert_eq!(store.read_file(&new, "src/A.java").unwrap(), b"two\n");
}

#[test]
fn read_file_missing_path_or_directory_is_path_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let repo = common::init_repo(dir.path());
    common::commit(&repo, &[("src/A.java", "one\n")], &[], "first");
    let store = open(dir.path());
    let snapshot = store.resolve(&RevisionRef::Branch("main".into())).unwrap();

    for path in ["src/B.java", "src"] {
        let err = store.read_file(&snapshot, path).unwrap_err();
        assert!(matches!(err, DeltacovError::PathNotFound { .. }), "{path}: {err}");
    }
}

fn upstream_and_clone() -> (tempfile::TempDir, Repository, tempfile::TempDir) {
    let upstream_dir = tempfile::tempdir().unwrap();
    let upstream = common::init_repo(upstream_dir.path());
    common::commit(&upstream, &[("A.java", "class A {}\n")], &[], "first");

    let clone_dir = tempfile::tempdir().unwrap();
    Repository::clone(upstream_dir.path().to_str().unwrap(), clone_dir.path()).unwrap();
    (upstream_dir, upstream, clone_dir)
}

#[test]
fn sync_is_noop_when_tips_match() {
    let (_upstream_dir, _upstream, clone_dir) = upstream_and_clone();
    let mut store = open(clone_dir.path());
    assert_eq!(store.sync_local_branch("main").unwrap(), SyncOutcome::UpToDate);
}

#[test]
fn sync_fast_forwards_checked_out_branch() {
    let (_upstream_dir, upstream, clone_dir) = upstream_and_clone();
    let newer = common::commit(&upstream, &[("A.java", "class A { int x; }\n")], &[], "second");

    let mut store = open(clone_dir.path());
    assert_eq!(
        store.sync_local_branch("main").unwrap(),
        SyncOutcome::FastForwarded
    );
    let main = store.resolve(&RevisionRef::Branch("main".into())).unwrap();
    assert_eq!(main.commit, newer);

    let on_disk = std::fs::read_to_string(clone_dir.path().join("A.java")).unwrap();
    assert_eq!(on_disk, "class A { int x; }\n");

    assert_eq!(store.sync_local_branch("main").unwrap(), SyncOutcome::UpToDate);
}

#[test]
fn sync_diverged_branch_is_sync_failure() {
    let (_upstream_dir, upstream, clone_dir) = upstream_and_clone();
    common::commit(&upstream, &[("A.java", "class A { int up; }\n")], &[], "upstream");
    let clone = Repository::open(clone_dir.path()).unwrap();
    let local = common::commit(&clone, &[("B.java", "class B {}\n")], &[], "local");

    let mut store = open(clone_dir.path());
    let err = store.sync_local_branch("main").unwrap_err();
    match err {
        DeltacovError::SyncFailure { branch, reason } => {
            assert_eq!(branch, "main");
            assert!(reason.contains("diverged"), "{reason}");
        }
        other => panic!("unexpected error: {other}"),
    }

    let main = store.resolve(&RevisionRef::Branch("main".into())).unwrap();
    assert_eq!(main.commit, local);
}

#[test]
fn sync_local_ahead_is_left_untouched() {
    let (_upstream_dir, _upstream, clone_dir) = upstream_and_clone();
    let clone = Repository::open(clone_dir.path()).unwrap();
    let local = common::commit(&clone, &[("B.java", "class B {}\n")], &[], "local");

    let mut store = open(clone_dir.path());
    assert_eq!(
        store.sync_local_branch("main").unwrap(),
        SyncOutcome::LocalAhead
    );
    let main = store.resolve(&RevisionRef::Branch("main".into())).unwrap();
    assert_eq!(main.commit, local);
    assert!(clone_dir.path().join("B.java").exists());
}

#[test]
fn sync_creates_missing_local_branch() {
    let (_upstream_dir, upstream, clone_dir) = upstream_and_clone();
    let head = upstream.head().unwrap().peel_to_commit().unwrap();
    upstream.branch("feature", &head, false).unwrap();

    let mut store = open(clone_dir.path());
    assert_eq!(
        store.sync_local_branch("feature").unwrap(),
        SyncOutcome::Created
    );
    let local = store
        .repository()
        .find_branch("feature", git2::BranchType::Local)
        .unwrap();
    assert_eq!(local.get().target(), Some(head.id()));
    assert!(local.upstream().is_ok());
}

#[test]
fn sync_leaves_local_only_branch_untouched() {
    let (_upstream_dir, _upstream, clone_dir) = upstream_and_clone();
    let clone = Repository::open(clone_dir.path()).unwrap();
    let head = clone.head().unwrap().peel_to_commit().unwrap();
    clone.branch("scratch", &head, false).unwrap();

    let mut store = open(clone_dir.path());
    assert_eq!(
        store.sync_local_branch("scratch").unwrap(),
        SyncOutcome::LocalOnly
    );
}

#[test]
fn sync_of_unknown_branch_is_not_found() {
    let (_upstream_dir, _upstream, clone_dir) = upstream_and_clone();
    let mut store = open(clone_dir.path());
    let err = store.sync_local_branch("ghost").unwrap_err();
    assert!(matches!(err, DeltacovError::RevisionNotFound { .. }));
}

#[test]
fn sync_without_remote_is_sync_failure() {
    let dir = tempfile::tempdir().unwrap();
    let repo = common::init_repo(dir.path());
    common::commit(&repo, &[("A.java", "class A {}\n")], &[], "first");

    let mut store = open(dir.path());
    let err = store.sync_local_branch("main").unwrap_err();
    assert!(matches!(err, DeltacovError::SyncFailure { .. }), "{err}");
}

#[test]
fn offline_store_skips_sync() {
    let dir = tempfile::tempdir().unwrap();
    let repo = common::init_repo(dir.path());
    common::commit(&repo, &[("A.java", "class A {}\n")], &[], "first");

    let options = StoreOptions {
        offline: true,
        ..StoreOptions::default()
    };
    let mut store = RevisionStore::open(dir.path(), options).unwrap();
    assert_eq!(store.sync_local_branch("main").unwrap(), SyncOutcome::Skipped);
}

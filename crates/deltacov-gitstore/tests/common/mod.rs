//! Scratch repositories for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use git2::{IndexAddOption, Oid, Repository, RepositoryInitOptions, Signature};

/// Initialise a non-bare repository whose first branch is `main`.
pub fn init_repo(path: &Path) -> Repository {
    let mut opts = RepositoryInitOptions::new();
    opts.initial_head("main");
    Repository::init_opts(path, &opts).unwrap()
}

/// Write `files` into the work tree, delete `removed`, and commit on HEAD.
pub fn commit(repo: &Repository, files: &[(&str, &str)], removed: &[&str], message: &str) -> Oid {
    let workdir = repo.workdir().unwrap().to_path_buf();
    for (path, content) in files {
        let full = workdir.join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, content).unwrap();
    }
    for path in removed {
        fs::remove_file(workdir.join(path)).unwrap();
    }

    let mut index = repo.index().unwrap();
    index
        .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
        .unwrap();
    index.update_all(["*"].iter(), None).unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();

    let sig = Signature::now("Test", "test@example.com").unwrap();
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .unwrap()
}

/// Create a lightweight tag pointing at `target`.
pub fn tag(repo: &Repository, name: &str, target: Oid) {
    let object = repo.find_object(target, None).unwrap();
    repo.tag_lightweight(name, &object, false).unwrap();
}

/// Create an annotated tag pointing at `target`.
pub fn annotated_tag(repo: &Repository, name: &str, target: Oid) {
    let object = repo.find_object(target, None).unwrap();
    let sig = Signature::now("Test", "test@example.com").unwrap();
    repo.tag(name, &object, &sig, "release", false).unwrap();
}

//! Scratch repositories for tests.

use std::fs;

use git2::{IndexAddOption, Repository};
use tempfile::TempDir;

use crate::storage::commit;
use crate::storage::{CommitId, GitRepository, GitSignature};

pub(crate) fn init_repo() -> (TempDir, GitRepository) {
    let dir = TempDir::new().unwrap();
    let repo = GitRepository::init(dir.path()).unwrap();
    (dir, repo)
}

/// Clone `origin` into a fresh directory; the remote is named `origin`.
pub(crate) fn clone_repo(origin: &GitRepository) -> (TempDir, GitRepository) {
    let dir = TempDir::new().unwrap();
    let url = origin.path().to_str().unwrap().to_string();
    Repository::clone(&url, dir.path()).unwrap();
    let repo = GitRepository::open(dir.path()).unwrap();
    (dir, repo)
}

pub(crate) fn write_file(repo: &GitRepository, name: &str, contents: &str) {
    let path = repo.path().join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

pub(crate) fn read_file(repo: &GitRepository, name: &str) -> String {
    fs::read_to_string(repo.path().join(name)).unwrap()
}

pub(crate) fn file_exists(repo: &GitRepository, name: &str) -> bool {
    repo.path().join(name).exists()
}

/// Stage everything in the working tree and commit it on HEAD.
pub(crate) fn commit_all(repo: &GitRepository, message: &str) -> CommitId {
    repo.with_repo(|repo| {
        let sig = commit::signature(repo, &GitSignature::gitsaga())?;
        let mut index = repo.index()?;
        index.add_all(["*"], IndexAddOption::DEFAULT, None)?;
        index.update_all(["*"], None)?;
        index.write()?;
        let tree = repo.find_tree(index.write_tree()?)?;
        let parent = repo.head()?.peel_to_commit()?;
        let oid = repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &[&parent])?;
        Ok(CommitId::new(oid))
    })
    .unwrap()
}

/// Hold git's lock on a ref (`HEAD`, `refs/heads/main`) so writes to it fail.
pub(crate) fn lock_ref(repo: &GitRepository, name: &str) {
    let path = repo.path().join(".git").join(format!("{}.lock", name));
    fs::write(path, "").unwrap();
}

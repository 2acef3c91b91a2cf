//! Revision resolution, branch synchronization, and blob reads.

use std::fmt;
use std::path::Path;

use deltacov_core::{DeltacovError, RevisionRef};
use git2::build::CheckoutBuilder;
use git2::{
    BranchType, Commit, Cred, CredentialType, Direction, FetchOptions, Oid, RemoteCallbacks,
    Repository,
};

/// Give up after this many credential callbacks for one operation; libgit2
/// keeps asking as long as the callback returns a credential.
const MAX_AUTH_ATTEMPTS: usize = 3;

/// Username/password pair for remote operations.
///
/// The password is redacted from `Debug` output.
///
/// # Examples
///
/// ```
/// use deltacov_gitstore::Credentials;
///
/// let creds = Credentials::new("ci-bot", "s3cret");
/// assert!(!format!("{creds:?}").contains("s3cret"));
/// ```
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Options for opening a [`RevisionStore`].
///
/// # Examples
///
/// ```
/// use deltacov_gitstore::StoreOptions;
///
/// let opts = StoreOptions::default();
/// assert_eq!(opts.remote, "origin");
/// assert!(opts.credentials.is_none());
/// assert!(!opts.offline);
/// ```
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Remote to synchronize branches against (default: `origin`).
    pub remote: String,
    /// Explicit credentials; when absent, libgit2 defaults and the SSH agent
    /// are tried.
    pub credentials: Option<Credentials>,
    /// Never contact the remote.
    pub offline: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            remote: "origin".into(),
            credentials: None,
            offline: false,
        }
    }
}

/// An immutable, resolved view of a source tree at one commit.
///
/// Holds only object ids, so it is cheap to copy and safe to send between
/// threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Commit the revision resolved to.
    pub commit: Oid,
    /// Root tree of that commit.
    pub tree: Oid,
    /// The revision this snapshot was resolved from.
    pub revision: RevisionRef,
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self.commit.to_string();
        write!(f, "{} ({})", self.revision, &id[..id.len().min(8)])
    }
}

/// What [`RevisionStore::sync_local_branch`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Offline mode; the remote was not contacted.
    Skipped,
    /// Local tip already equals the remote tip.
    UpToDate,
    /// The local branch did not exist and was created from the remote.
    Created,
    /// The local branch was fast-forwarded to the remote tip.
    FastForwarded,
    /// The local branch has commits the remote lacks; left untouched.
    LocalAhead,
    /// The remote has no such branch; the local one was left untouched.
    LocalOnly,
}

/// Owns the repository handle for one diff run.
///
/// Mutating operations take `&mut self`, so two branch syncs can never run
/// concurrently against the same handle. `git2::Repository` is not `Sync`;
/// the store stays on the orchestrating thread and hands out owned bytes.
pub struct RevisionStore {
    repo: Repository,
    options: StoreOptions,
}

impl RevisionStore {
    /// Open the repository at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DeltacovError::Git`] if `path` is not a git repository.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::path::Path;
    /// use deltacov_gitstore::{RevisionStore, StoreOptions};
    ///
    /// let store = RevisionStore::open(Path::new("."), StoreOptions::default()).unwrap();
    /// ```
    pub fn open(path: &Path, options: StoreOptions) -> Result<Self, DeltacovError> {
        let repo = Repository::open(path)
            .map_err(|e| DeltacovError::Git(format!("failed to open repository: {e}")))?;
        Ok(Self { repo, options })
    }

    /// Borrow the underlying repository (read-only use).
    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    /// Resolve a branch, tag, or commit to a snapshot.
    ///
    /// Branches resolve against the local branch first and fall back to the
    /// remote-tracking branch. Annotated tags are peeled to their commit.
    /// Commit ids may be abbreviated.
    ///
    /// # Errors
    ///
    /// Returns [`DeltacovError::RevisionNotFound`] if nothing matches.
    pub fn resolve(&self, revision: &RevisionRef) -> Result<Snapshot, DeltacovError> {
        let commit = match revision {
            RevisionRef::Branch(name) => self
                .peel_spec(&format!("refs/heads/{name}"))
                .or_else(|| {
                    self.peel_spec(&format!("refs/remotes/{}/{name}", self.options.remote))
                }),
            RevisionRef::Tag(name) => self.peel_spec(&format!("refs/tags/{name}")),
            RevisionRef::Commit(id) => self.peel_spec(id),
        }
        .ok_or_else(|| DeltacovError::RevisionNotFound {
            reference: revision.to_string(),
        })?;

        tracing::debug!(%revision, commit = %commit.id(), "resolved revision");

        Ok(Snapshot {
            commit: commit.id(),
            tree: commit.tree_id(),
            revision: revision.clone(),
        })
    }

    fn peel_spec(&self, spec: &str) -> Option<Commit<'_>> {
        self.repo.revparse_single(spec).ok()?.peel_to_commit().ok()
    }

    /// Read the bytes of `path` in the tree of `snapshot`.
    ///
    /// # Errors
    ///
    /// Returns [`DeltacovError::PathNotFound`] if the path does not exist in
    /// that tree or names a directory.
    pub fn read_file(&self, snapshot: &Snapshot, path: &str) -> Result<Vec<u8>, DeltacovError> {
        let not_found = || DeltacovError::PathNotFound {
            path: path.to_string(),
            revision: snapshot.to_string(),
        };

        let tree = self
            .repo
            .find_tree(snapshot.tree)
            .map_err(|e| DeltacovError::Git(format!("failed to load tree {}: {e}", snapshot.tree)))?;
        let entry = tree.get_path(Path::new(path)).map_err(|_| not_found())?;
        let blob = self.repo.find_blob(entry.id()).map_err(|_| not_found())?;
        Ok(blob.content().to_vec())
    }

    /// Bring a local branch up to date with its remote-tracking branch.
    ///
    /// A no-op when the local tip already equals the remote tip. Otherwise
    /// the branch is fetched and then created or fast-forwarded. If the
    /// branch is checked out, the working tree follows with a safe checkout.
    ///
    /// # Errors
    ///
    /// Returns [`DeltacovError::SyncFailure`] on network/auth failures or if
    /// the local branch has diverged from the remote, and
    /// [`DeltacovError::RevisionNotFound`] if the branch exists on neither
    /// side.
    pub fn sync_local_branch(&mut self, branch: &str) -> Result<SyncOutcome, DeltacovError> {
        if self.options.offline {
            tracing::debug!(branch, "offline mode, skipping sync");
            return Ok(SyncOutcome::Skipped);
        }

        let local_tip = self
            .repo
            .find_branch(branch, BranchType::Local)
            .ok()
            .and_then(|b| b.get().target());

        let Some(remote_tip) = self.remote_branch_tip(branch)? else {
            return match local_tip {
                Some(_) => {
                    tracing::warn!(
                        branch,
                        remote = %self.options.remote,
                        "branch not found on remote, using local branch as-is"
                    );
                    Ok(SyncOutcome::LocalOnly)
                }
                None => Err(DeltacovError::RevisionNotFound {
                    reference: format!("branch {branch}"),
                }),
            };
        };

        if local_tip == Some(remote_tip) {
            tracing::debug!(branch, "local branch is up to date");
            return Ok(SyncOutcome::UpToDate);
        }

        self.fetch_branch(branch)?;

        let sync_err = |reason: String| DeltacovError::SyncFailure {
            branch: branch.to_string(),
            reason,
        };
        let commit = self
            .repo
            .find_commit(remote_tip)
            .map_err(|e| sync_err(format!("fetched commit {remote_tip} is missing: {e}")))?;

        let Some(local_tip) = local_tip else {
            let mut created = self
                .repo
                .branch(branch, &commit, false)
                .map_err(|e| sync_err(format!("failed to create local branch: {e}")))?;
            let upstream = format!("{}/{branch}", self.options.remote);
            created
                .set_upstream(Some(upstream.as_str()))
                .map_err(|e| sync_err(format!("failed to set upstream: {e}")))?;
            tracing::info!(branch, tip = %remote_tip, "created local branch from remote");
            return Ok(SyncOutcome::Created);
        };

        let behind = self
            .repo
            .graph_descendant_of(remote_tip, local_tip)
            .map_err(|e| sync_err(format!("failed to compare histories: {e}")))?;
        if !behind {
            let ahead = self
                .repo
                .graph_descendant_of(local_tip, remote_tip)
                .map_err(|e| sync_err(format!("failed to compare histories: {e}")))?;
            if ahead {
                tracing::warn!(branch, "local branch is ahead of remote, leaving it unchanged");
                return Ok(SyncOutcome::LocalAhead);
            }
            return Err(sync_err(format!(
                "local tip {local_tip} and remote tip {remote_tip} have diverged"
            )));
        }

        self.fast_forward(branch, &commit)
            .map_err(|e| sync_err(format!("fast-forward failed: {e}")))?;
        tracing::info!(branch, from = %local_tip, to = %remote_tip, "fast-forwarded local branch");
        Ok(SyncOutcome::FastForwarded)
    }

    /// Query the remote's tip for `branch` without fetching (`ls-remote`).
    fn remote_branch_tip(&self, branch: &str) -> Result<Option<Oid>, DeltacovError> {
        let sync_err = |reason: String| DeltacovError::SyncFailure {
            branch: branch.to_string(),
            reason,
        };

        let mut remote = self
            .repo
            .find_remote(&self.options.remote)
            .map_err(|e| sync_err(format!("remote '{}' not configured: {e}", self.options.remote)))?;
        let connection = remote
            .connect_auth(
                Direction::Fetch,
                Some(remote_callbacks(self.options.credentials.as_ref())),
                None,
            )
            .map_err(|e| sync_err(format!("failed to connect to remote: {e}")))?;

        let wanted = format!("refs/heads/{branch}");
        let tip = connection
            .list()
            .map_err(|e| sync_err(format!("failed to list remote refs: {e}")))?
            .iter()
            .find(|head| head.name() == wanted)
            .map(|head| head.oid());
        Ok(tip)
    }

    fn fetch_branch(&self, branch: &str) -> Result<(), DeltacovError> {
        let remote_name = &self.options.remote;
        let mut remote = self.repo.find_remote(remote_name).map_err(|e| {
            DeltacovError::SyncFailure {
                branch: branch.to_string(),
                reason: format!("remote '{remote_name}' not configured: {e}"),
            }
        })?;

        let refspec = format!("+refs/heads/{branch}:refs/remotes/{remote_name}/{branch}");
        let mut fetch_options = FetchOptions::new();
        fetch_options.remote_callbacks(remote_callbacks(self.options.credentials.as_ref()));

        remote
            .fetch(&[refspec.as_str()], Some(&mut fetch_options), None)
            .map_err(|e| DeltacovError::SyncFailure {
                branch: branch.to_string(),
                reason: format!("fetch failed: {e}"),
            })?;
        tracing::debug!(branch, remote = %remote_name, "fetched branch");
        Ok(())
    }

    fn fast_forward(&self, branch: &str, target: &Commit<'_>) -> Result<(), git2::Error> {
        let refname = format!("refs/heads/{branch}");
        let mut reference = self.repo.find_reference(&refname)?;

        let checked_out = !self.repo.is_bare()
            && self
                .repo
                .head()
                .ok()
                .and_then(|head| head.name().map(|n| n == refname))
                .unwrap_or(false);
        if checked_out {
            self.repo
                .checkout_tree(target.as_object(), Some(CheckoutBuilder::new().safe()))?;
        }

        reference.set_target(target.id(), &format!("deltacov: fast-forward {branch}"))?;
        Ok(())
    }
}

fn remote_callbacks(credentials: Option<&Credentials>) -> RemoteCallbacks<'_> {
    let mut attempts = 0;
    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(move |_url, username_from_url, allowed| {
        attempts += 1;
        if attempts > MAX_AUTH_ATTEMPTS {
            return Err(git2::Error::from_str("authentication failed"));
        }
        if let Some(creds) = credentials {
            if allowed.contains(CredentialType::USER_PASS_PLAINTEXT) {
                return Cred::userpass_plaintext(&creds.username, &creds.password);
            }
        }
        if allowed.contains(CredentialType::SSH_KEY) {
            if let Some(user) = username_from_url {
                return Cred::ssh_key_from_agent(user);
            }
        }
        Cred::default()
    });
    callbacks
}

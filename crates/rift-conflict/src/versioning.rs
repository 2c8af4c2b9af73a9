//! Git snapshots of resolved trees
//!
//! After a run resolves conflicts inside a working tree, [`GitVersioning`]
//! records the tree state as a commit on `HEAD`.

use std::path::{Path, PathBuf};

use git2::{IndexAddOption, Oid, Repository, Signature};
use tracing::{debug, info, instrument};

use crate::error::ConflictError;

const FALLBACK_NAME: &str = "rift";
const FALLBACK_EMAIL: &str = "rift@localhost";

/// Commits resolution results into an existing git repository
pub struct GitVersioning {
    repo: Repository,
    path: PathBuf,
}

impl GitVersioning {
    /// Opens the repository at `path`
    pub fn open(path: &Path) -> Result<Self, ConflictError> {
        let repo = Repository::open(path)?;
        debug!(path = %path.display(), "Opened versioning repository");
        Ok(Self {
            repo,
            path: path.to_path_buf(),
        })
    }

    /// Opens the repository at `path`, creating it if needed
    pub fn init(path: &Path) -> Result<Self, ConflictError> {
        let repo = match Repository::open(path) {
            Ok(repo) => repo,
            Err(_) => {
                info!(path = %path.display(), "Initializing versioning repository");
                Repository::init(path)?
            }
        };
        Ok(Self {
            repo,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stages every change in the working tree and commits it on `HEAD`
    ///
    /// The author is taken from the repository configuration, falling back
    /// to `rift <rift@localhost>`.
    #[instrument(skip(self, message), fields(repo = %self.path.display()))]
    pub fn commit_resolution(&self, message: &str) -> Result<Oid, ConflictError> {
        let mut index = self.repo.index()?;
        index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None)?;
        index.write()?;
        let tree_oid = index.write_tree()?;
        let tree = self.repo.find_tree(tree_oid)?;

        let signature = match self.repo.signature() {
            Ok(sig) => sig,
            Err(_) => Signature::now(FALLBACK_NAME, FALLBACK_EMAIL)?,
        };

        let parent_commit = match self.repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(_) => None,
        };
        let parents: Vec<&git2::Commit> = parent_commit.iter().collect();

        let oid = self
            .repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?;
        info!(sha = %oid, "Committed resolution");
        Ok(oid)
    }
}

//! Path conflict detection
//!
//! Walks a tree without following symlinks and reports:
//! - two entries whose normalized relative paths collide ("duplicate")
//! - on Unix, a second path to an inode already seen (hard link, "duplicate")
//! - symlinks whose target does not exist ("broken symlink")

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use rift_core::domain::{Conflict, ConflictType};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::{unsupported, ConflictDetector, DetectionScope};
use crate::error::ConflictError;

pub const DUPLICATE: &str = "duplicate";
pub const BROKEN_SYMLINK: &str = "broken symlink";

/// Detects duplicate and dangling paths in a directory tree
#[derive(Debug, Clone)]
pub struct PathDetector {
    case_insensitive: bool,
}

impl Default for PathDetector {
    fn default() -> Self {
        Self::new(true)
    }
}

impl PathDetector {
    /// Creates a detector; with `case_insensitive`, `A.txt` and `a.txt`
    /// collide
    pub fn new(case_insensitive: bool) -> Self {
        Self { case_insensitive }
    }

    /// Walks `root` and returns path conflicts in walk order
    ///
    /// Entries are visited sorted by file name so results are stable.
    pub fn scan(&self, root: &Path) -> Result<Vec<Conflict>, ConflictError> {
        info!(root = %root.display(), "Scanning tree for path conflicts");

        let mut conflicts = Vec::new();
        let mut seen: HashMap<String, PathBuf> = HashMap::new();
        #[cfg(unix)]
        let mut inodes: HashMap<(u64, u64), PathBuf> = HashMap::new();

        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .min_depth(1);

        for entry in walker {
            let entry =
                entry.map_err(|e| ConflictError::Scan(format!("{}: {e}", root.display())))?;
            let path = entry.path();

            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping entry with unreadable metadata");
                    continue;
                }
            };

            if metadata.file_type().is_symlink() && is_dangling(path) {
                debug!(path = %path.display(), "Broken symlink");
                conflicts.push(
                    Conflict::new(ConflictType::Path, 2)
                        .with_participant(path.display().to_string())
                        .with_reason(BROKEN_SYMLINK),
                );
            }

            let key = self.normalize(root, path);
            match seen.entry(key) {
                Entry::Occupied(first) => {
                    debug!(
                        first = %first.get().display(),
                        second = %path.display(),
                        "Normalized path collision"
                    );
                    conflicts.push(duplicate(first.get(), path));
                    continue;
                }
                Entry::Vacant(slot) => {
                    slot.insert(path.to_path_buf());
                }
            }

            #[cfg(unix)]
            {
                use std::os::unix::fs::MetadataExt;

                if metadata.is_file() && metadata.nlink() > 1 {
                    match inodes.entry((metadata.dev(), metadata.ino())) {
                        Entry::Occupied(first) => {
                            debug!(
                                first = %first.get().display(),
                                second = %path.display(),
                                "Hard link to an inode already seen"
                            );
                            conflicts.push(duplicate(first.get(), path));
                        }
                        Entry::Vacant(slot) => {
                            slot.insert(path.to_path_buf());
                        }
                    }
                }
            }
        }

        info!(
            root = %root.display(),
            conflicts = conflicts.len(),
            "Path scan complete"
        );
        Ok(conflicts)
    }

    fn normalize(&self, root: &Path, path: &Path) -> String {
        let relative = path.strip_prefix(root).unwrap_or(path);
        let key = relative.to_string_lossy();
        if self.case_insensitive {
            key.to_lowercase()
        } else {
            key.into_owned()
        }
    }
}

impl ConflictDetector for PathDetector {
    fn name(&self) -> &'static str {
        "path"
    }

    fn detect(&self, scope: &DetectionScope) -> Result<Vec<Conflict>, ConflictError> {
        match scope {
            DetectionScope::Tree(root) => self.scan(root),
            other => Err(unsupported(self.name(), other)),
        }
    }

    fn accepts(&self, scope: &DetectionScope) -> bool {
        matches!(scope, DetectionScope::Tree(_))
    }
}

fn duplicate(first: &Path, second: &Path) -> Conflict {
    Conflict::new(ConflictType::Path, 1)
        .with_participants([first.display().to_string(), second.display().to_string()])
        .with_reason(DUPLICATE)
}

/// Whether the symlink at `link` points to nothing
///
/// Relative targets resolve against the link's own directory.
fn is_dangling(link: &Path) -> bool {
    let target = match fs::read_link(link) {
        Ok(t) => t,
        Err(e) => {
            warn!(path = %link.display(), error = %e, "Cannot read symlink target");
            return false;
        }
    };

    let resolved = if target.is_absolute() {
        target
    } else {
        link.parent().unwrap_or_else(|| Path::new("")).join(target)
    };

    !resolved.exists()
}

//! Project identity: path normalization and the aggregate-log hash.

use hookwatch_types::ProjectHash;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Hex characters kept from the SHA-256 digest.
pub const PROJECT_HASH_LEN: usize = 12;

/// File-name prefix of project-aggregate logs.
pub const AGGREGATE_PREFIX: &str = "project_";

/// Hash a project directory.
///
/// The path is canonicalized first so `/var/...` and `/private/var/...`
/// style aliases produce the same hash.
pub fn project_hash(project_dir: &Path) -> ProjectHash {
    let normalized = normalize_path(project_dir);

    let mut hasher = Sha256::new();
    hasher.update(normalized.to_string_lossy().as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    ProjectHash::new(&digest[..PROJECT_HASH_LEN])
}

/// File name of a project's aggregate log, e.g. `project_1a2b3c4d5e6f.jsonl`.
pub fn aggregate_log_name(hash: &ProjectHash) -> String {
    format!("{}{}.jsonl", AGGREGATE_PREFIX, hash)
}

/// Path of a project's aggregate log inside `log_dir` (may not exist).
pub fn aggregate_log_path(log_dir: &Path, project_dir: &Path) -> PathBuf {
    log_dir.join(aggregate_log_name(&project_hash(project_dir)))
}

/// Normalize a path for comparison (resolve to absolute, canonicalize if possible).
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(path))
                .unwrap_or_else(|_| path.to_path_buf())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_hash_is_stable_and_short() {
        let a = project_hash(Path::new("/repo"));
        let b = project_hash(Path::new("/repo"));
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), PROJECT_HASH_LEN);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_distinct_paths_hash_differently() {
        assert_ne!(
            project_hash(Path::new("/repo")),
            project_hash(Path::new("/repo-other"))
        );
    }

    #[test]
    fn test_hash_follows_canonical_path() {
        let tmp = TempDir::new().unwrap();
        let repo = tmp.path().join("repo");
        std::fs::create_dir(&repo).unwrap();
        let dotted = tmp.path().join("repo").join("..").join("repo");
        assert_eq!(project_hash(&repo), project_hash(&dotted));
    }

    #[test]
    fn test_aggregate_log_name() {
        let hash = ProjectHash::new("0123456789ab");
        assert_eq!(aggregate_log_name(&hash), "project_0123456789ab.jsonl");
    }
}

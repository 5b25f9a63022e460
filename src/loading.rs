use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use thiserror::Error;

use crate::data::Snapshot;
use crate::defaults::{SNAPSHOT_FILE_EXTENSION, SNAPSHOT_FILE_PREFIX};

/// Why a candidate snapshot file was excluded from the loaded set.
#[derive(Debug, Error)]
pub enum SkipReason {
    #[error("unreadable: {0}")]
    Unreadable(#[from] std::io::Error),
    #[error("malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("snapshot has an empty commit hash")]
    EmptyCommitHash,
    #[error("snapshot contains no benchmarks")]
    EmptyBenchmarks,
}

#[derive(Debug)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// Distinguishes a normal (possibly empty) load from the cases the caller
/// may want to treat as fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// The directory existed and contained at least one candidate file.
    Loaded,
    /// The directory existed but no `benchmark_*.json` files were found.
    NoSnapshotFiles,
    /// The directory does not exist or could not be read.
    MissingDirectory,
}

#[derive(Debug)]
pub struct LoadOutcome {
    pub snapshots: Vec<Snapshot>,
    pub skipped: Vec<SkippedFile>,
    pub status: LoadStatus,
}

impl LoadOutcome {
    /// True when at least one snapshot was parsed successfully.
    #[must_use]
    pub fn has_data(&self) -> bool {
        self.status == LoadStatus::Loaded && !self.snapshots.is_empty()
    }
}

fn is_snapshot_file(path: &Path) -> bool {
    let has_extension = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(SNAPSHOT_FILE_EXTENSION));
    let has_prefix = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(SNAPSHOT_FILE_PREFIX));
    has_extension && has_prefix
}

fn parse_snapshot_file(path: &Path) -> Result<Snapshot, SkipReason> {
    let contents = fs::read_to_string(path)?;
    let snapshot: Snapshot = serde_json::from_str(&contents)?;
    if snapshot.commit_hash.is_empty() {
        return Err(SkipReason::EmptyCommitHash);
    }
    if snapshot.benchmarks.is_empty() {
        return Err(SkipReason::EmptyBenchmarks);
    }
    Ok(snapshot)
}

/// Loads all parseable snapshots from `dir`.
///
/// A single corrupt file never aborts the load: per-file failures are
/// recorded in [`LoadOutcome::skipped`] and loading continues. Malformed
/// snapshots are discarded wholesale, never partially merged. The returned
/// snapshots carry no ordering guarantee; chronological ordering is the
/// aggregator's responsibility.
#[must_use]
pub fn load_snapshots(dir: &Path) -> LoadOutcome {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!("Cannot read benchmark directory {}: {err}", dir.display());
            return LoadOutcome {
                snapshots: Vec::new(),
                skipped: Vec::new(),
                status: LoadStatus::MissingDirectory,
            };
        }
    };

    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| is_snapshot_file(path))
        .collect();
    // Scan order is not deterministic across file systems.
    candidates.sort();

    if candidates.is_empty() {
        return LoadOutcome {
            snapshots: Vec::new(),
            skipped: Vec::new(),
            status: LoadStatus::NoSnapshotFiles,
        };
    }

    let mut snapshots = Vec::new();
    let mut skipped = Vec::new();
    for path in candidates {
        match parse_snapshot_file(&path) {
            Ok(snapshot) => {
                debug!(
                    "Loaded snapshot for commit {} from {}",
                    snapshot.commit_hash,
                    path.display()
                );
                snapshots.push(snapshot);
            }
            Err(reason) => {
                warn!("Skipping {}: {reason}", path.display());
                skipped.push(SkippedFile { path, reason });
            }
        }
    }

    LoadOutcome {
        snapshots,
        skipped,
        status: LoadStatus::Loaded,
    }
}

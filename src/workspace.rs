//! Per-probe workspace directories.
//!
//! Each probe gets its own directory under the run's temp root, named
//! after its [`ProbeId`] path, containing the serialised candidate file
//! the oracle is invoked against. Winning candidates are promoted into
//! the run's output location; everything else is discarded once the
//! engine advances past the iteration that produced it.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::core::ProbeId;
use crate::error::{EngineError, Result};

/// Owns the run's temp root and hands out per-probe scratch directories.
///
/// Every probe needs an isolated filesystem location because probes
/// race concurrently and must not trample each other's candidate files.
pub struct Workspace {
    tmp_root: TempDir,
    session_dir: PathBuf,
    candidate_file_name: String,
}

impl Workspace {
    /// Creates a fresh temp root under a generated session id.
    /// `candidate_file_name` is the name given to the serialised
    /// candidate inside each probe directory (e.g. the original input's
    /// basename, so tools that care about file extensions still work).
    pub fn new(candidate_file_name: impl Into<String>) -> Result<Self> {
        Self::with_session_id(candidate_file_name, generate_session_id())
    }

    /// Like [`Self::new`], but honours an explicit session id (`--session-id`)
    /// instead of generating one, per the `<tmp_root>/<session_id>/<probe_path>`
    /// layout (§6).
    pub fn with_session_id(candidate_file_name: impl Into<String>, session_id: impl Into<String>) -> Result<Self> {
        let tmp_root = tempfile::Builder::new()
            .prefix("picire-rs-")
            .tempdir()
            .map_err(|source| EngineError::Io {
                operation: "create workspace root".to_string(),
                source,
            })?;
        let session_dir = tmp_root.path().join(session_id.into());
        std::fs::create_dir_all(&session_dir).map_err(|source| EngineError::Workspace {
            path: session_dir.clone(),
            message: source.to_string(),
        })?;
        Ok(Self {
            tmp_root,
            session_dir,
            candidate_file_name: candidate_file_name.into(),
        })
    }

    /// The run's session directory (`<tmp_root>/<session_id>`).
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.session_dir
    }

    /// Creates the directory for `probe` and writes `content` into the
    /// probe's candidate file. Returns the candidate file's path.
    pub fn prepare_probe(&self, probe: &ProbeId, content: &[u8]) -> Result<PathBuf> {
        let dir = self.session_dir.join(probe.path());
        std::fs::create_dir_all(&dir).map_err(|source| EngineError::Workspace {
            path: dir.clone(),
            message: source.to_string(),
        })?;
        let file_path = dir.join(&self.candidate_file_name);
        std::fs::write(&file_path, content).map_err(|source| EngineError::Workspace {
            path: file_path.clone(),
            message: source.to_string(),
        })?;
        Ok(file_path)
    }

    /// Removes a probe's directory once it is no longer needed (verdict
    /// reached and recorded, or the probe was cancelled).
    pub fn cleanup_probe(&self, probe: &ProbeId) {
        let dir = self.session_dir.join(probe.path());
        let _ = std::fs::remove_dir_all(dir);
    }

    /// Copies `candidate_path` out to `destination`, overwriting it. Used
    /// to publish the final minimized result outside the temp root,
    /// which is deleted when the `Workspace` is dropped.
    pub fn promote(&self, candidate_path: &Path, destination: &Path) -> Result<()> {
        std::fs::copy(candidate_path, destination).map_err(|source| EngineError::Workspace {
            path: destination.to_path_buf(),
            message: source.to_string(),
        })?;
        Ok(())
    }
}

/// Derives a timestamp-based session id for the run's workspace path,
/// used when `--session-id` is not given (`cli/parser.rs`'s documented
/// default: "a timestamp-derived identifier").
fn generate_session_id() -> String {
    let since_epoch = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    format!("session-{}-{}", since_epoch.as_secs(), since_epoch.subsec_nanos())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::core::PathSegment;

    #[test]
    fn prepare_probe_writes_candidate_under_probe_path() {
        let workspace = Workspace::new("input.txt").expect("workspace");
        let probe_id = ProbeId::child(&ProbeId::default(), PathSegment::Iteration(0));
        let path = workspace.prepare_probe(&probe_id, b"hello").expect("prepare");
        assert!(path.ends_with("it0/input.txt"));
        assert_eq!(std::fs::read(&path).unwrap(), b"hello");
    }

    #[test]
    fn cleanup_probe_removes_its_directory() {
        let workspace = Workspace::new("input.txt").expect("workspace");
        let probe_id = ProbeId::child(&ProbeId::default(), PathSegment::Chunk(1));
        let path = workspace.prepare_probe(&probe_id, b"x").expect("prepare");
        assert!(path.exists());
        workspace.cleanup_probe(&probe_id);
        assert!(!path.exists());
    }

    #[test]
    fn promote_copies_candidate_to_destination() {
        let workspace = Workspace::new("input.txt").expect("workspace");
        let probe_id = ProbeId::default();
        let path = workspace.prepare_probe(&probe_id, b"final").expect("prepare");
        let dest_dir = tempfile::tempdir().expect("dest dir");
        let dest = dest_dir.path().join("out.txt");
        workspace.promote(&path, &dest).expect("promote");
        assert_eq!(std::fs::read(&dest).unwrap(), b"final");
    }

    #[test]
    fn explicit_session_id_is_reflected_in_the_workspace_path() {
        let workspace = Workspace::with_session_id("input.txt", "custom-session").expect("workspace");
        assert!(workspace.root().ends_with("custom-session"));
    }
}

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use tracing::{debug, warn};

use crate::error::SlidecastResult;

/// Run-scoped working directory for one pipeline run.
///
/// Every temporary the pipeline writes lives under a uniquely named root:
/// synthesized narration under `audio/`, resized stills under `stills/`,
/// encoded segments and the concat manifest under `scenes/`. Each run owns
/// its root exclusively, so concurrent runs cannot collide on shared names.
///
/// Cleanup is best-effort and never masks the run's primary result: every
/// failure is logged and the run's error (or success) stands. `Drop` runs
/// the same cleanup so error paths and panics are covered too.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    audio_dir: PathBuf,
    stills_dir: PathBuf,
    scenes_dir: PathBuf,
    keep: bool,
    cleaned: bool,
}

impl Workspace {
    /// Create a workspace under the system temp directory.
    pub fn create() -> SlidecastResult<Self> {
        Self::create_in(&std::env::temp_dir())
    }

    /// Create a workspace under an explicit parent directory.
    pub fn create_in(parent: &Path) -> SlidecastResult<Self> {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create workspace parent '{}'", parent.display()))?;
        let root = tempfile::Builder::new()
            .prefix("slidecast_")
            .tempdir_in(parent)
            .with_context(|| format!("create workspace under '{}'", parent.display()))?
            .keep();

        let audio_dir = root.join("audio");
        let stills_dir = root.join("stills");
        let scenes_dir = root.join("scenes");
        for dir in [&audio_dir, &stills_dir, &scenes_dir] {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("create workspace dir '{}'", dir.display()))?;
        }

        debug!(root = %root.display(), "workspace created");
        Ok(Self {
            root,
            audio_dir,
            stills_dir,
            scenes_dir,
            keep: false,
            cleaned: false,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn audio_dir(&self) -> &Path {
        &self.audio_dir
    }

    pub fn stills_dir(&self) -> &Path {
        &self.stills_dir
    }

    pub fn scenes_dir(&self) -> &Path {
        &self.scenes_dir
    }

    /// Path of the concat manifest consumed by the encoder subprocess.
    pub fn manifest_path(&self) -> PathBuf {
        self.scenes_dir.join("concat_list.txt")
    }

    /// Leave the workspace on disk when the run ends (debugging aid).
    pub fn keep(&mut self) {
        self.keep = true;
    }

    /// Remove everything this run wrote. Idempotent and best-effort; a
    /// failure is logged, not returned.
    pub fn cleanup(&mut self) {
        if self.cleaned || self.keep {
            return;
        }
        self.cleaned = true;

        if let Err(e) = std::fs::remove_dir_all(&self.root) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(root = %self.root.display(), error = %e, "workspace cleanup failed");
            }
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        self.cleanup();
    }
}

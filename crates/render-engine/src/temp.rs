//! Scratch files for intermediate renders.

use std::path::{Path, PathBuf};

use dailies_common::error::{DailiesError, DailiesResult};

/// Short-name marker Windows uses for abbreviated path components.
const SHORT_NAME_MARKER: &str = "~1";

/// A scratch path handed out by a tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TempArtifact {
    pub path: PathBuf,
    /// Whether cleanup may delete the file.
    pub owned: bool,
}

/// Allocates scratch paths and removes them once a run is done.
#[derive(Debug, Clone, Default)]
pub struct TempArtifactTracker {
    root: Option<PathBuf>,
    artifacts: Vec<TempArtifact>,
}

impl TempArtifactTracker {
    /// Tracker rooted at the platform temp directory.
    pub fn platform() -> Self {
        Self::default()
    }

    /// Tracker rooted at an explicit directory.
    pub fn in_dir(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            artifacts: Vec::new(),
        }
    }

    /// The directory new artifacts are placed in.
    pub fn dir(&self) -> DailiesResult<PathBuf> {
        match &self.root {
            Some(root) => Ok(root.clone()),
            None => platform_temp_dir(),
        }
    }

    /// Reserve `dir/name`, creating the directory if needed. The file
    /// itself is not created.
    pub fn allocate(&mut self, name: &str) -> DailiesResult<PathBuf> {
        let dir = self.dir()?;
        if !dir.exists() {
            std::fs::create_dir_all(&dir)?;
        }
        let path = dir.join(name);
        tracing::debug!(path = %path.display(), "Allocated temp file");
        self.artifacts.push(TempArtifact {
            path: path.clone(),
            owned: true,
        });
        Ok(path)
    }

    /// Hand an allocated artifact over to the caller. Cleanup forgets it
    /// without deleting the file. Returns `false` when `path` is not an
    /// owned artifact of this tracker.
    pub fn release(&mut self, path: &Path) -> bool {
        match self
            .artifacts
            .iter_mut()
            .find(|artifact| artifact.owned && artifact.path == path)
        {
            Some(artifact) => {
                artifact.owned = false;
                true
            }
            None => false,
        }
    }

    pub fn artifacts(&self) -> &[TempArtifact] {
        &self.artifacts
    }

    /// Delete every owned artifact that exists and forget all entries.
    /// Failures are logged, never returned. Returns the number of files
    /// removed.
    pub fn cleanup(&mut self) -> usize {
        let mut removed = 0;
        for artifact in self.artifacts.drain(..) {
            if !artifact.owned || !artifact.path.exists() {
                continue;
            }
            match std::fs::remove_file(&artifact.path) {
                Ok(()) => removed += 1,
                Err(err) => tracing::warn!(
                    path = %artifact.path.display(),
                    error = %err,
                    "Failed to remove temp file"
                ),
            }
        }
        removed
    }
}

/// Temp directory of the running platform.
pub fn platform_temp_dir() -> DailiesResult<PathBuf> {
    resolve_temp_dir(cfg!(windows), |key| std::env::var(key).ok())
}

/// Temp directory from the environment: `TEMP` on Windows, `TMPDIR`
/// elsewhere.
///
/// On Windows separators become `/` and components abbreviated with `~1`
/// are replaced by `USERNAME`.
pub fn resolve_temp_dir(
    windows: bool,
    env: impl Fn(&str) -> Option<String>,
) -> DailiesResult<PathBuf> {
    let variable = if windows { "TEMP" } else { "TMPDIR" };
    let raw = env(variable)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| DailiesError::TempDirUnavailable {
            variable: variable.to_string(),
        })?;

    if !windows {
        return absolute(Path::new(&raw));
    }

    let normalized = raw.replace('\\', "/");
    let expanded = match env("USERNAME") {
        Some(user) => expand_short_names(&normalized, &user),
        None => normalized,
    };
    Ok(PathBuf::from(expanded))
}

fn expand_short_names(path: &str, user: &str) -> String {
    path.split('/')
        .map(|component| {
            if component.contains(SHORT_NAME_MARKER) {
                user
            } else {
                component
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn absolute(path: &Path) -> DailiesResult<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

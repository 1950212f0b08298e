//! Locating the ffmpeg and ffprobe executables.

use std::path::{Path, PathBuf};

use dailies_common::config::LoadedConfig;

pub const FFMPEG: &str = "ffmpeg";
pub const FFPROBE: &str = "ffprobe";

/// Resolved engine executables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnginePaths {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl Default for EnginePaths {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from(FFMPEG),
            ffprobe: PathBuf::from(FFPROBE),
        }
    }
}

impl EnginePaths {
    /// Resolve both executables.
    ///
    /// An explicit path in the config wins, then a binary bundled under
    /// `bin/` next to the config, then a `PATH` lookup. When all of these
    /// fail the bare program name is kept and spawning reports the error.
    pub fn from_config(loaded: &LoadedConfig) -> Self {
        let engine = &loaded.config.engine;
        Self {
            ffmpeg: locate(loaded, engine.ffmpeg.as_deref(), FFMPEG),
            ffprobe: locate(loaded, engine.ffprobe.as_deref(), FFPROBE),
        }
    }

    /// Whether ffmpeg can be found.
    pub fn ffmpeg_available(&self) -> bool {
        is_available(&self.ffmpeg)
    }

    /// Whether ffprobe can be found.
    pub fn ffprobe_available(&self) -> bool {
        is_available(&self.ffprobe)
    }
}

fn locate(loaded: &LoadedConfig, configured: Option<&Path>, name: &str) -> PathBuf {
    if let Some(path) = configured {
        return path.to_path_buf();
    }
    let file_name = format!("{name}{}", std::env::consts::EXE_SUFFIX);
    if let Some(bundled) = loaded.bundled_binary(&file_name) {
        tracing::debug!(path = %bundled.display(), "Using bundled {name}");
        return bundled;
    }
    match which::which(name) {
        Ok(found) => found,
        Err(_) => {
            tracing::debug!("{name} not found on PATH");
            PathBuf::from(name)
        }
    }
}

/// Whether a program path points at an existing file or resolves on `PATH`.
pub fn is_available(program: &Path) -> bool {
    if program.components().count() > 1 {
        return program.is_file();
    }
    which::which(program).is_ok()
}

//! Application configuration.
//!
//! The configuration file (`dailies.json`) lives next to a `resources/`
//! directory holding the slate assets. Asset names in the file are resolved
//! against that directory.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{DailiesError, DailiesResult};

/// Name of the configuration file looked up by [`LoadedConfig::discover`].
pub const CONFIG_FILE_NAME: &str = "dailies.json";

/// Environment variable that points at an explicit configuration file.
pub const CONFIG_ENV_VAR: &str = "DAILIES_CONFIG";

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailiesConfig {
    /// Bars asset overlaid at the bottom-right of the slate.
    pub bars: String,

    /// Color bars asset stamped onto the slate thumbnail.
    pub color_bar: String,

    /// Company logo image.
    pub company_logo: String,

    /// Font used for the company headline.
    pub company_font: String,

    /// Font used for every other slate and burn-in text.
    pub body_font: String,

    /// Named encoding presets (space separated ffmpeg output options).
    #[serde(default, alias = "video_pressets")]
    pub video_presets: BTreeMap<String, String>,

    /// External engine settings.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Keep intermediate slate images after a movie render.
    #[serde(default)]
    pub keep_temp_files: bool,
}

/// External media engine settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Explicit ffmpeg executable.
    #[serde(default)]
    pub ffmpeg: Option<PathBuf>,

    /// Explicit ffprobe executable.
    #[serde(default)]
    pub ffprobe: Option<PathBuf>,

    /// Kill an engine invocation that runs longer than this.
    #[serde(default)]
    pub timeout_secs: Option<f64>,

    /// Let the engine print its own log output instead of errors only.
    #[serde(default)]
    pub verbose: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "dailies=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for DailiesConfig {
    fn default() -> Self {
        Self {
            bars: "bars.png".to_string(),
            color_bar: "color_bars.png".to_string(),
            company_logo: "logo.png".to_string(),
            company_font: "company.ttf".to_string(),
            body_font: "body.ttf".to_string(),
            video_presets: BTreeMap::new(),
            engine: EngineConfig::default(),
            logging: LoggingConfig::default(),
            keep_temp_files: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl DailiesConfig {
    /// Look up a preset by name.
    pub fn preset(&self, name: &str) -> Option<&str> {
        self.video_presets.get(name).map(String::as_str)
    }
}

/// A configuration together with the directory it was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Directory containing the configuration file.
    pub root: PathBuf,

    /// Parsed configuration.
    pub config: DailiesConfig,
}

impl LoadedConfig {
    /// Load and parse a configuration file.
    pub fn load(path: &Path) -> DailiesResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DailiesError::config(format!("Failed to read {}: {e}", path.display()))
        })?;
        let config: DailiesConfig = serde_json::from_str(&content).map_err(|e| {
            DailiesError::config(format!("Failed to parse {}: {e}", path.display()))
        })?;

        let root = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        tracing::debug!(
            path = %path.display(),
            presets = config.video_presets.len(),
            "Loaded config"
        );
        Ok(Self { root, config })
    }

    /// Find a configuration file in the standard locations.
    ///
    /// Order: `$DAILIES_CONFIG`, next to the running executable, then the
    /// user config directory. Falls back to defaults rooted at the current
    /// directory when nothing is found.
    pub fn discover() -> DailiesResult<Self> {
        if let Ok(explicit) = std::env::var(CONFIG_ENV_VAR) {
            return Self::load(Path::new(&explicit));
        }

        for candidate in candidate_paths() {
            if candidate.exists() {
                return Self::load(&candidate);
            }
        }

        tracing::warn!("No {CONFIG_FILE_NAME} found, using default configuration");
        Ok(Self {
            root: PathBuf::from("."),
            config: DailiesConfig::default(),
        })
    }

    /// Directory holding slate assets and fonts.
    pub fn resources_dir(&self) -> PathBuf {
        self.root.join("resources")
    }

    /// Resolve an asset file name against the resources directory.
    pub fn resource(&self, name: &str) -> PathBuf {
        self.resources_dir().join(name)
    }

    /// A bundled executable under `bin/`, if one ships with the config.
    pub fn bundled_binary(&self, name: &str) -> Option<PathBuf> {
        let path = self.root.join("bin").join(name);
        path.exists().then_some(path)
    }
}

fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        paths.push(exe_dir.join(CONFIG_FILE_NAME));
    }

    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|_| std::env::var("HOME").map(|home| PathBuf::from(home).join(".config")));
    if let Ok(base) = base {
        paths.push(base.join("dailies").join(CONFIG_FILE_NAME));
    }

    paths
}

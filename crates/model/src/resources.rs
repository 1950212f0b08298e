//! Fixed visual assets used by slates and burn-ins.

use std::path::{Path, PathBuf};

use dailies_common::config::LoadedConfig;

/// Filesystem paths of the slate assets and fonts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePaths {
    /// Bars overlaid at the bottom-right of the slate.
    pub bars: PathBuf,
    /// Color bars stamped onto the thumbnail corners.
    pub color_bars: PathBuf,
    /// Company logo.
    pub logo: PathBuf,
    /// Company headline font.
    pub logo_font: PathBuf,
    /// Body text font.
    pub body_font: PathBuf,
}

impl ResourcePaths {
    /// Resolve every asset against the configuration's resources directory.
    pub fn from_config(loaded: &LoadedConfig) -> Self {
        let config = &loaded.config;
        Self {
            bars: loaded.resource(&config.bars),
            color_bars: loaded.resource(&config.color_bar),
            logo: loaded.resource(&config.company_logo),
            logo_font: loaded.resource(&config.company_font),
            body_font: loaded.resource(&config.body_font),
        }
    }

    /// All assets with a short role name.
    pub fn entries(&self) -> [(&'static str, &Path); 5] {
        [
            ("bars", self.bars.as_path()),
            ("color_bar", self.color_bars.as_path()),
            ("company_logo", self.logo.as_path()),
            ("company_font", self.logo_font.as_path()),
            ("body_font", self.body_font.as_path()),
        ]
    }

    /// Assets that do not exist on disk.
    pub fn missing(&self) -> Vec<(&'static str, &Path)> {
        self.entries()
            .into_iter()
            .filter(|(_, path)| !path.exists())
            .collect()
    }
}

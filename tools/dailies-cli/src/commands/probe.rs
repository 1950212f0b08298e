//! Show video stream metadata.

use std::path::Path;

use dailies_common::config::LoadedConfig;
use dailies_render_engine::Dailies;

pub fn run(loaded: LoadedConfig, path: &Path) -> anyhow::Result<()> {
    let dailies = Dailies::from_config(loaded)?;
    let info = dailies.media_info(path)?;
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}

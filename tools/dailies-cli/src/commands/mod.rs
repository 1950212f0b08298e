pub mod check;
pub mod fields;
pub mod mov;
pub mod probe;
pub mod slate;

use dailies_common::config::LoadedConfig;
use dailies_render_engine::{CancelToken, FfmpegRunner};

/// Runner for real renders: configured timeout, stopped once `cancel` fires.
pub fn engine_runner(loaded: &LoadedConfig, cancel: CancelToken) -> anyhow::Result<FfmpegRunner> {
    Ok(FfmpegRunner::from_config(&loaded.config.engine)?.with_cancel(cancel))
}

//! Render a slate image.

use std::path::PathBuf;

use dailies_common::config::LoadedConfig;
use dailies_model::sequence;
use dailies_render_engine::{CancelToken, Dailies, DryRunRunner, EngineRunner};

use super::fields::FieldArgs;

pub fn run(
    loaded: LoadedConfig,
    dry_run: bool,
    cancel: CancelToken,
    pattern: &str,
    output: Option<PathBuf>,
    fields: &FieldArgs,
) -> anyhow::Result<()> {
    if dry_run {
        render(Dailies::with_runner(loaded, DryRunRunner), pattern, None, fields)
    } else {
        let runner = super::engine_runner(&loaded, cancel)?;
        render(Dailies::with_runner(loaded, runner), pattern, output, fields)
    }
}

fn render<R: EngineRunner>(
    mut dailies: Dailies<R>,
    pattern: &str,
    output: Option<PathBuf>,
    fields: &FieldArgs,
) -> anyhow::Result<()> {
    let seq = sequence::resolve(pattern)?;
    dailies.set_field_set(fields.to_field_set(&seq)?);

    let slate = dailies.make_slate(pattern)?;
    let path = match output {
        Some(dest) => {
            if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(&slate, &dest).map_err(|e| {
                anyhow::anyhow!("Failed to copy slate to {}: {e}", dest.display())
            })?;
            if let Err(err) = std::fs::remove_file(&slate) {
                tracing::warn!(
                    path = %slate.display(),
                    error = %err,
                    "Failed to remove temp slate"
                );
            }
            dest
        }
        None => slate,
    };

    println!("Slate: {}", path.display());
    Ok(())
}

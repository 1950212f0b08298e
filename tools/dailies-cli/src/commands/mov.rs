//! Render a review movie.

use std::path::Path;

use dailies_common::config::LoadedConfig;
use dailies_model::sequence;
use dailies_render_engine::{CancelToken, Dailies, DryRunRunner, EngineRunner, MovieOptions};

use super::fields::FieldArgs;

pub struct MovArgs {
    pub preset: String,
    pub burnin: bool,
    pub slate: bool,
}

pub fn run(
    loaded: LoadedConfig,
    dry_run: bool,
    cancel: CancelToken,
    pattern: &str,
    output: &Path,
    args: MovArgs,
    fields: &FieldArgs,
) -> anyhow::Result<()> {
    let options = MovieOptions {
        preset: args.preset,
        burnin: args.burnin,
        slate: args.slate,
    };
    if dry_run {
        render(Dailies::with_runner(loaded, DryRunRunner), pattern, output, &options, fields)
    } else {
        let runner = super::engine_runner(&loaded, cancel)?;
        render(Dailies::with_runner(loaded, runner), pattern, output, &options, fields)
    }
}

fn render<R: EngineRunner>(
    mut dailies: Dailies<R>,
    pattern: &str,
    output: &Path,
    options: &MovieOptions,
    fields: &FieldArgs,
) -> anyhow::Result<()> {
    let seq = sequence::resolve(pattern)?;
    println!(
        "Sequence: {} ({} frames, {})",
        seq.file_name(),
        seq.frame_count(),
        seq.frame_range()
    );
    if options.slate {
        dailies.set_field_set(fields.to_field_set(&seq)?);
    }

    let start = std::time::Instant::now();
    let path = dailies.make_mov(pattern, output, options)?;

    println!("Movie: {}", path.display());
    println!("  Renders: {}", dailies.commands().len());
    println!("  Elapsed: {:.1}s", start.elapsed().as_secs_f64());
    Ok(())
}

//! Check engine executables and slate resources.

use dailies_common::config::LoadedConfig;
use dailies_model::resources::ResourcePaths;
use dailies_render_engine::EnginePaths;

pub fn run(loaded: &LoadedConfig) -> anyhow::Result<()> {
    println!("Dailies System Check");
    println!("{}", "=".repeat(50));
    println!("Config root: {}", loaded.root.display());

    let engine = EnginePaths::from_config(loaded);
    let mut problems = 0;

    for (name, path, available) in [
        ("ffmpeg", &engine.ffmpeg, engine.ffmpeg_available()),
        ("ffprobe", &engine.ffprobe, engine.ffprobe_available()),
    ] {
        if available {
            println!("[OK] {name}: {}", path.display());
        } else {
            println!("[MISSING] {name}: {}", path.display());
            problems += 1;
        }
    }

    let resources = ResourcePaths::from_config(loaded);
    let missing = resources.missing();
    for (name, path) in resources.entries() {
        let status = if missing.iter().any(|(m, _)| *m == name) {
            "MISSING"
        } else {
            "OK"
        };
        println!("[{status}] {name}: {}", path.display());
    }
    problems += missing.len();

    let presets = &loaded.config.video_presets;
    println!();
    if presets.is_empty() {
        println!("Video presets: none (default encoding only)");
    } else {
        println!("Video presets:");
        for (name, options) in presets {
            println!("  {name}: {options}");
        }
    }

    println!();
    if problems == 0 {
        println!("Everything needed for slates and movies is available.");
        Ok(())
    } else {
        anyhow::bail!("{problems} required item(s) missing. See above.")
    }
}

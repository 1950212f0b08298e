//! Slate and movie generation for one shot.
//!
//! [`Dailies`] resolves the sequence, renders the slate when asked, builds the
//! movie graph and hands each invocation to an [`EngineRunner`]. Every
//! invocation is recorded before it runs and can be inspected through
//! [`Dailies::commands`].

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::{Map, Value};

use dailies_common::config::LoadedConfig;
use dailies_common::error::DailiesResult;
use dailies_model::fields::FieldSet;
use dailies_model::layout::LayoutConfig;
use dailies_model::resources::ResourcePaths;
use dailies_model::sequence::{self, SequenceDescriptor};

use crate::command::{CommandBuilder, EncodingOptions, EngineInvocation, InputBindings};
use crate::engine::EnginePaths;
use crate::movie::{build_movie_graph, MovieGraphOptions};
use crate::probe;
use crate::runner::{EngineRunner, FfmpegRunner};
use crate::slate::build_slate_graph;
use crate::temp::{TempArtifact, TempArtifactTracker};

/// Used in slate names when the sequence has no name before its frame token.
const FALLBACK_SLATE_STEM: &str = "tmp";

/// Numbers pipelines within the process so their scratch names never collide.
static NEXT_PIPELINE: AtomicU64 = AtomicU64::new(0);

/// Options for [`Dailies::make_mov`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieOptions {
    /// Name of a configured video preset. Empty selects the default.
    pub preset: String,
    pub burnin: bool,
    pub slate: bool,
}

impl Default for MovieOptions {
    fn default() -> Self {
        Self {
            preset: String::new(),
            burnin: true,
            slate: true,
        }
    }
}

/// Progress of the most recent run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    SequenceResolved,
    SlateBuilt,
    MovBuilt,
    Done,
}

/// Dailies generator.
pub struct Dailies<R: EngineRunner = FfmpegRunner> {
    config: LoadedConfig,
    layout: LayoutConfig,
    resources: ResourcePaths,
    engine: EnginePaths,
    fields: FieldSet,
    runner: R,
    temp: TempArtifactTracker,
    history: Vec<EngineInvocation>,
    state: PipelineState,
    /// Process id and pipeline number, part of every scratch file name.
    tag: String,
}

impl Dailies<FfmpegRunner> {
    /// Generator that runs the real engine, honoring the configured timeout.
    pub fn from_config(config: LoadedConfig) -> DailiesResult<Self> {
        let runner = FfmpegRunner::from_config(&config.config.engine)?;
        Ok(Self::with_runner(config, runner))
    }
}

impl<R: EngineRunner> Dailies<R> {
    pub fn with_runner(config: LoadedConfig, runner: R) -> Self {
        let resources = ResourcePaths::from_config(&config);
        let engine = EnginePaths::from_config(&config);
        Self {
            config,
            layout: LayoutConfig::default(),
            resources,
            engine,
            fields: FieldSet::new(),
            runner,
            temp: TempArtifactTracker::platform(),
            history: Vec::new(),
            state: PipelineState::Idle,
            tag: format!(
                "{}-{}",
                std::process::id(),
                NEXT_PIPELINE.fetch_add(1, Ordering::Relaxed)
            ),
        }
    }

    /// Place intermediate files with this tracker instead of the platform
    /// temp directory.
    pub fn with_temp_tracker(mut self, temp: TempArtifactTracker) -> Self {
        self.temp = temp;
        self
    }

    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_engine_paths(mut self, engine: EnginePaths) -> Self {
        self.engine = engine;
        self
    }

    /// Replace the slate fields from a string-keyed mapping.
    pub fn set_fields(&mut self, values: &Map<String, Value>) -> DailiesResult<()> {
        self.fields = FieldSet::from_json_map(values)?;
        Ok(())
    }

    pub fn set_field_set(&mut self, fields: FieldSet) {
        self.fields = fields;
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    pub fn resources(&self) -> &ResourcePaths {
        &self.resources
    }

    pub fn engine(&self) -> &EnginePaths {
        &self.engine
    }

    /// Invocations built so far, in execution order.
    pub fn commands(&self) -> &[EngineInvocation] {
        &self.history
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn temp_artifacts(&self) -> &[TempArtifact] {
        self.temp.artifacts()
    }

    /// Render the slate for a sequence and return the image path.
    ///
    /// The image belongs to the caller: later cleanups leave it in place.
    pub fn make_slate(&mut self, pattern: &str) -> DailiesResult<PathBuf> {
        let sequence = self.resolve(pattern)?;
        let name = self.slate_file_name(&sequence, None);
        let slate = self.render_slate(&sequence, &name)?;
        self.temp.release(&slate);
        Ok(slate)
    }

    /// Render the review movie to `output` and return its path.
    pub fn make_mov(
        &mut self,
        pattern: &str,
        output: &Path,
        options: &MovieOptions,
    ) -> DailiesResult<PathBuf> {
        let result = self.render_movie(pattern, output, options);
        if !self.config.config.keep_temp_files {
            let removed = self.temp.cleanup();
            tracing::debug!(removed, "Cleaned up temp files");
        }
        if result.is_ok() {
            self.state = PipelineState::Done;
        }
        result
    }

    /// Metadata of the first video stream of a media file.
    pub fn media_info(&self, path: &Path) -> DailiesResult<Value> {
        probe::media_info(&self.runner, &self.engine.ffprobe, path)
    }

    fn resolve(&mut self, pattern: &str) -> DailiesResult<SequenceDescriptor> {
        self.state = PipelineState::Idle;
        let sequence = sequence::resolve(pattern)?;
        let missing = sequence.missing_frames();
        if !missing.is_empty() {
            tracing::warn!(
                pattern,
                missing = missing.len(),
                "Sequence has gaps; the engine will stop at the first missing frame"
            );
        }
        self.state = PipelineState::SequenceResolved;
        Ok(sequence)
    }

    /// `<sequence>_slate_<tag>.png`; slates rendered for a movie also carry
    /// the movie's file stem.
    fn slate_file_name(&self, sequence: &SequenceDescriptor, movie: Option<&Path>) -> String {
        let base = sequence.base_name();
        let base = if base.is_empty() {
            FALLBACK_SLATE_STEM
        } else {
            base.as_str()
        };
        match movie.and_then(Path::file_stem) {
            Some(stem) => format!("{base}_slate_{}_{}.png", self.tag, stem.to_string_lossy()),
            None => format!("{base}_slate_{}.png", self.tag),
        }
    }

    fn render_slate(
        &mut self,
        sequence: &SequenceDescriptor,
        name: &str,
    ) -> DailiesResult<PathBuf> {
        // Fails on missing fields before anything touches the disk.
        let plan = build_slate_graph(&self.layout, &self.resources, &self.fields)?;
        let output = self.temp.allocate(name)?;

        let bindings = InputBindings {
            sequence,
            resources: &self.resources,
            slate_image: None,
        };
        let invocation = self.builder().slate(&plan, &bindings, &output)?;
        self.execute(invocation)?;

        self.state = PipelineState::SlateBuilt;
        tracing::info!(path = %output.display(), "Slate rendered");
        Ok(output)
    }

    fn render_movie(
        &mut self,
        pattern: &str,
        output: &Path,
        options: &MovieOptions,
    ) -> DailiesResult<PathBuf> {
        let sequence = self.resolve(pattern)?;
        let slate_image = if options.slate {
            let name = self.slate_file_name(&sequence, Some(output));
            Some(self.render_slate(&sequence, &name)?)
        } else {
            None
        };

        let plan = build_movie_graph(
            &self.layout,
            &self.resources,
            &sequence,
            MovieGraphOptions {
                slate: options.slate,
                burnin: options.burnin,
            },
        );
        let encoding = EncodingOptions::from_preset(&self.config.config, &options.preset);

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let bindings = InputBindings {
            sequence: &sequence,
            resources: &self.resources,
            slate_image: slate_image.as_deref(),
        };
        let invocation = self.builder().movie(&plan, &bindings, &encoding, output)?;
        self.execute(invocation)?;

        self.state = PipelineState::MovBuilt;
        tracing::info!(
            path = %output.display(),
            frames = sequence.frame_count(),
            slate = options.slate,
            burnin = options.burnin,
            "Movie rendered"
        );
        Ok(output.to_path_buf())
    }

    fn builder(&self) -> CommandBuilder {
        CommandBuilder::new(&self.engine.ffmpeg, self.config.config.engine.verbose)
    }

    fn execute(&mut self, invocation: EngineInvocation) -> DailiesResult<()> {
        tracing::debug!(
            stage = %invocation.stage,
            command = %invocation.command_line(),
            "Engine command"
        );
        self.history.push(invocation);
        let invocation = &self.history[self.history.len() - 1];
        self.runner.run(invocation)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dailies_common::config::DailiesConfig;
    use dailies_common::error::DailiesError;
    use dailies_model::fields::FieldKey;
    use crate::runner::{DryRunRunner, RunOutput};

    fn setup() -> (tempfile::TempDir, String) {
        let dir = tempfile::tempdir().unwrap();
        let plates = dir.path().join("plates");
        std::fs::create_dir_all(&plates).unwrap();
        for frame in 1001..=1005 {
            std::fs::write(plates.join(format!("shot010.{frame:04}.exr")), b"").unwrap();
        }
        let pattern = plates.join("shot010.%04d.exr").to_string_lossy().into_owned();
        (dir, pattern)
    }

    fn dailies<R: EngineRunner>(root: &Path, runner: R) -> Dailies<R> {
        let config = LoadedConfig {
            root: root.to_path_buf(),
            config: DailiesConfig::default(),
        };
        let mut dailies = Dailies::with_runner(config, runner)
            .with_temp_tracker(TempArtifactTracker::in_dir(root.join("tmp")))
            .with_engine_paths(EnginePaths::default());
        dailies.set_field_set(FieldSet::blank());
        dailies
    }

    struct FailingRunner;

    impl EngineRunner for FailingRunner {
        fn run(&self, invocation: &EngineInvocation) -> DailiesResult<RunOutput> {
            Err(DailiesError::render_failed(
                invocation.stage.as_str(),
                Some(1),
                "Error initializing complex filters",
            ))
        }
    }

    fn file_name(path: &Path) -> String {
        path.file_name().unwrap().to_string_lossy().into_owned()
    }

    #[test]
    fn test_make_slate_names_temp_file_after_sequence() {
        let (dir, pattern) = setup();
        let mut dailies = dailies(dir.path(), DryRunRunner);
        let slate = dailies.make_slate(&pattern).unwrap();
        assert_eq!(slate.parent(), Some(dir.path().join("tmp").as_path()));
        assert_eq!(file_name(&slate), format!("shot010_slate_{}.png", dailies.tag));
        assert_eq!(dailies.state(), PipelineState::SlateBuilt);
        assert_eq!(dailies.commands().len(), 1);
    }

    #[test]
    fn test_pipelines_sharing_a_temp_dir_use_distinct_slates() {
        let (dir, pattern) = setup();
        let mut first = dailies(dir.path(), DryRunRunner);
        let mut second = dailies(dir.path(), DryRunRunner);
        let output = dir.path().join("shot010.mov");

        let a = first.make_slate(&pattern).unwrap();
        let b = second.make_slate(&pattern).unwrap();
        assert_ne!(a, b);

        first.make_mov(&pattern, &output, &MovieOptions::default()).unwrap();
        second.make_mov(&pattern, &output, &MovieOptions::default()).unwrap();
        let movie_slates: Vec<String> = [&first, &second]
            .iter()
            .map(|d| d.commands()[2].inputs()[0].to_string())
            .collect();
        assert_ne!(movie_slates[0], movie_slates[1]);
        assert!(movie_slates[0].ends_with(&format!("_{}_shot010.png", first.tag)));
    }

    #[test]
    fn test_from_config_rejects_out_of_range_timeout() {
        let mut config = DailiesConfig::default();
        config.engine.timeout_secs = Some(1e300);
        let loaded = LoadedConfig {
            root: PathBuf::from("/opt/dailies"),
            config,
        };
        let err = Dailies::from_config(loaded).err().unwrap();
        assert!(matches!(err, DailiesError::Config { .. }), "{err}");
    }

    #[test]
    fn test_missing_field_runs_nothing() {
        let (dir, pattern) = setup();
        let mut dailies = dailies(dir.path(), DryRunRunner);
        let mut fields = FieldSet::blank();
        fields.unset(FieldKey::Handles);
        dailies.set_field_set(fields);

        let err = dailies
            .make_mov(&pattern, &dir.path().join("out.mov"), &MovieOptions::default())
            .unwrap_err();
        assert!(matches!(err, DailiesError::ConfigMissingKey { ref key } if key == "handles"));
        assert!(dailies.commands().is_empty());
        assert!(dailies.temp_artifacts().is_empty());
    }

    #[test]
    fn test_failed_render_is_recorded_and_reported() {
        let (dir, pattern) = setup();
        let mut dailies = dailies(dir.path(), FailingRunner);
        let err = dailies.make_slate(&pattern).unwrap_err();
        assert!(matches!(err, DailiesError::RenderFailed { ref stage, .. } if stage == "slate"));
        assert_eq!(dailies.commands().len(), 1);
        assert_eq!(dailies.state(), PipelineState::SequenceResolved);
    }

    #[test]
    fn test_make_mov_creates_output_directory() {
        let (dir, pattern) = setup();
        let mut dailies = dailies(dir.path(), DryRunRunner);
        let output = dir.path().join("review").join("2026-10-17").join("shot010.mov");
        let path = dailies
            .make_mov(&pattern, &output, &MovieOptions::default())
            .unwrap();
        assert_eq!(path, output);
        assert!(output.parent().unwrap().is_dir());
        assert_eq!(dailies.state(), PipelineState::Done);
        assert!(dailies.temp_artifacts().is_empty());
    }

    #[test]
    fn test_set_fields_from_json() {
        let (dir, _) = setup();
        let mut dailies = dailies(dir.path(), DryRunRunner);
        let json = serde_json::json!({ "shot_name": "shot010", "fps": 24 });
        dailies.set_fields(json.as_object().unwrap()).unwrap();
        assert_eq!(dailies.fields().get(FieldKey::Fps).unwrap(), Some("24"));
        assert!(dailies.fields().validate().is_err());
    }
}

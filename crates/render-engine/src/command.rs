//! Media engine invocations.
//!
//! A [`CommandBuilder`] turns a [`GraphPlan`] into the argument vector of one
//! ffmpeg run. Inputs are emitted by walking the plan's input roster, so the
//! `-i` order always matches the stream indices used inside the graph.

use std::fmt;
use std::path::{Path, PathBuf};

use dailies_common::config::DailiesConfig;
use dailies_common::error::{DailiesError, DailiesResult};
use dailies_model::resources::ResourcePaths;
use dailies_model::sequence::SequenceDescriptor;

use crate::inputs::{GraphPlan, InputRole};

/// Generated black background for the slate.
pub const COLOR_SOURCE: &str = "color=c=black";
/// Generated placeholder occupying input 0 when there is no slate.
pub const NULL_SOURCE: &str = "nullsrc=s=256x256:d=5";
/// Encoding options used when no preset is named or the name is unknown.
pub const DEFAULT_ENCODING: [&str; 12] = [
    "-crf", "18", "-vcodec", "mjpeg", "-pix_fmt", "yuvj444p", "-qmin", "1", "-qmax", "1", "-r",
    "24",
];

/// Which render an invocation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderStage {
    Slate,
    Movie,
    Probe,
}

impl RenderStage {
    pub fn as_str(self) -> &'static str {
        match self {
            RenderStage::Slate => "slate",
            RenderStage::Movie => "movie",
            RenderStage::Probe => "probe",
        }
    }
}

impl fmt::Display for RenderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fully built engine run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineInvocation {
    pub stage: RenderStage,
    pub program: PathBuf,
    pub args: Vec<String>,
    /// File the run is expected to produce.
    pub output: Option<PathBuf>,
}

impl EngineInvocation {
    /// Values passed to `-i`, in order.
    pub fn inputs(&self) -> Vec<&str> {
        self.args
            .windows(2)
            .filter(|pair| pair[0] == "-i")
            .map(|pair| pair[1].as_str())
            .collect()
    }

    /// Value following the first occurrence of `flag`.
    pub fn arg_value(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }

    /// The invocation as a copy-pasteable shell command.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.to_string_lossy().into_owned())
            .chain(self.args.iter().cloned())
            .map(|arg| shell_quote(&arg))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for EngineInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

/// Concrete files bound to the input roles of a plan.
#[derive(Debug, Clone, Copy)]
pub struct InputBindings<'a> {
    pub sequence: &'a SequenceDescriptor,
    pub resources: &'a ResourcePaths,
    pub slate_image: Option<&'a Path>,
}

impl InputBindings<'_> {
    fn args_for(&self, role: InputRole) -> DailiesResult<Vec<String>> {
        let file = |path: &Path| vec!["-i".to_string(), path.to_string_lossy().into_owned()];
        let generated = |source: &str| {
            vec![
                "-f".to_string(),
                "lavfi".to_string(),
                "-i".to_string(),
                source.to_string(),
            ]
        };
        Ok(match role {
            InputRole::Sequence => vec![
                "-start_number".to_string(),
                self.sequence.start().to_string(),
                "-i".to_string(),
                self.sequence
                    .pattern()
                    .printf_path()
                    .to_string_lossy()
                    .into_owned(),
            ],
            InputRole::ColorSource => generated(COLOR_SOURCE),
            InputRole::NullSource => generated(NULL_SOURCE),
            InputRole::Bars => file(self.resources.bars.as_path()),
            InputRole::ColorBars => file(self.resources.color_bars.as_path()),
            InputRole::Logo => file(self.resources.logo.as_path()),
            InputRole::SlateImage => {
                let slate = self.slate_image.ok_or_else(|| {
                    DailiesError::config("Movie graph expects a slate image but none was rendered")
                })?;
                file(slate)
            }
        })
    }
}

/// Output encoding options for the movie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingOptions {
    args: Vec<String>,
}

impl Default for EncodingOptions {
    fn default() -> Self {
        Self {
            args: DEFAULT_ENCODING.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl EncodingOptions {
    /// Look up a named preset. An empty name selects the default; an
    /// unknown name falls back to it with a warning.
    pub fn from_preset(config: &DailiesConfig, name: &str) -> Self {
        if name.is_empty() {
            return Self::default();
        }
        match config.preset(name) {
            Some(options) => Self {
                args: options.split_whitespace().map(str::to_string).collect(),
            },
            None => {
                tracing::warn!(preset = name, "Unknown video preset; using default encoding");
                Self::default()
            }
        }
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

/// Builds ffmpeg invocations.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    program: PathBuf,
    verbose: bool,
}

impl CommandBuilder {
    /// `verbose` keeps the engine's full log output.
    pub fn new(program: impl Into<PathBuf>, verbose: bool) -> Self {
        Self {
            program: program.into(),
            verbose,
        }
    }

    /// Single-frame slate render.
    pub fn slate(
        &self,
        plan: &GraphPlan,
        bindings: &InputBindings<'_>,
        output: &Path,
    ) -> DailiesResult<EngineInvocation> {
        let mut args = self.head(plan, bindings)?;
        args.extend(["-vframes".to_string(), "1".to_string()]);
        Ok(self.finish(RenderStage::Slate, args, plan, output))
    }

    /// Movie render with the given encoding options.
    pub fn movie(
        &self,
        plan: &GraphPlan,
        bindings: &InputBindings<'_>,
        encoding: &EncodingOptions,
        output: &Path,
    ) -> DailiesResult<EngineInvocation> {
        let mut args = self.head(plan, bindings)?;
        args.extend(encoding.args().iter().cloned());
        Ok(self.finish(RenderStage::Movie, args, plan, output))
    }

    fn head(&self, plan: &GraphPlan, bindings: &InputBindings<'_>) -> DailiesResult<Vec<String>> {
        let mut args = Vec::new();
        if !self.verbose {
            args.extend(["-v".to_string(), "error".to_string()]);
        }
        args.push("-y".to_string());
        for role in plan.roles() {
            args.extend(bindings.args_for(*role)?);
        }
        Ok(args)
    }

    fn finish(
        &self,
        stage: RenderStage,
        mut args: Vec<String>,
        plan: &GraphPlan,
        output: &Path,
    ) -> EngineInvocation {
        args.push("-filter_complex".to_string());
        args.push(plan.render());
        args.push(output.to_string_lossy().into_owned());
        EngineInvocation {
            stage,
            program: self.program.clone(),
            args,
            output: Some(output.to_path_buf()),
        }
    }
}

fn shell_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,+%@".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

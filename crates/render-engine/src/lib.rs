//! Dailies Render Engine
//!
//! Turns a resolved image sequence and slate fields into ffmpeg
//! invocations and runs them.
//!
//! # Pipeline Architecture
//!
//! ```text
//! shot010.%04d.exr ──┐
//!                    ├── Slate graph (thumbnail, bars, logo, fields)
//! fields ────────────┘         │
//!                              ▼
//!                        slate.png (1 frame)
//!                              │
//! shot010.%04d.exr ────────────┼── Movie graph (scale, concat, burn-ins)
//!                              ▼
//!                          Encode (preset)
//!                              │
//!                              ▼
//!                          shot010.mov
//! ```
//!
//! Graph builders return a [`GraphPlan`]: the filtergraph together with the
//! ordered roles of the inputs it reads. [`CommandBuilder`] emits `-i`
//! arguments from that same list.

pub mod command;
pub mod engine;
pub mod graph;
pub mod inputs;
pub mod movie;
pub mod pipeline;
pub mod probe;
pub mod runner;
pub mod slate;
pub mod temp;

pub use command::{CommandBuilder, EncodingOptions, EngineInvocation, InputBindings, RenderStage};
pub use engine::EnginePaths;
pub use inputs::{GraphPlan, InputRole, InputRoster};
pub use movie::{build_movie_graph, MovieGraphOptions};
pub use pipeline::{Dailies, MovieOptions, PipelineState};
pub use runner::{CancelToken, DryRunRunner, EngineRunner, FfmpegRunner, RunOutput};
pub use slate::{build_slate_graph, SlateGraphBuilder};
pub use temp::{TempArtifact, TempArtifactTracker};

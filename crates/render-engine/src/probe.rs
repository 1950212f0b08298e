//! Video stream metadata through ffprobe.

use std::path::Path;

use serde_json::{Map, Value};

use dailies_common::error::{DailiesError, DailiesResult};

use crate::command::{EngineInvocation, RenderStage};
use crate::runner::EngineRunner;

/// ffprobe call listing the video streams of `path` as JSON.
pub fn probe_invocation(ffprobe: &Path, path: &Path) -> EngineInvocation {
    let args = [
        "-v",
        "quiet",
        "-select_streams",
        "v",
        "-show_streams",
        "-print_format",
        "json",
    ]
    .into_iter()
    .map(str::to_string)
    .chain(std::iter::once(path.to_string_lossy().into_owned()))
    .collect();

    EngineInvocation {
        stage: RenderStage::Probe,
        program: ffprobe.to_path_buf(),
        args,
        output: None,
    }
}

/// The first video stream of a media file, as reported by ffprobe.
///
/// Returns an empty object when the file has no video stream.
pub fn media_info<R: EngineRunner>(
    runner: &R,
    ffprobe: &Path,
    path: &Path,
) -> DailiesResult<Value> {
    if !path.is_file() {
        return Err(DailiesError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let invocation = probe_invocation(ffprobe, path);
    let output = runner.run(&invocation).map_err(|err| match err {
        DailiesError::RenderFailed { code, .. } => {
            tracing::debug!(command = %invocation.command_line(), "ffprobe failed");
            DailiesError::probe(format!(
                "ffprobe could not read {} (exit code {code:?})",
                path.display()
            ))
        }
        other => other,
    })?;
    parse_streams(&output.stdout, path)
}

fn parse_streams(stdout: &str, path: &Path) -> DailiesResult<Value> {
    if stdout.trim().is_empty() {
        tracing::warn!(path = %path.display(), "No media streams found");
        return Ok(Value::Object(Map::new()));
    }

    let parsed: Value = serde_json::from_str(stdout)
        .map_err(|e| DailiesError::probe(format!("Invalid ffprobe output: {e}")))?;
    let streams = parsed
        .get("streams")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    if streams.len() > 1 {
        tracing::warn!(
            path = %path.display(),
            streams = streams.len(),
            "Media file has more than one video stream; using the first"
        );
    }
    match streams.into_iter().next() {
        Some(stream) => Ok(stream),
        None => {
            tracing::warn!(path = %path.display(), "No media streams found");
            Ok(Value::Object(Map::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::RunOutput;

    struct CannedRunner(DailiesResult<String>);

    impl EngineRunner for CannedRunner {
        fn run(&self, invocation: &EngineInvocation) -> DailiesResult<RunOutput> {
            assert_eq!(invocation.stage, RenderStage::Probe);
            match &self.0 {
                Ok(stdout) => Ok(RunOutput {
                    stdout: stdout.clone(),
                    ..RunOutput::default()
                }),
                Err(_) => Err(DailiesError::render_failed("probe", Some(1), "")),
            }
        }
    }

    /// An empty media file; the canned runner never reads it.
    fn clip(dir: &tempfile::TempDir, name: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, b"").unwrap();
        path
    }

    #[test]
    fn test_probe_invocation_args() {
        let inv = probe_invocation(Path::new("ffprobe"), Path::new("/out/shot010.mov"));
        assert_eq!(
            inv.command_line(),
            "ffprobe -v quiet -select_streams v -show_streams -print_format json /out/shot010.mov"
        );
    }

    #[test]
    fn test_first_stream_is_returned() {
        let runner = CannedRunner(Ok(
            r#"{"streams":[{"codec_name":"mjpeg","width":1920},{"codec_name":"png"}]}"#.to_string(),
        ));
        let dir = tempfile::tempdir().unwrap();
        let info = media_info(&runner, Path::new("ffprobe"), &clip(&dir, "a.mov")).unwrap();
        assert_eq!(info["codec_name"], "mjpeg");
        assert_eq!(info["width"], 1920);
    }

    #[test]
    fn test_no_streams_is_empty_object() {
        let dir = tempfile::tempdir().unwrap();
        let audio = clip(&dir, "a.wav");
        for stdout in ["", r#"{"streams":[]}"#, "{}"] {
            let runner = CannedRunner(Ok(stdout.to_string()));
            let info = media_info(&runner, Path::new("ffprobe"), &audio).unwrap();
            assert_eq!(info, Value::Object(Map::new()));
        }
    }

    #[test]
    fn test_engine_failure_is_probe_error() {
        let dir = tempfile::tempdir().unwrap();
        let runner = CannedRunner(Err(DailiesError::probe("unused")));
        let err = media_info(&runner, Path::new("ffprobe"), &clip(&dir, "a.mov")).unwrap_err();
        assert!(matches!(err, DailiesError::Probe { .. }));
    }

    #[test]
    fn test_garbage_output_is_probe_error() {
        let dir = tempfile::tempdir().unwrap();
        let runner = CannedRunner(Ok("not json".to_string()));
        assert!(media_info(&runner, Path::new("ffprobe"), &clip(&dir, "a.mov")).is_err());
    }

    #[test]
    fn test_missing_file_is_reported_without_running_ffprobe() {
        struct NeverRuns;
        impl EngineRunner for NeverRuns {
            fn run(&self, _: &EngineInvocation) -> DailiesResult<RunOutput> {
                panic!("ffprobe must not run for a missing file");
            }
        }
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("review").join("shot010.mov");
        let err = media_info(&NeverRuns, Path::new("ffprobe"), &missing).unwrap_err();
        assert!(matches!(err, DailiesError::FileNotFound { ref path } if *path == missing));
    }
}

//! Blocking execution of engine invocations.

use std::collections::VecDeque;
use std::io::{BufReader, Read};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use dailies_common::config::EngineConfig;
use dailies_common::error::{DailiesError, DailiesResult};

use crate::command::EngineInvocation;

/// Lines of engine stderr kept in memory and in a `RenderFailed` error.
const STDERR_TAIL_LINES: usize = 20;
/// Longer lines are truncated.
const MAX_LINE_BYTES: usize = 4096;
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Captured output of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutput {
    pub stdout: String,
    /// Last lines of the engine's stderr.
    pub stderr: String,
    pub elapsed: Duration,
}

/// Executes engine invocations.
///
/// Implementations must return `RenderFailed` when the engine exits with a
/// nonzero status.
pub trait EngineRunner {
    fn run(&self, invocation: &EngineInvocation) -> DailiesResult<RunOutput>;
}

impl<R: EngineRunner + ?Sized> EngineRunner for &R {
    fn run(&self, invocation: &EngineInvocation) -> DailiesResult<RunOutput> {
        (**self).run(invocation)
    }
}

/// Cooperative cancellation flag shared with a running render.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Runs invocations as child processes.
#[derive(Debug, Clone, Default)]
pub struct FfmpegRunner {
    timeout: Option<Duration>,
    cancel: Option<CancelToken>,
}

impl FfmpegRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runner honoring the configured timeout. Zero, negative or NaN values
    /// disable it.
    pub fn from_config(engine: &EngineConfig) -> DailiesResult<Self> {
        let mut runner = Self::new();
        if let Some(secs) = engine.timeout_secs.filter(|s| *s > 0.0) {
            let timeout = Duration::try_from_secs_f64(secs).map_err(|_| {
                DailiesError::config(format!("engine.timeout_secs is out of range: {secs}"))
            })?;
            runner = runner.with_timeout(timeout);
        }
        Ok(runner)
    }

    /// Kill the engine when a run exceeds `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Kill the engine once `token` is cancelled.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    fn wait(
        &self,
        child: &mut Child,
        invocation: &EngineInvocation,
        start: Instant,
    ) -> DailiesResult<Option<i32>> {
        let stage = invocation.stage.to_string();
        loop {
            if let Some(status) = child.try_wait()? {
                if status.success() {
                    return Ok(None);
                }
                // An interrupt reaches the engine too, which then exits on
                // its own before the token is polled.
                if self.is_cancelled() {
                    tracing::warn!(stage = %stage, "Render cancelled");
                    return Err(DailiesError::RenderCancelled { stage });
                }
                return Ok(Some(status.code().unwrap_or(-1)));
            }

            if self.is_cancelled() {
                kill(child);
                tracing::warn!(stage = %stage, "Render cancelled");
                return Err(DailiesError::RenderCancelled { stage });
            }

            if let Some(timeout) = self.timeout {
                if start.elapsed() >= timeout {
                    kill(child);
                    tracing::warn!(
                        stage = %stage,
                        timeout_secs = timeout.as_secs_f64(),
                        "Render timed out"
                    );
                    return Err(DailiesError::RenderTimeout {
                        stage,
                        timeout_secs: timeout.as_secs_f64(),
                    });
                }
            }

            std::thread::sleep(POLL_INTERVAL);
        }
    }
}

impl EngineRunner for FfmpegRunner {
    fn run(&self, invocation: &EngineInvocation) -> DailiesResult<RunOutput> {
        tracing::debug!(
            stage = %invocation.stage,
            command = %invocation.command_line(),
            "Running engine"
        );

        let program = invocation.program.to_string_lossy().into_owned();
        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| match err.kind() {
                std::io::ErrorKind::NotFound => DailiesError::EngineNotFound {
                    program: program.clone(),
                },
                _ => DailiesError::Io(err),
            })?;

        let start = Instant::now();
        tracing::info!(stage = %invocation.stage, pid = child.id(), "Engine process started");

        // Both pipes are drained on their own threads so the engine never
        // blocks on a full pipe while we poll for exit. stdout carries
        // ffprobe's JSON and is kept whole; of stderr only the tail is kept.
        let stdout = drain(child.stdout.take(), read_all);
        let stderr = drain(child.stderr.take(), |pipe| {
            read_tail(pipe, STDERR_TAIL_LINES)
        });

        let waited = self.wait(&mut child, invocation, start);
        let stdout = join(stdout);
        let stderr = join(stderr);
        let failure = waited?;
        let elapsed = start.elapsed();

        if let Some(code) = failure {
            tracing::error!(
                stage = %invocation.stage,
                code,
                stderr = %stderr,
                "Engine exited with an error"
            );
            return Err(DailiesError::render_failed(
                invocation.stage.as_str(),
                Some(code),
                stderr,
            ));
        }

        tracing::info!(
            stage = %invocation.stage,
            elapsed_ms = elapsed.as_millis() as u64,
            "Engine finished"
        );
        Ok(RunOutput {
            stdout,
            stderr,
            elapsed,
        })
    }
}

/// Logs invocations without running them.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunRunner;

impl EngineRunner for DryRunRunner {
    fn run(&self, invocation: &EngineInvocation) -> DailiesResult<RunOutput> {
        tracing::info!(stage = %invocation.stage, "Dry run: {}", invocation.command_line());
        Ok(RunOutput::default())
    }
}

fn drain<R, F>(pipe: Option<R>, read: F) -> Option<JoinHandle<String>>
where
    R: Read + Send + 'static,
    F: FnOnce(R) -> String + Send + 'static,
{
    pipe.map(|pipe| std::thread::spawn(move || read(pipe)))
}

fn read_all<R: Read>(pipe: R) -> String {
    let mut output = String::new();
    match BufReader::new(pipe).read_to_string(&mut output) {
        Ok(_) => output,
        Err(err) => format!("<failed to read engine output: {err}>"),
    }
}

/// Read `pipe` to the end, keeping only its last `capacity` lines.
fn read_tail<R: Read>(pipe: R, capacity: usize) -> String {
    let mut reader = BufReader::new(pipe);
    let mut tail = LineTail::new(capacity);
    let mut chunk = [0u8; 8192];
    loop {
        match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => tail.extend(&chunk[..n]),
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err) => {
                tail.push(format!("<failed to read engine output: {err}>"));
                break;
            }
        }
    }
    tail.finish()
}

/// Bounded ring of the most recent non-empty lines of a stream.
///
/// Carriage returns end a line too, so progress updates rewritten in place
/// count as separate lines.
struct LineTail {
    capacity: usize,
    lines: VecDeque<String>,
    partial: Vec<u8>,
}

impl LineTail {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            lines: VecDeque::with_capacity(capacity),
            partial: Vec::new(),
        }
    }

    fn extend(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            match byte {
                b'\n' | b'\r' => self.end_line(),
                _ if self.partial.len() < MAX_LINE_BYTES => self.partial.push(byte),
                _ => {}
            }
        }
    }

    fn end_line(&mut self) {
        let line = String::from_utf8_lossy(&self.partial).trim_end().to_string();
        self.partial.clear();
        if !line.trim().is_empty() {
            self.push(line);
        }
    }

    fn push(&mut self, line: String) {
        if self.capacity == 0 {
            return;
        }
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    fn finish(mut self) -> String {
        self.end_line();
        Vec::from(self.lines).join("\n")
    }
}

fn join(handle: Option<JoinHandle<String>>) -> String {
    handle
        .map(|h| {
            h.join()
                .unwrap_or_else(|_| "<failed to join output reader>".to_string())
        })
        .unwrap_or_default()
}

fn kill(child: &mut Child) {
    if let Err(err) = child.kill() {
        tracing::warn!(error = %err, "Failed to kill engine process");
    }
    let _ = child.wait();
}

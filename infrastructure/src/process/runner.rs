//! Bounded local process runner
//!
//! Runs scripts and command lines through a configurable interpreter with a
//! wall-clock deadline, capped output capture and process-tree kill.

use super::kill;
use async_trait::async_trait;
use mender_application::ports::process_runner::{
    ProcessOutcome, ProcessOutput, ProcessRequest, ProcessRunner,
};
use mender_application::ExecutionParams;
use mender_domain::util::truncate_str;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, warn};

/// Appended when captured output hit the byte ceiling
pub const TRUNCATION_MARKER: &str = "\n[output truncated]";

/// Separator between stdout and stderr in the combined output
pub const STDERR_SEPARATOR: &str = "--- stderr ---\n";

/// How long reader tasks get to flush after a kill
const KILL_GRACE: Duration = Duration::from_millis(500);

/// Longest line tracked for the verdict payload
const MAX_TRACKED_LINE: usize = 64 * 1024;

/// Interpreter program plus the arguments placed before the script body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpreter {
    pub program: String,
    pub args: Vec<String>,
}

impl Interpreter {
    /// `powershell` on Windows, `sh -c` elsewhere
    pub fn platform_default() -> Self {
        if cfg!(target_os = "windows") {
            Self {
                program: "powershell".to_string(),
                args: [
                    "-NoProfile",
                    "-NonInteractive",
                    "-ExecutionPolicy",
                    "Bypass",
                    "-Command",
                ]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            }
        } else {
            Self {
                program: "sh".to_string(),
                args: vec!["-c".to_string()],
            }
        }
    }

    /// Build from `[program, args...]`; `None` when empty
    pub fn from_parts(parts: &[String]) -> Option<Self> {
        let (program, args) = parts.split_first()?;
        if program.trim().is_empty() {
            return None;
        }
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    /// Absolute program path when it can be found on PATH
    pub fn resolve(&self) -> PathBuf {
        which::which(&self.program).unwrap_or_else(|_| PathBuf::from(&self.program))
    }
}

impl std::fmt::Display for Interpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Bytes captured from one pipe
#[derive(Debug, Default)]
struct Capture {
    bytes: Vec<u8>,
    truncated: bool,
    line: Vec<u8>,
    last_line: Option<Vec<u8>>,
}

impl Capture {
    fn push(&mut self, chunk: &[u8], limit: usize) {
        let room = limit.saturating_sub(self.bytes.len());
        if chunk.len() > room {
            self.truncated = true;
        }
        self.bytes.extend_from_slice(&chunk[..chunk.len().min(room)]);

        // Line tracking sees everything, including bytes past the ceiling
        for &b in chunk {
            if b == b'\n' {
                self.finish_line();
            } else if self.line.len() < MAX_TRACKED_LINE {
                self.line.push(b);
            }
        }
    }

    fn finish_line(&mut self) {
        if self.line.iter().any(|b| !b.is_ascii_whitespace()) {
            self.last_line = Some(std::mem::take(&mut self.line));
        } else {
            self.line.clear();
        }
    }

    fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    fn last_line(&self) -> Option<String> {
        self.last_line
            .as_ref()
            .map(|l| String::from_utf8_lossy(l).trim().to_string())
    }
}

type SharedCapture = Arc<Mutex<Capture>>;

/// Drain a pipe into `sink` until EOF so the child never blocks on a full pipe
async fn drain<R: AsyncRead + Unpin>(mut reader: R, sink: SharedCapture, limit: usize) {
    let mut buf = [0u8; 8192];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                if let Ok(mut capture) = sink.lock() {
                    capture.push(&buf[..n], limit);
                }
            }
        }
    }
    if let Ok(mut capture) = sink.lock() {
        capture.finish_line();
    }
}

/// Join stdout and stderr and apply the ceiling
fn combine(stdout: &Capture, stderr: &Capture, limit: usize) -> (String, bool) {
    let mut text = stdout.text();
    let err = stderr.text();
    if !err.is_empty() {
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(STDERR_SEPARATOR);
        text.push_str(&err);
    }

    let truncated = stdout.truncated || stderr.truncated || text.len() > limit;
    if truncated {
        let mut capped = truncate_str(&text, limit).to_string();
        capped.push_str(TRUNCATION_MARKER);
        (capped, true)
    } else {
        (text, false)
    }
}

fn snapshot(capture: &SharedCapture) -> Capture {
    match capture.lock() {
        Ok(mut guard) => std::mem::take(&mut *guard),
        Err(_) => Capture::default(),
    }
}

/// Runs one process at a time through the configured interpreter
pub struct LocalProcessRunner {
    interpreter: Interpreter,
    output_limit: usize,
}

impl LocalProcessRunner {
    pub fn new(interpreter: Interpreter, output_limit: usize) -> Self {
        Self {
            interpreter,
            output_limit,
        }
    }

    pub fn from_params(params: &ExecutionParams) -> Self {
        let interpreter =
            Interpreter::from_parts(&params.interpreter).unwrap_or_else(Interpreter::platform_default);
        Self::new(interpreter, params.output_limit)
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    fn command(&self, body: &str) -> Command {
        let mut cmd = Command::new(self.interpreter.resolve());
        cmd.args(&self.interpreter.args)
            .arg(body)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        kill::isolate(&mut cmd);
        cmd
    }
}

#[async_trait]
impl ProcessRunner for LocalProcessRunner {
    async fn run(&self, request: &ProcessRequest) -> ProcessOutcome {
        let started = Instant::now();
        let deadline = tokio::time::Instant::now() + request.timeout;

        debug!(
            "Spawning {} [{}] via {} (timeout {:?})",
            request.label,
            request.mode.as_str(),
            self.interpreter,
            request.timeout
        );

        let mut child = match self.command(&request.body).spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!("Failed to spawn {}: {}", request.label, e);
                return ProcessOutcome::SpawnFailed(format!("{}: {}", self.interpreter.program, e));
            }
        };
        let pid = child.id();

        let stdout = SharedCapture::default();
        let stderr = SharedCapture::default();
        let mut readers = Vec::with_capacity(2);
        if let Some(pipe) = child.stdout.take() {
            readers.push(tokio::spawn(drain(pipe, stdout.clone(), self.output_limit)));
        }
        if let Some(pipe) = child.stderr.take() {
            readers.push(tokio::spawn(drain(pipe, stderr.clone(), self.output_limit)));
        }

        // The child and anything holding its pipes share one deadline
        let finished = tokio::time::timeout_at(deadline, async {
            let status = child.wait().await;
            for reader in readers.iter_mut() {
                let _ = reader.await;
            }
            status
        })
        .await;

        let exit_code = match finished {
            Ok(Ok(status)) => status.code(),
            Ok(Err(e)) => {
                warn!("Waiting on {} failed: {}", request.label, e);
                kill::kill_tree(&mut child, pid).await;
                return ProcessOutcome::WaitFailed(e.to_string());
            }
            Err(_) => {
                warn!(
                    "{} exceeded {:?}; killing process tree",
                    request.label, request.timeout
                );
                kill::kill_tree(&mut child, pid).await;
                for reader in readers.iter_mut() {
                    if reader.is_finished() {
                        continue;
                    }
                    if tokio::time::timeout(KILL_GRACE, &mut *reader).await.is_err() {
                        reader.abort();
                    }
                }
                let (output, _) =
                    combine(&snapshot(&stdout), &snapshot(&stderr), self.output_limit);
                return ProcessOutcome::TimedOut {
                    timeout: request.timeout,
                    output,
                    duration_ms: started.elapsed().as_millis() as u64,
                };
            }
        };

        let stdout = snapshot(&stdout);
        let stderr = snapshot(&stderr);
        let (output, truncated) = combine(&stdout, &stderr, self.output_limit);
        let duration_ms = started.elapsed().as_millis() as u64;
        debug!(
            "{} exited with {:?} after {}ms ({} bytes)",
            request.label,
            exit_code,
            duration_ms,
            output.len()
        );

        ProcessOutcome::Completed(ProcessOutput {
            exit_code,
            output,
            truncated,
            last_stdout_line: stdout.last_line(),
            duration_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_tracks_last_nonblank_line() {
        let mut capture = Capture::default();
        capture.push(b"first\n{\"success\": tr", 1024);
        capture.push(b"ue}\n\n   \n", 1024);
        capture.finish_line();
        assert_eq!(capture.last_line().as_deref(), Some("{\"success\": true}"));
    }

    #[test]
    fn test_capture_line_survives_ceiling() {
        let mut capture = Capture::default();
        capture.push(b"0123456789\nverdict\n", 4);
        assert!(capture.truncated);
        assert_eq!(capture.bytes, b"0123");
        assert_eq!(capture.last_line().as_deref(), Some("verdict"));
    }

    #[test]
    fn test_combine_with_stderr() {
        let mut out = Capture::default();
        out.push(b"hello", 100);
        let mut err = Capture::default();
        err.push(b"warning\n", 100);

        let (text, truncated) = combine(&out, &err, 100);
        assert_eq!(text, "hello\n--- stderr ---\nwarning\n");
        assert!(!truncated);
    }

    #[test]
    fn test_combine_applies_ceiling() {
        let mut out = Capture::default();
        out.push(&[b'a'; 40], 64);
        let mut err = Capture::default();
        err.push(&[b'b'; 40], 64);

        let (text, truncated) = combine(&out, &err, 64);
        assert!(truncated);
        assert!(text.ends_with(TRUNCATION_MARKER));
        assert_eq!(text.len(), 64 + TRUNCATION_MARKER.len());
    }

    #[test]
    fn test_interpreter_from_parts() {
        assert!(Interpreter::from_parts(&[]).is_none());
        assert!(Interpreter::from_parts(&[" ".to_string()]).is_none());
        let interp = Interpreter::from_parts(&["bash".to_string(), "-c".to_string()]).unwrap();
        assert_eq!(interp.program, "bash");
        assert_eq!(interp.to_string(), "bash -c");
    }

    #[cfg(unix)]
    mod unix {
        use super::*;
        use mender_application::ports::process_runner::ExecutionMode;

        fn runner(limit: usize) -> LocalProcessRunner {
            LocalProcessRunner::new(Interpreter::platform_default(), limit)
        }

        fn request(body: &str, timeout: Duration) -> ProcessRequest {
            ProcessRequest::script("test", body, timeout)
        }

        #[tokio::test]
        async fn test_completed_with_nonzero_exit() {
            let outcome = runner(1024)
                .run(&request("echo out; echo err >&2; exit 3", Duration::from_secs(10)))
                .await;

            let ProcessOutcome::Completed(out) = outcome else {
                panic!("expected completion, got {:?}", outcome);
            };
            assert_eq!(out.exit_code, Some(3));
            assert_eq!(out.output, "out\n--- stderr ---\nerr\n");
            assert_eq!(out.last_stdout_line.as_deref(), Some("out"));
            assert!(!out.truncated);
        }

        #[tokio::test]
        async fn test_raw_command_mode() {
            let req = ProcessRequest::raw_command("raw", "uname", Duration::from_secs(10));
            assert_eq!(req.mode, ExecutionMode::RawCommand);
            let outcome = runner(1024).run(&req).await;
            assert!(matches!(outcome, ProcessOutcome::Completed(ref o) if o.exit_code == Some(0)));
        }

        #[tokio::test]
        async fn test_output_ceiling() {
            let outcome = runner(100)
                .run(&request(
                    "i=0; while [ $i -lt 200 ]; do echo line-$i; i=$((i+1)); done; echo '{\"success\": true}'",
                    Duration::from_secs(10),
                ))
                .await;

            let ProcessOutcome::Completed(out) = outcome else {
                panic!("expected completion");
            };
            assert!(out.truncated);
            assert!(out.output.ends_with(TRUNCATION_MARKER));
            assert!(out.output.len() <= 100 + TRUNCATION_MARKER.len());
            assert_eq!(out.last_stdout_line.as_deref(), Some("{\"success\": true}"));
        }

        #[tokio::test]
        async fn test_timeout_kills_process_tree() {
            let dir = tempfile::tempdir().unwrap();
            let marker = dir.path().join("survived");
            let script = format!(
                "(sleep 2; touch '{}') & echo started; sleep 30",
                marker.display()
            );

            let started = Instant::now();
            let outcome = runner(1024)
                .run(&request(&script, Duration::from_millis(300)))
                .await;
            let elapsed = started.elapsed();

            let ProcessOutcome::TimedOut { output, .. } = outcome else {
                panic!("expected timeout, got {:?}", outcome);
            };
            assert!(output.contains("started"));
            assert!(elapsed < Duration::from_secs(2), "took {:?}", elapsed);

            // The backgrounded grandchild must have died with the group
            tokio::time::sleep(Duration::from_millis(2500)).await;
            assert!(!marker.exists());
        }

        #[tokio::test]
        async fn test_background_child_holding_pipes_hits_deadline() {
            let started = Instant::now();
            let outcome = runner(1024)
                .run(&request("sleep 30 & echo detached", Duration::from_millis(300)))
                .await;

            assert!(matches!(outcome, ProcessOutcome::TimedOut { .. }));
            assert!(started.elapsed() < Duration::from_secs(2));
        }

        #[tokio::test]
        async fn test_spawn_failure() {
            let runner = LocalProcessRunner::new(
                Interpreter {
                    program: "/nonexistent/mender-interpreter".to_string(),
                    args: vec![],
                },
                1024,
            );
            let outcome = runner.run(&request("true", Duration::from_secs(1))).await;
            assert!(matches!(outcome, ProcessOutcome::SpawnFailed(_)));
        }
    }
}

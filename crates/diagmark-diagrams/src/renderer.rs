//! Renderer invocation boundary.
//!
//! The processor only needs "run this command, give me the exit status and
//! the combined output". [`Renderer`] is that boundary; [`ProcessRenderer`]
//! runs the real executables.

use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::command::RenderCommand;
use crate::error::DiagramError;

/// Interval between exit checks while a timeout is armed.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Result of one renderer run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutput {
    /// Exit code, `None` if the process was terminated by a signal.
    pub code: Option<i32>,
    /// Standard output followed by standard error.
    pub output: String,
}

impl RenderOutput {
    /// Whether the renderer exited with status zero.
    #[must_use]
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs renderer commands.
pub trait Renderer {
    /// Run `command` to completion.
    ///
    /// A non-zero exit is reported through [`RenderOutput`], not as an error.
    /// Errors are reserved for failing to run the command at all.
    fn render(&self, command: &RenderCommand) -> Result<RenderOutput, DiagramError>;
}

/// [`Renderer`] that spawns the command as a child process.
///
/// Without a timeout the call blocks until the child exits.
#[derive(Debug, Clone, Default)]
pub struct ProcessRenderer {
    timeout: Option<Duration>,
}

impl ProcessRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill the renderer and fail if it runs longer than `timeout`.
    #[must_use]
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Renderer for ProcessRenderer {
    fn render(&self, command: &RenderCommand) -> Result<RenderOutput, DiagramError> {
        let spawn_error = |source| DiagramError::Spawn {
            command: command.to_string(),
            source,
        };

        let mut child = Command::new(command.program())
            .args(command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_error)?;

        let Some(timeout) = self.timeout else {
            let output = child.wait_with_output().map_err(spawn_error)?;
            return Ok(RenderOutput {
                code: output.status.code(),
                output: combine(&output.stdout, &output.stderr),
            });
        };

        // Both pipes are drained while polling
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let stdout_reader = thread::spawn(move || drain(stdout));
        let stderr_reader = thread::spawn(move || drain(stderr));

        let status = wait_with_timeout(&mut child, timeout, command)?;

        let stdout = stdout_reader.join().unwrap_or_default();
        let stderr = stderr_reader.join().unwrap_or_default();
        Ok(RenderOutput {
            code: status.code(),
            output: combine(&stdout, &stderr),
        })
    }
}

fn wait_with_timeout(
    child: &mut Child,
    timeout: Duration,
    command: &RenderCommand,
) -> Result<ExitStatus, DiagramError> {
    let deadline = Instant::now() + timeout;
    loop {
        let polled = child.try_wait().map_err(|source| DiagramError::Spawn {
            command: command.to_string(),
            source,
        })?;
        if let Some(status) = polled {
            return Ok(status);
        }
        if Instant::now() >= deadline {
            tracing::warn!(%command, ?timeout, "renderer timed out, killing it");
            let _ = child.kill();
            let _ = child.wait();
            return Err(DiagramError::Timeout {
                command: command.to_string(),
                timeout,
            });
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn drain(pipe: Option<impl Read>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buf);
    }
    buf
}

fn combine(stdout: &[u8], stderr: &[u8]) -> String {
    let mut output = String::from_utf8_lossy(stdout).into_owned();
    output.push_str(&String::from_utf8_lossy(stderr));
    output
}

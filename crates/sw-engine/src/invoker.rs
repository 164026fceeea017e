//! Solver process invocation.
//!
//! The solver is an opaque executable called as
//! `<executable> <instance> <param_1> ... <param_k>`, with parameters in the
//! space's declaration order. Everything the runner needs from it comes back
//! as a [`RawOutput`] or an [`InvocationError`].

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use sw_types::{Configuration, InvocationError};
use tempfile::TempDir;
use tracing::{debug, info, trace};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Captured result of a solver run that exited with status zero.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

impl RawOutput {
    pub fn from_stdout(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: Some(0),
        }
    }
}

/// Runs the solver for one configuration.
///
/// `index` is the configuration's position in the grid; implementations may
/// use it to keep per-run state apart.
pub trait SolverInvoker: Send + Sync {
    fn invoke(
        &self,
        index: usize,
        configuration: &Configuration,
    ) -> Result<RawOutput, InvocationError>;

    /// Called once before runs start overlapping. Implementations whose runs
    /// share state (a working directory, an output file) separate them here.
    fn isolate_runs(&self) -> Result<(), InvocationError> {
        Ok(())
    }
}

/// Invokes the solver as a child process and blocks until it exits.
#[derive(Debug, Clone)]
pub struct ProcessInvoker {
    executable: PathBuf,
    instance: String,
    timeout: Option<Duration>,
    scratch_root: Option<PathBuf>,
    /// Created by `isolate_runs` when no scratch root was configured; removed
    /// when the last clone of the invoker is dropped.
    auto_scratch: Arc<OnceLock<TempDir>>,
}

impl ProcessInvoker {
    pub fn new(executable: impl Into<PathBuf>, instance: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
            instance: instance.into(),
            timeout: None,
            scratch_root: None,
            auto_scratch: Arc::default(),
        }
    }

    /// Kill runs that exceed `timeout`. `None` waits indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run each configuration inside its own `run-NNNN` directory under
    /// `root`, so solvers that write files next to themselves do not collide.
    pub fn with_scratch_root(mut self, root: Option<PathBuf>) -> Self {
        self.scratch_root = root;
        self
    }

    /// Positional arguments handed to the solver.
    pub fn arguments(&self, configuration: &Configuration) -> Vec<String> {
        std::iter::once(self.instance.clone())
            .chain(configuration.to_args())
            .collect()
    }

    /// Full command line, for display.
    pub fn command_line(&self, configuration: &Configuration) -> String {
        std::iter::once(self.executable.display().to_string())
            .chain(self.arguments(configuration))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn scratch_dir(&self, index: usize) -> Option<PathBuf> {
        self.scratch_root
            .as_deref()
            .or_else(|| self.auto_scratch.get().map(TempDir::path))
            .map(|root| root.join(format!("run-{index:04}")))
    }

    fn build_command(
        &self,
        index: usize,
        configuration: &Configuration,
    ) -> Result<Command, InvocationError> {
        let mut args = self.arguments(configuration);
        let mut command = match self.scratch_dir(index) {
            Some(dir) => {
                std::fs::create_dir_all(&dir)?;
                // Relative paths must keep pointing where they did before the
                // working directory moved.
                if Path::new(&self.instance).is_relative() {
                    args[0] = std::path::absolute(&self.instance)?
                        .display()
                        .to_string();
                }
                let program = if self.executable.components().count() > 1 {
                    std::path::absolute(&self.executable)?
                } else {
                    self.executable.clone()
                };
                let mut command = Command::new(program);
                command.current_dir(dir);
                command
            }
            None => Command::new(&self.executable),
        };

        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        Ok(command)
    }

    fn spawn(&self, mut command: Command) -> Result<Child, InvocationError> {
        command.spawn().map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => InvocationError::ExecutableMissing {
                path: self.executable.clone(),
            },
            _ => InvocationError::Spawn {
                path: self.executable.clone(),
                source,
            },
        })
    }
}

impl SolverInvoker for ProcessInvoker {
    /// Concurrent solvers must not share a working directory. Without a
    /// configured scratch root, each run gets a directory under a fresh
    /// temporary root.
    fn isolate_runs(&self) -> Result<(), InvocationError> {
        if self.scratch_root.is_some() || self.auto_scratch.get().is_some() {
            return Ok(());
        }
        let root = tempfile::Builder::new().prefix("annealsweep-").tempdir()?;
        info!(
            root = %root.path().display(),
            "No scratch directory configured; running each experiment in its own temporary directory"
        );
        // A racing caller already installed a root; ours is dropped.
        let _ = self.auto_scratch.set(root);
        Ok(())
    }

    fn invoke(
        &self,
        index: usize,
        configuration: &Configuration,
    ) -> Result<RawOutput, InvocationError> {
        let command = self.build_command(index, configuration)?;
        debug!(index, command = %self.command_line(configuration), "spawning solver");

        let child = self.spawn(command)?;
        let (status, stdout, stderr) = match self.timeout {
            None => {
                let output = child.wait_with_output()?;
                (output.status, output.stdout, output.stderr)
            }
            Some(timeout) => wait_with_timeout(child, timeout)?,
        };

        let stdout = String::from_utf8_lossy(&stdout).into_owned();
        let stderr = String::from_utf8_lossy(&stderr).into_owned();
        trace!(index, %stdout, "solver stdout");

        if status.success() {
            Ok(RawOutput {
                stdout,
                stderr,
                exit_code: status.code(),
            })
        } else {
            Err(InvocationError::NonZeroExit {
                code: status.code(),
                stderr: stderr.trim_end().to_string(),
            })
        }
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<std::io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_end(&mut buf)?;
        }
        Ok(buf)
    })
}

fn join_pipe(handle: JoinHandle<std::io::Result<Vec<u8>>>) -> Result<Vec<u8>, InvocationError> {
    handle
        .join()
        .map_err(|_| InvocationError::Io(std::io::Error::other("pipe reader panicked")))?
        .map_err(InvocationError::Io)
}

/// Wait for `child`, killing it once `timeout` has elapsed. Both pipes are
/// drained on background threads so a chatty solver cannot fill them and
/// stall.
fn wait_with_timeout(
    mut child: Child,
    timeout: Duration,
) -> Result<(ExitStatus, Vec<u8>, Vec<u8>), InvocationError> {
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());
    let deadline = Instant::now() + timeout;

    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if Instant::now() >= deadline {
            // The child may exit on its own between the check and the kill.
            let _ = child.kill();
            let _ = child.wait()?;
            return Err(InvocationError::TimedOut {
                timeout_secs: timeout.as_secs(),
            });
        }
        thread::sleep(POLL_INTERVAL);
    };

    Ok((status, join_pipe(stdout)?, join_pipe(stderr)?))
}

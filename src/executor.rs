// file: src/executor.rs
// version: 1.0.0
// guid: cf3c0415-f4cd-4994-a089-f8fa9bd3bb1b

//! Command execution against the local operating system
//!
//! Provisioning code talks to the OS only through [`CommandExecutor`], so the
//! whole sequence can be exercised in tests with a recording double.

use crate::error::RemoteAccessError;
use crate::Result;
use std::path::Path;
use std::process::{Output, Stdio};
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};
use tracing::{debug, error};

/// A long-running child process such as the tunnel client
pub trait TunnelProcess: Send {
    /// OS process id, if the process is still known
    fn id(&self) -> Option<u32>;

    /// Exit code if the process has already terminated
    fn try_wait(&mut self) -> Result<Option<i32>>;

    /// Terminate the process
    fn kill(&mut self) -> Result<()>;
}

/// Trait for executing provisioning commands
#[async_trait::async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run a command; a non-zero exit is an error
    async fn run(&self, program: &str, args: &[&str]) -> Result<()>;

    /// Run a command and return its exit code whatever it is
    async fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<i32>;

    /// Run a command with `input` on stdin; a non-zero exit is an error
    async fn run_with_input(&self, program: &str, args: &[&str], input: &str) -> Result<()>;

    /// Run a command with `input` on stdin and return its exit code
    async fn run_with_input_unchecked(
        &self,
        program: &str,
        args: &[&str],
        input: &str,
    ) -> Result<i32>;

    /// Run a command and return its stdout
    async fn output(&self, program: &str, args: &[&str]) -> Result<String>;

    /// Run a command with `input` on stdin and return its raw stdout
    async fn output_with_input(&self, program: &str, args: &[&str], input: &str)
        -> Result<Vec<u8>>;

    /// Start a background process in `cwd` with stdout and stderr sent to `log`
    ///
    /// The child never shares the agent's terminal.
    async fn spawn(
        &self,
        program: &str,
        args: &[&str],
        cwd: &Path,
        log: &Path,
    ) -> Result<Box<dyn TunnelProcess>>;
}

/// Render a command line for logs, hiding secrets passed as arguments
pub fn describe_command(program: &str, args: &[&str]) -> String {
    let mut parts = vec![program.to_string()];
    let mut hide_next = false;
    for arg in args {
        if hide_next {
            parts.push("********".to_string());
            hide_next = false;
        } else {
            parts.push(arg.to_string());
            hide_next = *arg == "authtoken";
        }
    }
    parts.join(" ")
}

/// Executes commands on this machine with `tokio::process`
pub struct LocalExecutor;

impl LocalExecutor {
    /// Create a new local executor
    pub fn new() -> Self {
        Self
    }

    fn command(program: &str, args: &[&str]) -> Command {
        let mut cmd = Command::new(program);
        cmd.args(args)
            // apt and its maintainer scripts must never block on a dialog
            .env("DEBIAN_FRONTEND", "noninteractive");
        cmd
    }

    async fn execute(program: &str, args: &[&str], input: Option<&str>) -> Result<Output> {
        let line = describe_command(program, args);
        debug!("Executing local command: {}", line);

        let mut cmd = Self::command(program, args);
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        cmd.stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });

        let mut child = cmd.spawn().map_err(|e| RemoteAccessError::ProcessError {
            command: line.clone(),
            exit_code: None,
            stderr: format!("Failed to execute command: {}", e),
        })?;

        if let Some(input) = input {
            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(input.as_bytes()).await?;
                stdin.shutdown().await?;
            }
        }

        Ok(child.wait_with_output().await?)
    }

    fn check(program: &str, args: &[&str], output: Output) -> Result<Output> {
        if output.status.success() {
            return Ok(output);
        }

        let line = describe_command(program, args);
        let exit_code = output.status.code();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();

        error!("Command '{}' failed with exit code {:?}", line, exit_code);
        if !stdout.trim().is_empty() {
            error!("STDOUT: {}", stdout);
        }
        if !stderr.trim().is_empty() {
            error!("STDERR: {}", stderr);
        }

        Err(RemoteAccessError::ProcessError {
            command: line,
            exit_code,
            stderr: if stderr.is_empty() { stdout } else { stderr },
        })
    }
}

impl Default for LocalExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CommandExecutor for LocalExecutor {
    async fn run(&self, program: &str, args: &[&str]) -> Result<()> {
        let output = Self::execute(program, args, None).await?;
        Self::check(program, args, output)?;
        Ok(())
    }

    async fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<i32> {
        let output = Self::execute(program, args, None).await?;
        let code = output.status.code().unwrap_or(-1);
        if code != 0 {
            debug!(
                "Ignoring exit code {} from {}",
                code,
                describe_command(program, args)
            );
        }
        Ok(code)
    }

    async fn run_with_input(&self, program: &str, args: &[&str], input: &str) -> Result<()> {
        let output = Self::execute(program, args, Some(input)).await?;
        Self::check(program, args, output)?;
        Ok(())
    }

    async fn run_with_input_unchecked(
        &self,
        program: &str,
        args: &[&str],
        input: &str,
    ) -> Result<i32> {
        let output = Self::execute(program, args, Some(input)).await?;
        Ok(output.status.code().unwrap_or(-1))
    }

    async fn output(&self, program: &str, args: &[&str]) -> Result<String> {
        let output = Self::execute(program, args, None).await?;
        let output = Self::check(program, args, output)?;
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    async fn output_with_input(
        &self,
        program: &str,
        args: &[&str],
        input: &str,
    ) -> Result<Vec<u8>> {
        let output = Self::execute(program, args, Some(input)).await?;
        let output = Self::check(program, args, output)?;
        Ok(output.stdout)
    }

    async fn spawn(
        &self,
        program: &str,
        args: &[&str],
        cwd: &Path,
        log: &Path,
    ) -> Result<Box<dyn TunnelProcess>> {
        let line = describe_command(program, args);
        debug!(
            "Spawning background process: {} (in {}, output to {})",
            line,
            cwd.display(),
            log.display()
        );

        let stdout = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log)?;
        let stderr = stdout.try_clone()?;

        let child = Self::command(program, args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .spawn()
            .map_err(|e| RemoteAccessError::ProcessError {
                command: line,
                exit_code: None,
                stderr: format!("Failed to start process: {}", e),
            })?;

        Ok(Box::new(LocalProcess { child }))
    }
}

/// Background process started by [`LocalExecutor::spawn`]
pub struct LocalProcess {
    child: Child,
}

impl TunnelProcess for LocalProcess {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    fn try_wait(&mut self) -> Result<Option<i32>> {
        Ok(self
            .child
            .try_wait()?
            .map(|status| status.code().unwrap_or(-1)))
    }

    fn kill(&mut self) -> Result<()> {
        self.child.start_kill()?;
        Ok(())
    }
}

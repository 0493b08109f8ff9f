//! Container engine access
//!
//! Drives `podman` or `docker` through its command line:
//! - Checking the engine is available
//! - Pulling, probing and force-removing images
//! - Running an image once with arguments and capturing its stdout
//!
//! Every container created by [`ContainerRunner::run`] is force-removed on
//! every exit path. Removal errors are logged and never replace the run's own
//! result.

use std::process::{Command, ExitStatus, Output};

use clidock_core::{Error, Result};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::RunnerConfig;

/// Captured result of a container run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    pub stdout: Vec<u8>,
    pub exit_code: i32,
}

impl RunOutput {
    /// Stdout decoded as UTF-8, lossily
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }
}

/// Blocking access to a container engine
///
/// No call retries on its own.
pub trait ContainerRunner: Send + Sync {
    /// Name of the engine, for messages
    fn engine(&self) -> &str;

    /// Fails with `RuntimeUnavailable` if the engine cannot be reached
    fn check_available(&self) -> Result<()>;

    /// Pulls an image from its registry
    fn pull(&self, image: &str) -> Result<()>;

    /// Whether the image exists locally
    fn image_exists(&self, image: &str) -> Result<bool>;

    /// Runs the image once with `args`
    ///
    /// Fails with `Execution` if the container cannot be created or started,
    /// or exits non-zero.
    fn run(&self, image: &str, args: &[String]) -> Result<RunOutput>;

    /// Force-removes a local image
    fn remove_image(&self, image: &str) -> Result<()>;
}

/// Exit code of a finished process
///
/// A process killed by a signal has no code and reports `-1`.
pub fn exit_code(status: &ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

/// [`ContainerRunner`] over the `podman`/`docker` command line
#[derive(Debug, Clone)]
pub struct CliContainerRunner {
    engine: String,
}

impl CliContainerRunner {
    pub fn new(engine: impl Into<String>) -> Self {
        Self {
            engine: engine.into(),
        }
    }

    pub fn from_config(config: &RunnerConfig) -> Self {
        Self::new(config.engine.clone())
    }

    fn command(&self) -> Command {
        Command::new(&self.engine)
    }

    fn execution_failure(&self, image: &str, args: &[String], output: &Output) -> Error {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Error::execution(
            image,
            args,
            format!(
                "exit_code={}, stderr='{}'",
                exit_code(&output.status),
                stderr.trim()
            ),
        )
    }
}

impl ContainerRunner for CliContainerRunner {
    fn engine(&self) -> &str {
        &self.engine
    }

    fn check_available(&self) -> Result<()> {
        let output = self
            .command()
            .arg("--version")
            .output()
            .map_err(|e| Error::RuntimeUnavailable {
                engine: self.engine.clone(),
                reason: format!("failed to execute '{} --version': {}", self.engine, e),
            })?;

        if !output.status.success() {
            return Err(Error::RuntimeUnavailable {
                engine: self.engine.clone(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let version = String::from_utf8_lossy(&output.stdout);
        info!("Container engine is available: {}", version.trim());
        Ok(())
    }

    fn pull(&self, image: &str) -> Result<()> {
        debug!("Pulling image {}", image);
        let args = ["pull".to_string()];
        let output = self
            .command()
            .arg("pull")
            .arg(image)
            .output()
            .map_err(|e| Error::execution(image, &args, e.to_string()))?;

        if !output.status.success() {
            return Err(self.execution_failure(image, &args, &output));
        }
        Ok(())
    }

    fn image_exists(&self, image: &str) -> Result<bool> {
        let output = self
            .command()
            .args(["image", "inspect", "--format", "{{.Id}}"])
            .arg(image)
            .output()
            .map_err(|e| Error::execution(image, &["inspect".to_string()], e.to_string()))?;

        Ok(output.status.success())
    }

    fn run(&self, image: &str, args: &[String]) -> Result<RunOutput> {
        let guard = ContainerGuard {
            engine: &self.engine,
            name: format!("clidock-{}", Uuid::new_v4()),
        };

        debug!("Creating container {} for {} {:?}", guard.name, image, args);

        let created = self
            .command()
            .arg("create")
            .arg("--name")
            .arg(&guard.name)
            .arg(image)
            .args(args)
            .output()
            .map_err(|e| Error::execution(image, args, e.to_string()))?;

        if !created.status.success() {
            return Err(self.execution_failure(image, args, &created));
        }

        // Attached start blocks until the container exits and returns its status
        let output = self
            .command()
            .arg("start")
            .arg("--attach")
            .arg(&guard.name)
            .output()
            .map_err(|e| Error::execution(image, args, e.to_string()))?;

        let code = exit_code(&output.status);
        if code != 0 {
            return Err(self.execution_failure(image, args, &output));
        }

        debug!(
            "Container {} finished: exit_code={}, stdout_len={}",
            guard.name,
            code,
            output.stdout.len()
        );

        Ok(RunOutput {
            stdout: output.stdout,
            exit_code: code,
        })
    }

    fn remove_image(&self, image: &str) -> Result<()> {
        let args = ["rmi".to_string(), "-f".to_string()];
        let output = self
            .command()
            .args(&args)
            .arg(image)
            .output()
            .map_err(|e| Error::execution(image, &args, e.to_string()))?;

        if !output.status.success() {
            return Err(self.execution_failure(image, &args, &output));
        }

        info!("Removed image {}", image);
        Ok(())
    }
}

/// Force-removes a named container when dropped
struct ContainerGuard<'a> {
    engine: &'a str,
    name: String,
}

impl Drop for ContainerGuard<'_> {
    fn drop(&mut self) {
        let rm_output = Command::new(self.engine)
            .arg("rm")
            .arg("-f")
            .arg(&self.name)
            .output();

        match rm_output {
            Ok(output) if output.status.success() => {
                debug!("Container {} removed", self.name);
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                warn!("Failed to remove container {}: {}", self.name, stderr.trim());
            }
            Err(e) => {
                warn!("Failed to remove container {}: {}", self.name, e);
            }
        }
    }
}

//! Scripted in-memory container engine
//!
//! Answers runs from a fixed script instead of starting containers, and
//! records every call. Used to exercise ingestion without an engine.

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

use clidock_core::{Error, Result};

use crate::container::{ContainerRunner, RunOutput};

type Script = HashMap<(String, Vec<String>), std::result::Result<String, String>>;

/// [`ContainerRunner`] replaying scripted outputs
#[derive(Default)]
pub struct ScriptedRunner {
    unavailable: bool,
    /// Answers the availability check even while unavailable
    check_passes: bool,
    /// Images a pull succeeds for
    remote: BTreeSet<String>,
    /// Images present locally
    local: Mutex<BTreeSet<String>>,
    script: Script,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine that cannot be reached
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// An engine that answers the availability check, then goes away
    pub fn lost_after_check() -> Self {
        Self {
            unavailable: true,
            check_passes: true,
            ..Self::default()
        }
    }

    /// Makes `image` pullable
    pub fn with_remote(mut self, image: &str) -> Self {
        self.remote.insert(image.to_string());
        self
    }

    /// Makes `image` present locally
    pub fn with_local(self, image: &str) -> Self {
        self.lock_local().insert(image.to_string());
        self
    }

    /// Running `image` with `args` prints `stdout`
    pub fn with_output(mut self, image: &str, args: &[&str], stdout: &str) -> Self {
        self.script
            .insert(key(image, args), Ok(stdout.to_string()));
        self
    }

    /// Running `image` with `args` fails with `cause`
    pub fn with_failure(mut self, image: &str, args: &[&str], cause: &str) -> Self {
        self.script
            .insert(key(image, args), Err(cause.to_string()));
        self
    }

    /// Every call made so far, as `<op> <image> [args]`
    pub fn calls(&self) -> Vec<String> {
        match self.calls.lock() {
            Ok(calls) => calls.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Whether `image` is present locally
    pub fn has_local(&self, image: &str) -> bool {
        self.lock_local().contains(image)
    }

    fn record(&self, call: String) {
        match self.calls.lock() {
            Ok(mut calls) => calls.push(call),
            Err(poisoned) => poisoned.into_inner().push(call),
        }
    }

    fn lock_local(&self) -> std::sync::MutexGuard<'_, BTreeSet<String>> {
        match self.local.lock() {
            Ok(local) => local,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn ensure_available(&self) -> Result<()> {
        if self.unavailable {
            return Err(Error::RuntimeUnavailable {
                engine: self.engine().to_string(),
                reason: "scripted engine is offline".to_string(),
            });
        }
        Ok(())
    }
}

fn key(image: &str, args: &[&str]) -> (String, Vec<String>) {
    (
        image.to_string(),
        args.iter().map(|a| a.to_string()).collect(),
    )
}

impl ContainerRunner for ScriptedRunner {
    fn engine(&self) -> &str {
        "scripted"
    }

    fn check_available(&self) -> Result<()> {
        self.record("check".to_string());
        if self.check_passes {
            return Ok(());
        }
        self.ensure_available()
    }

    fn pull(&self, image: &str) -> Result<()> {
        self.record(format!("pull {}", image));
        self.ensure_available()?;

        if !self.remote.contains(image) {
            return Err(Error::execution(
                image,
                &["pull".to_string()],
                "manifest unknown",
            ));
        }
        self.lock_local().insert(image.to_string());
        Ok(())
    }

    fn image_exists(&self, image: &str) -> Result<bool> {
        self.record(format!("inspect {}", image));
        self.ensure_available()?;
        Ok(self.has_local(image))
    }

    fn run(&self, image: &str, args: &[String]) -> Result<RunOutput> {
        self.record(format!("run {} {}", image, args.join(" ")));
        self.ensure_available()?;

        match self.script.get(&(image.to_string(), args.to_vec())) {
            Some(Ok(stdout)) => Ok(RunOutput {
                stdout: stdout.clone().into_bytes(),
                exit_code: 0,
            }),
            Some(Err(cause)) => Err(Error::execution(image, args, cause.clone())),
            None => Err(Error::execution(image, args, "exit_code=127, no such command")),
        }
    }

    fn remove_image(&self, image: &str) -> Result<()> {
        self.record(format!("rmi {}", image));
        self.ensure_available()?;

        if self.lock_local().remove(image) {
            Ok(())
        } else {
            Err(Error::execution(
                image,
                &["rmi".to_string(), "-f".to_string()],
                "image not known",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pull_makes_image_local() {
        let runner = ScriptedRunner::new().with_remote("toolimg:1");
        assert!(!runner.image_exists("toolimg:1").unwrap());
        runner.pull("toolimg:1").unwrap();
        assert!(runner.image_exists("toolimg:1").unwrap());
        assert!(runner.pull("missing:1").is_err());
        assert_eq!(
            runner.calls(),
            vec![
                "inspect toolimg:1",
                "pull toolimg:1",
                "inspect toolimg:1",
                "pull missing:1"
            ]
        );
    }

    #[test]
    fn test_unscripted_run_fails() {
        let runner = ScriptedRunner::new();
        let err = runner.run("toolimg:1", &["x".to_string()]).unwrap_err();
        assert!(matches!(err, Error::Execution { .. }));
    }

    #[test]
    fn test_unavailable_engine() {
        let runner = ScriptedRunner::unavailable();
        assert!(runner.check_available().unwrap_err().is_fatal());
        assert!(runner.run("toolimg:1", &[]).unwrap_err().is_fatal());
    }
}

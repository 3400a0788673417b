//! External service controller, driven through the compose CLI.
//!
//! Every invocation returns an [`ExecOutput`] carrying the exit code and
//! captured output instead of a bare status, so callers can classify the
//! failure and surface stderr to the operator. The [`ServiceController`]
//! trait is the seam tests mock; [`ComposeCli`] is the real thing.

use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::context::OpsContext;
use crate::errors::{CoreError, Result};

/// Outcome of one external command invocation.
#[derive(Debug, Clone)]
pub struct ExecOutput {
    /// Rendered command line, for error messages.
    pub command: String,
    /// Exit code; `None` when the process died to a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Turn a non-zero exit into a [`CoreError::ProcessFailed`].
    pub fn into_result(self) -> Result<ExecOutput> {
        if self.success() {
            Ok(self)
        } else {
            Err(CoreError::ProcessFailed {
                command: self.command,
                code: self.code.unwrap_or(-1),
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

/// Observed state of the managed service instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Absent,
    Running,
    Stopped,
}

impl ServiceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceState::Absent => "absent",
            ServiceState::Running => "running",
            ServiceState::Stopped => "stopped",
        }
    }
}

/// Controller surface over the external service.
///
/// The implementation issues opaque commands and interprets only exit
/// codes; it never looks inside the container runtime.
#[allow(async_fn_in_trait)]
pub trait ServiceController {
    /// Create and start the service, detached.
    async fn up(&self) -> Result<ExecOutput>;
    /// Stop and remove the service.
    async fn down(&self) -> Result<ExecOutput>;
    /// List the service's containers.
    async fn ps(&self) -> Result<ExecOutput>;
    /// Stream service logs to the terminal.
    async fn logs(&self, follow: bool, tail: Option<usize>) -> Result<ExecOutput>;
    /// Check the manifest parses; failure is a validation error.
    async fn validate(&self) -> Result<ExecOutput>;
    /// Pull the pinned image.
    async fn pull(&self) -> Result<ExecOutput>;
    /// Derive the current {absent, running, stopped} state.
    async fn state(&self) -> Result<ServiceState>;
}

/// Compose CLI invocation settings: the program plus its leading
/// subcommand arguments (`docker` + `compose` by default).
#[derive(Debug, Clone)]
pub struct ComposeCommand {
    pub program: String,
    pub prefix: Vec<String>,
}

impl Default for ComposeCommand {
    fn default() -> Self {
        Self {
            program: "docker".to_string(),
            prefix: vec!["compose".to_string()],
        }
    }
}

/// Probe that the compose CLI is present and answers `version`.
pub async fn probe_compose(command: &ComposeCommand) -> Result<ExecOutput> {
    run_program(
        &command.program,
        &command
            .prefix
            .iter()
            .map(String::as_str)
            .chain(std::iter::once("version"))
            .collect::<Vec<_>>(),
    )
    .await?
    .into_result()
}

/// Run an arbitrary program with captured output.
///
/// Used for advisory steps outside the compose surface (image cache
/// pruning after an update).
pub async fn run_program(program: &str, args: &[&str]) -> Result<ExecOutput> {
    let rendered = format!("{} {}", program, args.join(" "));
    debug!("Running {}", rendered);

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|source| classify_spawn_error(program, &rendered, source))?;

    Ok(ExecOutput {
        command: rendered,
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

fn classify_spawn_error(program: &str, rendered: &str, source: std::io::Error) -> CoreError {
    if source.kind() == std::io::ErrorKind::NotFound {
        CoreError::MissingPrerequisite(format!("'{program}' not found on PATH"))
    } else {
        CoreError::ProcessSpawn {
            command: rendered.to_string(),
            source,
        }
    }
}

/// The real controller: `docker compose -f <manifest>` in the project
/// directory.
#[derive(Debug, Clone)]
pub struct ComposeCli {
    command: ComposeCommand,
    manifest_path: PathBuf,
    project_dir: PathBuf,
    service_name: String,
}

impl ComposeCli {
    pub fn new(ctx: &OpsContext) -> Self {
        Self {
            command: ctx.compose.clone(),
            manifest_path: ctx.manifest_path(),
            project_dir: ctx.base_dir.clone(),
            service_name: ctx.service_name.clone(),
        }
    }

    fn base(&self) -> (Command, String) {
        let mut cmd = Command::new(&self.command.program);
        cmd.args(&self.command.prefix)
            .arg("-f")
            .arg(&self.manifest_path)
            .current_dir(&self.project_dir)
            .stdin(Stdio::null());

        let rendered = format!(
            "{} {} -f {}",
            self.command.program,
            self.command.prefix.join(" "),
            self.manifest_path.display()
        );
        (cmd, rendered)
    }

    async fn run(&self, args: &[&str]) -> Result<ExecOutput> {
        let (mut cmd, base_rendered) = self.base();
        let rendered = format!("{} {}", base_rendered, args.join(" "));
        debug!("Running {}", rendered);

        let output = cmd
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| classify_spawn_error(&self.command.program, &rendered, source))?;

        Ok(ExecOutput {
            command: rendered,
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

impl ServiceController for ComposeCli {
    async fn up(&self) -> Result<ExecOutput> {
        self.run(&["up", "-d"]).await?.into_result()
    }

    async fn down(&self) -> Result<ExecOutput> {
        self.run(&["down"]).await?.into_result()
    }

    async fn ps(&self) -> Result<ExecOutput> {
        self.run(&["ps"]).await?.into_result()
    }

    async fn logs(&self, follow: bool, tail: Option<usize>) -> Result<ExecOutput> {
        let mut args: Vec<String> = vec!["logs".to_string()];
        if follow {
            args.push("--follow".to_string());
        }
        let tail_value;
        if let Some(n) = tail {
            tail_value = n.to_string();
            args.push("--tail".to_string());
            args.push(tail_value);
        }
        args.push(self.service_name.clone());

        // Logs stream to the operator's terminal rather than being captured.
        let (mut cmd, base_rendered) = self.base();
        let rendered = format!("{} {}", base_rendered, args.join(" "));
        debug!("Running {}", rendered);

        let status = cmd
            .args(&args)
            .status()
            .await
            .map_err(|source| classify_spawn_error(&self.command.program, &rendered, source))?;

        ExecOutput {
            command: rendered,
            code: status.code(),
            stdout: String::new(),
            stderr: String::new(),
        }
        .into_result()
    }

    async fn validate(&self) -> Result<ExecOutput> {
        let output = self.run(&["config", "-q"]).await?;
        if output.success() {
            Ok(output)
        } else {
            Err(CoreError::ManifestInvalid(output.stderr.trim().to_string()))
        }
    }

    async fn pull(&self) -> Result<ExecOutput> {
        self.run(&["pull"]).await?.into_result()
    }

    async fn state(&self) -> Result<ServiceState> {
        // Without a manifest there is nothing the compose CLI could know
        // about; the service was never created.
        if !self.manifest_path.exists() {
            return Ok(ServiceState::Absent);
        }

        let running = self
            .run(&["ps", "--status", "running", "-q", self.service_name.as_str()])
            .await?
            .into_result()?;
        if !running.stdout.trim().is_empty() {
            return Ok(ServiceState::Running);
        }

        let any = self
            .run(&["ps", "-a", "-q", self.service_name.as_str()])
            .await?
            .into_result()?;
        if !any.stdout.trim().is_empty() {
            return Ok(ServiceState::Stopped);
        }

        Ok(ServiceState::Absent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_exec_output_success_requires_zero_exit() {
        let ok = ExecOutput {
            command: "docker compose up -d".to_string(),
            code: Some(0),
            stdout: String::new(),
            stderr: String::new(),
        };
        assert!(ok.success());
        assert!(ok.into_result().is_ok());

        let failed = ExecOutput {
            command: "docker compose up -d".to_string(),
            code: Some(17),
            stdout: String::new(),
            stderr: "no such image\n".to_string(),
        };
        let err = failed.into_result().unwrap_err();
        match err {
            CoreError::ProcessFailed { code, stderr, .. } => {
                assert_eq!(code, 17);
                assert_eq!(stderr, "no such image");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_signal_death_maps_to_negative_code() {
        let killed = ExecOutput {
            command: "docker compose down".to_string(),
            code: None,
            stdout: String::new(),
            stderr: String::new(),
        };
        match killed.into_result().unwrap_err() {
            CoreError::ProcessFailed { code, .. } => assert_eq!(code, -1),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_state_absent_without_manifest() {
        let dir = TempDir::new().unwrap();
        let ctx = crate::context::OpsContext::new(dir.path().to_path_buf());
        let cli = ComposeCli::new(&ctx);

        assert_eq!(cli.state().await.unwrap(), ServiceState::Absent);
    }

    #[test]
    fn test_missing_program_classified_as_prerequisite() {
        let err = classify_spawn_error(
            "definitely-not-a-real-binary",
            "definitely-not-a-real-binary compose version",
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert_eq!(err.kind(), crate::errors::ErrorKind::Prerequisite);
    }
}

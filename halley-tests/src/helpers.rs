//! Shared fixtures for the integration tests.

use std::path::Path;
use std::sync::Mutex;

use halley_core::errors::{CoreError, Result};
use halley_core::runner::{ExecOutput, ServiceController, ServiceState};

/// Builds an env-store fixture on disk, line by line.
#[derive(Default)]
pub struct TestStoreBuilder {
    lines: Vec<String>,
}

impl TestStoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(mut self, key: &str, value: &str) -> Self {
        self.lines.push(format!("{key}={value}"));
        self
    }

    /// A verbatim line (comment, blank, or anything else).
    pub fn raw(mut self, line: &str) -> Self {
        self.lines.push(line.to_string());
        self
    }

    pub fn write(self, path: &Path) {
        let mut content = self.lines.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }
        std::fs::write(path, content).unwrap();
    }
}

fn ok_output(command: &str) -> ExecOutput {
    ExecOutput {
        command: command.to_string(),
        code: Some(0),
        stdout: String::new(),
        stderr: String::new(),
    }
}

fn failed(command: &str, stderr: &str) -> CoreError {
    CoreError::ProcessFailed {
        command: command.to_string(),
        code: 1,
        stderr: stderr.to_string(),
    }
}

/// Scripted controller recording every call in order.
///
/// `states` is consumed front-to-back by each `state()` call; the last
/// entry repeats once the script runs out.
pub struct RecordingController {
    calls: Mutex<Vec<String>>,
    states: Mutex<Vec<ServiceState>>,
    pub fail_down: bool,
    pub fail_up: bool,
    pub fail_validate: bool,
}

impl RecordingController {
    pub fn new(states: Vec<ServiceState>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            states: Mutex::new(states),
            fail_down: false,
            fail_up: false,
            fail_validate: false,
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }

    fn next_state(&self) -> ServiceState {
        let mut states = self.states.lock().unwrap();
        if states.len() > 1 {
            states.remove(0)
        } else {
            *states.first().unwrap_or(&ServiceState::Absent)
        }
    }
}

impl ServiceController for &RecordingController {
    async fn up(&self) -> Result<ExecOutput> {
        self.record("up");
        if self.fail_up {
            return Err(failed("up", "start failed"));
        }
        Ok(ok_output("up"))
    }

    async fn down(&self) -> Result<ExecOutput> {
        self.record("down");
        if self.fail_down {
            return Err(failed("down", "teardown stuck"));
        }
        Ok(ok_output("down"))
    }

    async fn ps(&self) -> Result<ExecOutput> {
        self.record("ps");
        Ok(ok_output("ps"))
    }

    async fn logs(&self, _follow: bool, _tail: Option<usize>) -> Result<ExecOutput> {
        self.record("logs");
        Ok(ok_output("logs"))
    }

    async fn validate(&self) -> Result<ExecOutput> {
        self.record("validate");
        if self.fail_validate {
            return Err(CoreError::ManifestInvalid("rejected".to_string()));
        }
        Ok(ok_output("validate"))
    }

    async fn pull(&self) -> Result<ExecOutput> {
        self.record("pull");
        Ok(ok_output("pull"))
    }

    async fn state(&self) -> Result<ServiceState> {
        self.record("state");
        Ok(self.next_state())
    }
}

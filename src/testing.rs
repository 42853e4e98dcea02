//! Scripted [`CommandRunner`] for unit tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::traits::{CommandRunner, CommandSpec, ProbeError};

enum Scripted {
    Output(String),
    Fail { code: i32, stderr: String },
}

/// Answers commands from a table keyed by their command line.
///
/// Unscripted commands behave like a tool that is not installed.
#[derive(Default)]
pub(crate) struct ScriptedRunner {
    responses: HashMap<String, Scripted>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub(crate) fn respond(mut self, command: CommandSpec, output: &str) -> Self {
        self.responses
            .insert(command.to_string(), Scripted::Output(output.to_string()));
        self
    }

    pub(crate) fn fail(mut self, command: CommandSpec, code: i32, stderr: &str) -> Self {
        self.responses.insert(
            command.to_string(),
            Scripted::Fail {
                code,
                stderr: stderr.to_string(),
            },
        );
        self
    }

    /// Holds the answer to `command` back for `delay`.
    pub(crate) fn delay(mut self, command: CommandSpec, delay: Duration) -> Self {
        self.delays.insert(command.to_string(), delay);
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, command: &CommandSpec) -> Result<String, ProbeError> {
        let key = command.to_string();
        self.calls.lock().unwrap().push(key.clone());
        if let Some(delay) = self.delays.get(&key) {
            tokio::time::sleep(*delay).await;
        }
        match self.responses.get(&key) {
            Some(Scripted::Output(output)) => Ok(output.clone()),
            Some(Scripted::Fail { code, stderr }) => Err(ProbeError::Failed {
                program: command.program.clone(),
                code: Some(*code),
                stderr: stderr.clone(),
            }),
            None => Err(ProbeError::ToolMissing(command.program.clone())),
        }
    }
}

//! Scripted command runner for adapter unit tests

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rego_core::{
    CommandOutput, CommandRunner, CommandSpec, ComponentKind, Drift, Error, HostCapabilities,
    KindCheck, Result, Settings,
};

use crate::AdapterContext;

#[derive(Clone)]
enum Reply {
    Output(CommandOutput),
    Timeout,
}

/// Answers commands by command-line prefix; later rules win
#[derive(Default)]
pub(crate) struct ScriptedRunner {
    rules: Mutex<Vec<(String, Reply)>>,
    calls: Mutex<Vec<CommandSpec>>,
}

impl ScriptedRunner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push(&self, prefix: &str, reply: Reply) {
        self.rules.lock().unwrap().push((prefix.to_string(), reply));
    }

    /// Reply to `prefix` with exit 0 and `stdout`
    pub fn ok(&self, prefix: &str, stdout: &str) {
        self.push(
            prefix,
            Reply::Output(CommandOutput {
                code: Some(0),
                stdout: stdout.to_string(),
                stderr: String::new(),
            }),
        );
    }

    pub fn fail(&self, prefix: &str, code: i32, stderr: &str) {
        self.push(
            prefix,
            Reply::Output(CommandOutput {
                code: Some(code),
                stdout: String::new(),
                stderr: stderr.to_string(),
            }),
        );
    }

    pub fn timeout(&self, prefix: &str) {
        self.push(prefix, Reply::Timeout);
    }

    /// Command lines run so far
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(CommandSpec::command_line)
            .collect()
    }

    pub fn specs(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    pub fn ran(&self, prefix: &str) -> bool {
        self.calls().iter().any(|c| c.starts_with(prefix))
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        self.calls.lock().unwrap().push(spec.clone());
        let line = spec.command_line();
        let reply = self
            .rules
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map(|(_, reply)| reply.clone());

        match reply {
            Some(Reply::Output(output)) => Ok(output),
            Some(Reply::Timeout) => Err(Error::Timeout {
                program: spec.program.clone(),
                timeout: spec.timeout,
            }),
            None => Err(Error::unavailable(
                ComponentKind::Custom(spec.program.clone()),
                "not found on PATH",
            )),
        }
    }
}

pub(crate) fn context(
    host: HostCapabilities,
    runner: Arc<ScriptedRunner>,
    home: &Path,
) -> AdapterContext {
    let settings = Settings {
        use_sudo: false,
        ..Settings::default()
    };
    AdapterContext::new(host, settings, runner, home)
}

/// Drift with `to_apply` missing and `skipped` already present
pub(crate) fn item_check(kind: ComponentKind, to_apply: &[&str], skipped: usize) -> KindCheck {
    KindCheck {
        kind,
        drift: Drift::Items {
            to_apply: to_apply.iter().map(|s| s.to_string()).collect(),
            skipped_count: skipped,
            probe_unavailable: false,
        },
    }
}

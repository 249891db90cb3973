use std::sync::{Arc, Mutex};

use opvisor::exec::{LaunchPlan, LauncherBackend};
use opvisor::multiplex::OperationHandle;
use opvisor::operation::OperationEvent;
use opvisor::types::StreamKind;

/// One scripted step replayed against a launched operation.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptStep {
    Spawn(Option<u32>),
    Line(StreamKind, String),
    Close(StreamKind),
    Exit(Option<i32>),
    FailSpawn(String),
}

/// A fake launcher that:
/// - records every plan it was asked to launch
/// - immediately replays the same script against each operation.
#[derive(Clone)]
pub struct ScriptedLauncher {
    script: Vec<ScriptStep>,
    launched: Arc<Mutex<Vec<LaunchPlan>>>,
}

impl ScriptedLauncher {
    pub fn new(script: Vec<ScriptStep>) -> Self {
        Self {
            script,
            launched: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Spawn, print `lines` on stdout, close both streams, exit with `code`.
    pub fn printing(lines: &[&str], code: i32) -> Self {
        let mut script = vec![ScriptStep::Spawn(Some(4242))];
        script.extend(
            lines
                .iter()
                .map(|l| ScriptStep::Line(StreamKind::Stdout, l.to_string())),
        );
        script.push(ScriptStep::Close(StreamKind::Stdout));
        script.push(ScriptStep::Close(StreamKind::Stderr));
        script.push(ScriptStep::Exit(Some(code)));
        Self::new(script)
    }

    pub fn failing_spawn(message: &str) -> Self {
        Self::new(vec![ScriptStep::FailSpawn(message.to_string())])
    }

    pub fn launched(&self) -> Vec<LaunchPlan> {
        self.launched.lock().unwrap().clone()
    }
}

impl LauncherBackend for ScriptedLauncher {
    fn launch(&self, plan: LaunchPlan, handle: OperationHandle) {
        self.launched.lock().unwrap().push(plan);
        for step in &self.script {
            apply_step(&handle, step.clone());
        }
    }
}

/// A fake launcher that starts nothing and keeps the handles, so a test can
/// drive each operation by hand.
#[derive(Clone, Default)]
pub struct RecordingLauncher {
    launched: Arc<Mutex<Vec<(LaunchPlan, OperationHandle)>>>,
}

impl RecordingLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handles(&self) -> Vec<OperationHandle> {
        self.launched
            .lock()
            .unwrap()
            .iter()
            .map(|(_, h)| h.clone())
            .collect()
    }

    pub fn plans(&self) -> Vec<LaunchPlan> {
        self.launched
            .lock()
            .unwrap()
            .iter()
            .map(|(p, _)| p.clone())
            .collect()
    }

    pub fn last(&self) -> Option<OperationHandle> {
        self.launched.lock().unwrap().last().map(|(_, h)| h.clone())
    }
}

impl LauncherBackend for RecordingLauncher {
    fn launch(&self, plan: LaunchPlan, handle: OperationHandle) {
        self.launched.lock().unwrap().push((plan, handle));
    }
}

/// Apply a scripted step to a handle.
pub fn apply_step(handle: &OperationHandle, step: ScriptStep) {
    match step {
        ScriptStep::Spawn(pid) => {
            handle.apply(OperationEvent::Spawned { pid });
        }
        ScriptStep::Line(stream, line) => handle.ingest_line(stream, line),
        ScriptStep::Close(stream) => {
            handle.apply(OperationEvent::StreamClosed { stream });
        }
        ScriptStep::Exit(code) => {
            handle.apply(OperationEvent::ProcessExited { code });
        }
        ScriptStep::FailSpawn(message) => {
            handle.apply(OperationEvent::SpawnFailed { message });
        }
    }
}

/// Drive a handle through a successful run printing `lines` on stdout.
pub fn finish_with(handle: &OperationHandle, lines: &[&str], code: i32) {
    apply_step(handle, ScriptStep::Spawn(None));
    for line in lines {
        apply_step(handle, ScriptStep::Line(StreamKind::Stdout, line.to_string()));
    }
    apply_step(handle, ScriptStep::Close(StreamKind::Stdout));
    apply_step(handle, ScriptStep::Close(StreamKind::Stderr));
    apply_step(handle, ScriptStep::Exit(Some(code)));
}

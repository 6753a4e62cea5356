//! Test utility functions shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use shipline::core::{Level, Logger};
use shipline::process::{CommandError, CommandRunner};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

type SideEffect = Box<dyn Fn(&Path) + Send + Sync>;

/// Command runner that records every command instead of running it
#[derive(Default)]
pub struct MockRunner {
    commands: Mutex<Vec<String>>,
    failures: Vec<String>,
    side_effects: Vec<(String, SideEffect)>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `command` fail with exit code 1
    pub fn failing_on(mut self, command: &str) -> Self {
        self.failures.push(command.to_string());
        self
    }

    /// Run `effect` in the command's directory whenever `command` executes
    pub fn on<F>(mut self, command: &str, effect: F) -> Self
    where
        F: Fn(&Path) + Send + Sync + 'static,
    {
        self.side_effects.push((command.to_string(), Box::new(effect)));
        self
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    pub fn count(&self, command: &str) -> usize {
        self.commands().iter().filter(|c| *c == command).count()
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn execute(&self, command: &str, dir: &Path) -> Result<(), CommandError> {
        self.commands.lock().unwrap().push(command.to_string());

        for (trigger, effect) in &self.side_effects {
            if trigger == command {
                effect(dir);
            }
        }

        if self.failures.iter().any(|f| f == command) {
            return Err(CommandError::Failed {
                command: command.to_string(),
                code: Some(1),
            });
        }
        Ok(())
    }
}

/// Logger that keeps every line in memory
#[derive(Default)]
pub struct RecordingLogger {
    lines: Mutex<Vec<(Level, String)>>,
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn infos(&self) -> Vec<String> {
        self.with_level(Level::Info)
    }

    pub fn errors(&self) -> Vec<String> {
        self.with_level(Level::Error)
    }

    fn with_level(&self, level: Level) -> Vec<String> {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, text)| text.clone())
            .collect()
    }
}

impl Logger for RecordingLogger {
    fn write(&self, level: Level, text: &str, _plain: bool) {
        self.lines.lock().unwrap().push((level, text.to_string()));
    }
}

/// A working directory holding `package.json` with `manifest` as content
pub fn project(manifest: Value) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(dir.path(), &manifest);
    dir
}

pub fn manifest_file(dir: &Path) -> PathBuf {
    dir.join("package.json")
}

pub fn write_manifest(dir: &Path, manifest: &Value) {
    let content = serde_json::to_string_pretty(manifest).unwrap();
    std::fs::write(manifest_file(dir), content + "\n").unwrap();
}

pub fn read_manifest(dir: &Path) -> Value {
    let content = std::fs::read_to_string(manifest_file(dir)).unwrap();
    serde_json::from_str(&content).unwrap()
}

pub fn recorders() -> (Arc<MockRunner>, Arc<RecordingLogger>) {
    (Arc::new(MockRunner::new()), Arc::new(RecordingLogger::new()))
}

//! Console progress logger
//!
//! Every pipeline step reports through a [`Logger`]. Lines streamed from
//! child processes are written in plain mode so partial color codes never
//! end up in the middle of tool output.

use console::style;
use std::io::{self, Write};

/// Output channel of a log line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Error,
}

/// Fire-and-forget line sink used by pipelines and the process runner
pub trait Logger: Send + Sync {
    /// Write one line. `plain` disables colorization.
    fn write(&self, level: Level, text: &str, plain: bool);

    fn info(&self, text: &str) {
        self.write(Level::Info, text, false);
    }

    fn error(&self, text: &str) {
        self.write(Level::Error, text, false);
    }

    fn info_plain(&self, text: &str) {
        self.write(Level::Info, text, true);
    }
}

/// Logger writing info lines to stdout (green) and errors to stderr (red)
#[derive(Debug, Clone)]
pub struct ConsoleLogger {
    colored: bool,
}

impl ConsoleLogger {
    pub fn new(colored: bool) -> Self {
        Self { colored }
    }

    fn render(&self, level: Level, text: &str, plain: bool) -> String {
        if plain || !self.colored {
            return text.to_string();
        }
        match level {
            Level::Info => style(text).green().to_string(),
            Level::Error => style(text).red().to_string(),
        }
    }
}

impl Default for ConsoleLogger {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Logger for ConsoleLogger {
    fn write(&self, level: Level, text: &str, plain: bool) {
        let line = self.render(level, text, plain);
        // A closed stdout/stderr must not fail the pipeline
        let _ = match level {
            Level::Info => writeln!(io::stdout().lock(), "{}", line),
            Level::Error => writeln!(io::stderr().lock(), "{}", line),
        };
    }
}

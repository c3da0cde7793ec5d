//! User-facing output, passed explicitly to every component that talks to
//! the author.

use std::cell::RefCell;

use colored::Colorize;

/// Severity of a console message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Plain text.
    Line,
    /// Informational, shown dimmed or in cyan.
    Info,
    /// Completed action.
    Success,
    /// Something the author should look at.
    Warn,
}

/// Sink for user-facing messages.
pub trait Console {
    /// Emit a message at the given level.
    fn emit(&self, level: Level, message: &str);

    /// Plain line.
    fn line(&self, message: &str) {
        self.emit(Level::Line, message);
    }

    /// Informational message.
    fn info(&self, message: &str) {
        self.emit(Level::Info, message);
    }

    /// Success message.
    fn success(&self, message: &str) {
        self.emit(Level::Success, message);
    }

    /// Warning.
    fn warn(&self, message: &str) {
        self.emit(Level::Warn, message);
    }
}

/// Coloured output on stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalConsole;

impl Console for TerminalConsole {
    fn emit(&self, level: Level, message: &str) {
        match level {
            Level::Line => println!("{message}"),
            Level::Info => println!("{}", message.cyan()),
            Level::Success => println!("{}", message.green()),
            Level::Warn => println!("{}", message.yellow()),
        }
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentConsole;

impl Console for SilentConsole {
    fn emit(&self, _level: Level, _message: &str) {}
}

/// Keeps every message in memory.
#[derive(Debug, Default)]
pub struct RecordingConsole {
    messages: RefCell<Vec<(Level, String)>>,
}

impl RecordingConsole {
    /// An empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far.
    pub fn messages(&self) -> Vec<(Level, String)> {
        self.messages.borrow().clone()
    }

    /// Recorded warnings only.
    pub fn warnings(&self) -> Vec<String> {
        self.messages
            .borrow()
            .iter()
            .filter(|(level, _)| *level == Level::Warn)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

impl Console for RecordingConsole {
    fn emit(&self, level: Level, message: &str) {
        self.messages.borrow_mut().push((level, message.to_string()));
    }
}

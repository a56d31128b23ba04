//! Warning and trace reporting
//!
//! Nothing here is process-wide: every request carries its own
//! [`Diagnostics`] value holding the sink and the verbosity flag.

use tracing::{debug, warn};

/// Severity of a reported message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Non-fatal condition, always reported
    Warning,
    /// Informational trace, reported only when verbose
    Trace,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
}

/// Destination for warnings and traces
pub trait DiagnosticSink {
    fn warning(&mut self, message: &str);

    fn trace(&mut self, message: &str);
}

/// Forwards diagnostics to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn warning(&mut self, message: &str) {
        warn!(target: "rasterwin", "{}", message);
    }

    fn trace(&mut self, message: &str) {
        debug!(target: "rasterwin", "{}", message);
    }
}

/// Records diagnostics in order so a host can replay them
#[derive(Debug, Default, Clone)]
pub struct CollectingSink {
    entries: Vec<Diagnostic>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn warnings(&self) -> impl Iterator<Item = &str> {
        self.messages(Level::Warning)
    }

    pub fn traces(&self) -> impl Iterator<Item = &str> {
        self.messages(Level::Trace)
    }

    fn messages(&self, level: Level) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(move |d| d.level == level)
            .map(|d| d.message.as_str())
    }

    pub fn into_entries(self) -> Vec<Diagnostic> {
        self.entries
    }
}

impl DiagnosticSink for CollectingSink {
    fn warning(&mut self, message: &str) {
        self.entries.push(Diagnostic {
            level: Level::Warning,
            message: message.to_string(),
        });
    }

    fn trace(&mut self, message: &str) {
        self.entries.push(Diagnostic {
            level: Level::Trace,
            message: message.to_string(),
        });
    }
}

/// A sink plus the verbosity flag for one request
pub struct Diagnostics<'a> {
    sink: &'a mut dyn DiagnosticSink,
    verbose: bool,
}

impl<'a> Diagnostics<'a> {
    pub fn new(sink: &'a mut dyn DiagnosticSink, verbose: bool) -> Self {
        Self { sink, verbose }
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    pub fn warn(&mut self, message: impl AsRef<str>) {
        self.sink.warning(message.as_ref());
    }

    /// Emit a trace; the message is only built when verbose
    pub fn trace<F, S>(&mut self, message: F)
    where
        F: FnOnce() -> S,
        S: AsRef<str>,
    {
        if self.verbose {
            self.sink.trace(message().as_ref());
        }
    }
}

//! Per-run diagnostic capture
//!
//! Each agent run owns one `TraceSink`. Lines written to it end up in the
//! run's `ExecutionTrace` and nowhere else, so concurrent runs cannot see
//! each other's output.

use serde::Serialize;

/// Collects diagnostic lines for a single run
#[derive(Debug, Default)]
pub struct TraceSink {
    buffer: String,
}

impl TraceSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one line
    pub fn line(&mut self, text: impl AsRef<str>) {
        self.buffer.push_str(text.as_ref());
        self.buffer.push('\n');
    }

    /// Append a multi-line block, each line prefixed
    pub fn block(&mut self, prefix: &str, text: &str) {
        for l in text.lines() {
            self.buffer.push_str(prefix);
            self.buffer.push_str(l);
            self.buffer.push('\n');
        }
    }

    pub fn finish(self) -> ExecutionTrace {
        ExecutionTrace(self.buffer)
    }
}

/// Diagnostic text captured during one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ExecutionTrace(String);

impl ExecutionTrace {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for ExecutionTrace {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for ExecutionTrace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_and_blocks() {
        let mut sink = TraceSink::new();
        sink.line("invoked search");
        sink.block("│ ", "a\nb");
        assert_eq!(sink.finish().as_str(), "invoked search\n│ a\n│ b\n");
    }

    #[test]
    fn test_empty_trace() {
        let trace = TraceSink::new().finish();
        assert!(trace.is_empty());
        assert_eq!(trace.into_string(), "");
    }
}

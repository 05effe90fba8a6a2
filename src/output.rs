//! Output channel for the human-readable transcript

use std::io::Write;
use std::sync::Mutex;

/// Where agents and the orchestrator write user-facing lines
pub trait OutputSink: Send + Sync {
    /// Write one full line
    fn emit(&self, line: &str);

    /// Write a prompt without a trailing newline
    fn prompt(&self, text: &str);
}

/// Transcript on standard output
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn emit(&self, line: &str) {
        println!("{}", line);
    }

    fn prompt(&self, text: &str) {
        let mut stdout = std::io::stdout().lock();
        // A closed stdout only loses the prompt
        let _ = write!(stdout, "{}", text).and_then(|_| stdout.flush());
    }
}

/// Records every line; prompts are kept separately
#[derive(Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
    prompts: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.contains(needle))
    }
}

impl OutputSink for MemorySink {
    fn emit(&self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_string());
        }
    }

    fn prompt(&self, text: &str) {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(text.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_records_lines_and_prompts() {
        let sink = MemorySink::new();
        sink.emit("first");
        sink.prompt("> ");
        sink.emit("second line");

        assert_eq!(sink.lines(), vec!["first", "second line"]);
        assert_eq!(sink.prompts(), vec!["> "]);
        assert!(sink.contains("second"));
        assert!(!sink.contains(">"));
    }
}

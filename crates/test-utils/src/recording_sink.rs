use std::io;
use std::sync::{Arc, Mutex};

use publink::monitor::LineSink;

/// A sink that records every forwarded line in memory.
///
/// Clones share the same buffer, so a test keeps one clone and hands the
/// other to the monitor.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    lines: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose `forward` always fails with `BrokenPipe`, after recording
    /// the line.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl LineSink for RecordingSink {
    fn forward(&mut self, line: &str) -> io::Result<()> {
        {
            let mut guard = self.lines.lock().unwrap();
            guard.push(line.to_string());
        }

        if self.fail {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"));
        }
        Ok(())
    }
}

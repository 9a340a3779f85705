// src/monitor/sink.rs

use std::io::{self, Write};

use crate::types::StreamKind;

/// Destination for mirrored output lines.
///
/// Each call forwards one whole line; implementations append the line
/// terminator themselves.
///
/// `forward` is called from the stream copy tasks on the tokio runtime, one
/// line at a time. It must not block for longer than a terminal write.
pub trait LineSink: Send {
    fn forward(&mut self, line: &str) -> io::Result<()>;
}

impl<T: LineSink + ?Sized> LineSink for Box<T> {
    fn forward(&mut self, line: &str) -> io::Result<()> {
        (**self).forward(line)
    }
}

/// Writes lines to this process's own stdout or stderr.
///
/// The stream lock is held for the whole line, so lines never interleave
/// with other writers in this process.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleSink {
    kind: StreamKind,
}

impl ConsoleSink {
    pub fn stdout() -> Self {
        Self {
            kind: StreamKind::Stdout,
        }
    }

    pub fn stderr() -> Self {
        Self {
            kind: StreamKind::Stderr,
        }
    }
}

impl LineSink for ConsoleSink {
    fn forward(&mut self, line: &str) -> io::Result<()> {
        match self.kind {
            StreamKind::Stdout => {
                let mut out = io::stdout().lock();
                writeln!(out, "{line}")?;
                out.flush()
            }
            StreamKind::Stderr => {
                let mut err = io::stderr().lock();
                writeln!(err, "{line}")
            }
        }
    }
}

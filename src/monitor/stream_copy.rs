// src/monitor/stream_copy.rs

//! Stream-copy tasks.
//!
//! One task per child stream reads lines until EOF, forwards each line to its
//! sink, and (stdout only) runs the extraction rule until the first match.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::errors::PublinkError;
use crate::monitor::sink::LineSink;
use crate::monitor::slot::ResultSlot;
use crate::pattern::PatternRule;
use crate::types::StreamKind;

/// Extraction state carried by the stdout task.
#[derive(Debug)]
pub struct Extractor {
    pub rule: PatternRule,
    pub slot: ResultSlot,
}

/// Spawn a read-to-completion copy loop for one child stream.
///
/// Read errors end the loop (they are logged, never propagated). Sink errors
/// are logged once and the loop keeps reading so the child never blocks on a
/// full pipe and extraction keeps working.
pub fn spawn_stream_copy<R, S>(
    kind: StreamKind,
    reader: R,
    mut sink: S,
    extractor: Option<Extractor>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
    S: LineSink + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        let mut sink_failed = false;
        let mut lines = 0usize;

        loop {
            let line = match next_line(&mut reader, &mut buf).await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(source) => {
                    let err = PublinkError::StreamRead { stream: kind, source };
                    warn!(stream = %kind, error = %err, "treating read error as end of stream");
                    break;
                }
            };
            lines += 1;
            trace!(stream = %kind, "{}", line);

            if let Err(e) = sink.forward(&line) {
                if !sink_failed {
                    warn!(stream = %kind, error = %e, "failed to forward line; further sink errors suppressed");
                    sink_failed = true;
                }
            }

            if let Some(ex) = &extractor {
                if ex.slot.is_set() {
                    continue;
                }
                if let Some(value) = ex.rule.extract(&line) {
                    if ex.slot.set(value) {
                        info!(stream = %kind, url = %value, "matched published URL");
                    }
                }
            }
        }

        debug!(stream = %kind, lines, "stream copy finished");
    })
}

/// Read one line, stripping a trailing `\n` or `\r\n`. Invalid UTF-8 is
/// replaced rather than treated as an error.
async fn next_line<R>(reader: &mut BufReader<R>, buf: &mut Vec<u8>) -> std::io::Result<Option<String>>
where
    R: AsyncRead + Unpin,
{
    buf.clear();
    if reader.read_until(b'\n', buf).await? == 0 {
        return Ok(None);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }

    Ok(Some(String::from_utf8_lossy(buf).into_owned()))
}

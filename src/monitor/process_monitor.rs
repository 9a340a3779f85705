// src/monitor/process_monitor.rs

use std::future::pending;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::errors::{PublinkError, Result};
use crate::monitor::sink::{ConsoleSink, LineSink};
use crate::monitor::slot::{result_slot, ResultWaiter};
use crate::monitor::spawn::{start, ProcessHandle};
use crate::monitor::stream_copy::{spawn_stream_copy, Extractor};
use crate::monitor::MonitorState;
use crate::pattern::PatternRule;
use crate::types::{ExitPolicy, Invocation, StreamKind};

/// How long to wait for the copy tasks to drain after the process is gone.
/// A grandchild that inherited the pipes can keep them open indefinitely.
const JOIN_GRACE: Duration = Duration::from_secs(2);

/// Supervises one publisher process: mirrors its output and extracts the
/// published URL from stdout.
///
/// Typical use:
///
/// ```no_run
/// # async fn demo() -> publink::errors::Result<()> {
/// use publink::monitor::ProcessMonitor;
/// use publink::pattern::PatternRule;
/// use publink::types::Invocation;
///
/// let mut monitor = ProcessMonitor::new(
///     Invocation::shell("./clo publish http 8080"),
///     PatternRule::default(),
/// );
/// let url = monitor.run().await?;
/// println!("Published URL: {url}");
/// monitor.wait().await?;
/// # Ok(())
/// # }
/// ```
///
/// Dropping the monitor kills the process and aborts the copy tasks.
pub struct ProcessMonitor {
    invocation: Invocation,
    rule: PatternRule,
    timeout: Option<Duration>,
    exit_policy: ExitPolicy,
    cancel: Option<oneshot::Receiver<()>>,
    stdout_sink: Option<Box<dyn LineSink>>,
    stderr_sink: Option<Box<dyn LineSink>>,
    state: MonitorState,
    child: Option<ProcessHandle>,
    tasks: Vec<JoinHandle<()>>,
}

impl ProcessMonitor {
    /// Monitor that mirrors to the console, with no timeout and the default
    /// exit policy.
    pub fn new(invocation: Invocation, rule: PatternRule) -> Self {
        Self {
            invocation,
            rule,
            timeout: None,
            exit_policy: ExitPolicy::default(),
            cancel: None,
            stdout_sink: None,
            stderr_sink: None,
            state: MonitorState::Idle,
            child: None,
            tasks: Vec::new(),
        }
    }

    pub fn with_sinks<O, E>(mut self, stdout: O, stderr: E) -> Self
    where
        O: LineSink + 'static,
        E: LineSink + 'static,
    {
        self.stdout_sink = Some(Box::new(stdout));
        self.stderr_sink = Some(Box::new(stderr));
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_exit_policy(mut self, policy: ExitPolicy) -> Self {
        self.exit_policy = policy;
        self
    }

    /// Sending `()` on the paired sender cancels `run` (or `wait`) and kills
    /// the process. Dropping the sender without sending does nothing.
    pub fn with_cancel(mut self, cancel: oneshot::Receiver<()>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn invocation(&self) -> &Invocation {
        &self.invocation
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(ProcessHandle::id)
    }

    /// Start the process and wait for the first stdout line matching the
    /// rule. Returns the captured value.
    ///
    /// On any failure the process is killed and the copy tasks are stopped
    /// before the error is returned. Only callable once.
    pub async fn run(&mut self) -> Result<String> {
        if self.state != MonitorState::Idle {
            return Err(PublinkError::InvalidState(self.state));
        }

        let mut handle = match start(&self.invocation) {
            Ok(h) => h,
            Err(e) => {
                self.state = MonitorState::Failed;
                return Err(e);
            }
        };
        self.state = MonitorState::Spawned;

        let (slot, mut waiter) = result_slot();
        let stdout_sink = self
            .stdout_sink
            .take()
            .unwrap_or_else(|| Box::new(ConsoleSink::stdout()));
        let stderr_sink = self
            .stderr_sink
            .take()
            .unwrap_or_else(|| Box::new(ConsoleSink::stderr()));

        // Without a stdout pipe the slot is dropped here and the waiter
        // resolves to "no match" straight away.
        if let Some(stdout) = handle.take_stdout() {
            let extractor = Extractor {
                rule: self.rule.clone(),
                slot,
            };
            self.tasks.push(spawn_stream_copy(
                StreamKind::Stdout,
                stdout,
                stdout_sink,
                Some(extractor),
            ));
        }
        if let Some(stderr) = handle.take_stderr() {
            self.tasks
                .push(spawn_stream_copy(StreamKind::Stderr, stderr, stderr_sink, None));
        }

        self.child = Some(handle);
        self.state = MonitorState::Streaming;

        match self.await_match(&mut waiter).await {
            Ok(url) => {
                self.state = MonitorState::Matched;
                Ok(url)
            }
            Err(e) => {
                debug!(error = %e, "run failed; tearing down");
                self.teardown().await;
                self.state = MonitorState::Failed;
                Err(e)
            }
        }
    }

    async fn await_match(&mut self, waiter: &mut ResultWaiter) -> Result<String> {
        let policy = self.exit_policy;
        let timeout = self.timeout;
        let cancel = &mut self.cancel;
        let child = self
            .child
            .as_mut()
            .ok_or(PublinkError::InvalidState(MonitorState::Spawned))?;

        let matched = async {
            if let Some(url) = waiter.wait().await {
                return Ok::<_, PublinkError>(url);
            }

            // Stdout is drained; no match can arrive any more.
            let exit_code = child.wait().await?;
            match policy {
                ExitPolicy::Fail => Err(PublinkError::NoMatch { exit_code }),
                ExitPolicy::Wait => {
                    warn!(
                        cmd = %child.command(),
                        ?exit_code,
                        "process exited without a match; waiting anyway (on_exit_without_match = wait)"
                    );
                    pending().await
                }
            }
        };

        tokio::select! {
            res = matched => res,
            elapsed = deadline(timeout) => Err(PublinkError::Timeout(elapsed)),
            () = cancellation(cancel) => {
                info!("cancellation requested before a match");
                Err(PublinkError::Cancelled)
            }
        }
    }

    /// After a successful [`run`](Self::run): keep mirroring until the
    /// process exits, then join the copy tasks. Returns the exit code.
    ///
    /// A cancellation during the wait kills the process and yields
    /// [`PublinkError::Cancelled`].
    pub async fn wait(&mut self) -> Result<Option<i32>> {
        if self.state != MonitorState::Matched {
            return Err(PublinkError::InvalidState(self.state));
        }

        let cancel = &mut self.cancel;
        let child = self
            .child
            .as_mut()
            .ok_or(PublinkError::InvalidState(MonitorState::Matched))?;

        let outcome = tokio::select! {
            code = child.wait() => code,
            () = cancellation(cancel) => Err(PublinkError::Cancelled),
        };

        self.teardown().await;
        self.state = MonitorState::Finished;
        outcome
    }

    /// Kill the process if it is still running and stop the copy tasks.
    pub async fn shutdown(&mut self) {
        self.teardown().await;
        if self.state != MonitorState::Failed {
            self.state = MonitorState::Finished;
        }
    }

    async fn teardown(&mut self) {
        if let Some(child) = self.child.as_mut() {
            child.kill().await;
        }

        let deadline = Instant::now() + JOIN_GRACE;
        for handle in self.tasks.drain(..) {
            let abort = handle.abort_handle();
            match tokio::time::timeout_at(deadline, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) if e.is_cancelled() => {}
                Ok(Err(e)) => warn!(error = %e, "stream copy task panicked"),
                Err(_) => {
                    debug!("stream copy task still running after grace period; aborting");
                    abort.abort();
                }
            }
        }
    }
}

impl Drop for ProcessMonitor {
    fn drop(&mut self) {
        // The child itself is killed by `kill_on_drop`.
        for handle in &self.tasks {
            handle.abort();
        }
    }
}

async fn deadline(timeout: Option<Duration>) -> Duration {
    match timeout {
        Some(d) => {
            tokio::time::sleep(d).await;
            d
        }
        None => pending().await,
    }
}

/// Resolves when cancellation is requested. A dropped sender disarms the
/// receiver instead of counting as a cancel.
async fn cancellation(slot: &mut Option<oneshot::Receiver<()>>) {
    if let Some(rx) = slot.as_mut() {
        let fired = rx.await.is_ok();
        *slot = None;
        if fired {
            return;
        }
    }
    pending().await
}

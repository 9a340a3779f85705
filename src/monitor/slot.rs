// src/monitor/slot.rs

//! Write-once result slot.
//!
//! Built on `tokio::sync::watch`: the writer flips `None` to `Some` at most
//! once via `send_if_modified`, and the waiter parks in `wait_for` until the
//! value is set or the writer is dropped.

use tokio::sync::watch;

/// Writing half. Held by the stdout copy task only; dropping it tells the
/// waiter that no match can arrive any more.
#[derive(Debug)]
pub struct ResultSlot {
    tx: watch::Sender<Option<String>>,
}

/// Reading half, held by the caller of `ProcessMonitor::run`.
#[derive(Debug, Clone)]
pub struct ResultWaiter {
    rx: watch::Receiver<Option<String>>,
}

pub fn result_slot() -> (ResultSlot, ResultWaiter) {
    let (tx, rx) = watch::channel(None);
    (ResultSlot { tx }, ResultWaiter { rx })
}

impl ResultSlot {
    /// Store `value` if the slot is still empty. Returns `true` only for the
    /// write that actually landed.
    pub fn set(&self, value: &str) -> bool {
        self.tx.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(value.to_string());
            true
        })
    }

    pub fn is_set(&self) -> bool {
        self.tx.borrow().is_some()
    }
}

impl ResultWaiter {
    /// Current value without waiting.
    pub fn get(&self) -> Option<String> {
        self.rx.borrow().clone()
    }

    /// Wait until the slot is set. Returns `None` if the writer went away
    /// without ever setting it.
    pub async fn wait(&mut self) -> Option<String> {
        match self.rx.wait_for(Option::is_some).await {
            Ok(value) => value.clone(),
            Err(_) => None,
        }
    }
}

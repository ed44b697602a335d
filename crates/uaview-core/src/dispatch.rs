// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Thread-affine callback forwarding.
//!
//! Session callbacks arrive on arbitrary threads while consumer slots belong
//! to a single presentation thread. [`DispatchBridge::post`] moves a callback
//! onto that thread:
//!
//! ```text
//!  session thread                      owning thread
//!  ──────────────                      ─────────────
//!  bridge.post(f) ──▶ [ FIFO queue ] ──▶ DispatchLoop::run_pending() ─▶ f()
//!
//!  owning thread
//!  bridge.post(f) ─────────────────────────────────────────────────▶ f()
//! ```
//!
//! The loop half is `!Send`: it is created on, and must stay on, the owning
//! thread.

use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;
use std::thread::{self, ThreadId};

use tokio::sync::mpsc;

use crate::error::DispatchError;

type Callback = Box<dyn FnOnce() + Send + 'static>;

// =============================================================================
// DispatchBridge
// =============================================================================

/// Cloneable, `Send` handle used to post callbacks to the owning thread.
#[derive(Clone)]
pub struct DispatchBridge {
    owner: ThreadId,
    sender: mpsc::UnboundedSender<Callback>,
}

impl DispatchBridge {
    /// Creates a bridge owned by the calling thread, together with its loop.
    pub fn new() -> (Self, DispatchLoop) {
        let owner = thread::current().id();
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self { owner, sender },
            DispatchLoop {
                owner,
                receiver,
                _not_send: PhantomData,
            },
        )
    }

    /// Returns `true` when called on the owning thread.
    pub fn is_owner_thread(&self) -> bool {
        thread::current().id() == self.owner
    }

    /// Returns `true` once the loop has been dropped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Runs `callback` on the owning thread.
    ///
    /// On the owning thread the callback runs inline before `post` returns.
    /// Elsewhere it is queued in FIFO order and `post` returns immediately.
    pub fn post<F>(&self, callback: F) -> Result<(), DispatchError>
    where
        F: FnOnce() + Send + 'static,
    {
        if self.sender.is_closed() {
            return Err(DispatchError::OwnerGone);
        }
        if self.is_owner_thread() {
            callback();
            return Ok(());
        }
        self.sender
            .send(Box::new(callback))
            .map_err(|_| DispatchError::OwnerGone)
    }
}

impl fmt::Debug for DispatchBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchBridge")
            .field("owner", &self.owner)
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}

// =============================================================================
// DispatchLoop
// =============================================================================

/// Receiving half of a [`DispatchBridge`], pinned to the owning thread.
pub struct DispatchLoop {
    owner: ThreadId,
    receiver: mpsc::UnboundedReceiver<Callback>,
    _not_send: PhantomData<Rc<()>>,
}

impl DispatchLoop {
    /// Runs every queued callback without waiting. Returns how many ran.
    pub fn run_pending(&mut self) -> usize {
        debug_assert_eq!(thread::current().id(), self.owner);
        let mut ran = 0;
        while let Ok(callback) = self.receiver.try_recv() {
            callback();
            ran += 1;
        }
        if ran > 0 {
            tracing::trace!(callbacks = ran, "Dispatched queued callbacks");
        }
        ran
    }

    /// Waits for callbacks and runs them until every bridge is dropped.
    ///
    /// Returns the number of callbacks that ran.
    pub async fn run(&mut self) -> usize {
        debug_assert_eq!(thread::current().id(), self.owner);
        let mut ran = 0;
        while let Some(callback) = self.receiver.recv().await {
            callback();
            ran += 1;
        }
        tracing::debug!(callbacks = ran, "Dispatch loop finished");
        ran
    }
}

impl fmt::Debug for DispatchLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchLoop")
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;

    #[test]
    fn test_post_on_owner_runs_inline() {
        let (bridge, mut dispatch) = DispatchBridge::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&log);
        bridge.post(move || sink.lock().push(1)).unwrap();

        assert_eq!(*log.lock(), vec![1]);
        assert_eq!(dispatch.run_pending(), 0);
    }

    #[test]
    fn test_post_from_other_thread_is_queued_fifo() {
        let (bridge, mut dispatch) = DispatchBridge::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let remote = bridge.clone();
        let sink = Arc::clone(&log);
        thread::spawn(move || {
            assert!(!remote.is_owner_thread());
            for i in 0..3 {
                let sink = Arc::clone(&sink);
                remote.post(move || sink.lock().push(i)).unwrap();
            }
        })
        .join()
        .unwrap();

        assert!(log.lock().is_empty());
        assert_eq!(dispatch.run_pending(), 3);
        assert_eq!(*log.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn test_post_after_loop_dropped_fails() {
        let (bridge, dispatch) = DispatchBridge::new();
        drop(dispatch);

        assert!(bridge.is_closed());
        assert_eq!(bridge.post(|| {}), Err(DispatchError::OwnerGone));

        let remote = bridge.clone();
        let result = thread::spawn(move || remote.post(|| {})).join().unwrap();
        assert_eq!(result, Err(DispatchError::OwnerGone));
    }

    #[tokio::test]
    async fn test_run_until_bridges_dropped() {
        let (bridge, mut dispatch) = DispatchBridge::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&log);
        let handle = thread::spawn(move || {
            for i in 0..4 {
                let sink = Arc::clone(&sink);
                bridge.post(move || sink.lock().push(i)).unwrap();
            }
        });
        handle.join().unwrap();

        assert_eq!(dispatch.run().await, 4);
        assert_eq!(*log.lock(), vec![0, 1, 2, 3]);
    }
}

//! The work queue between the generator and the pool.
//!
//! A tokio mpsc channel, bounded or unbounded, whose single receiver is
//! shared by every worker. Workers take turns on the receiver through a fair
//! async mutex, so delivery into the pool stays FIFO and every item reaches
//! exactly one worker.

use std::num::NonZeroUsize;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};

use crate::error::{Error, Result};
use crate::model::WorkItem;

/// Creates a work queue. `None` means unbounded.
pub fn work_queue(capacity: Option<NonZeroUsize>) -> (WorkSender, WorkReceiver) {
    match capacity {
        Some(capacity) => {
            let (tx, rx) = mpsc::channel(capacity.get());
            (
                WorkSender {
                    inner: SenderKind::Bounded(tx),
                },
                WorkReceiver::new(ReceiverKind::Bounded(rx)),
            )
        }
        None => {
            let (tx, rx) = mpsc::unbounded_channel();
            (
                WorkSender {
                    inner: SenderKind::Unbounded(tx),
                },
                WorkReceiver::new(ReceiverKind::Unbounded(rx)),
            )
        }
    }
}

#[derive(Debug, Clone)]
enum SenderKind {
    Bounded(mpsc::Sender<WorkItem>),
    Unbounded(mpsc::UnboundedSender<WorkItem>),
}

#[derive(Debug)]
enum ReceiverKind {
    Bounded(mpsc::Receiver<WorkItem>),
    Unbounded(mpsc::UnboundedReceiver<WorkItem>),
}

/// Producer half. The queue closes once every sender is dropped.
#[derive(Debug, Clone)]
pub struct WorkSender {
    inner: SenderKind,
}

impl WorkSender {
    /// Enqueue an item, suspending while a bounded queue is full.
    ///
    /// Cancel-safe: if the future is dropped before completing, the item was
    /// not enqueued.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QueueClosed`] if the receiving side is gone.
    pub async fn send(&self, item: WorkItem) -> Result<()> {
        match &self.inner {
            SenderKind::Bounded(tx) => tx.send(item).await.map_err(|_| Error::QueueClosed),
            SenderKind::Unbounded(tx) => tx.send(item).map_err(|_| Error::QueueClosed),
        }
    }

    /// Free slots left in a bounded queue. `None` for an unbounded one.
    pub fn capacity(&self) -> Option<usize> {
        match &self.inner {
            SenderKind::Bounded(tx) => Some(tx.capacity()),
            SenderKind::Unbounded(_) => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        match &self.inner {
            SenderKind::Bounded(tx) => tx.is_closed(),
            SenderKind::Unbounded(tx) => tx.is_closed(),
        }
    }
}

/// Consumer half, cloned into each worker.
#[derive(Debug, Clone)]
pub struct WorkReceiver {
    inner: Arc<Mutex<ReceiverKind>>,
}

impl WorkReceiver {
    fn new(kind: ReceiverKind) -> Self {
        Self {
            inner: Arc::new(Mutex::new(kind)),
        }
    }

    /// Wait for the next item. Returns `None` once the queue is closed and
    /// drained.
    pub async fn recv(&self) -> Option<WorkItem> {
        let mut rx = self.inner.lock().await;
        match &mut *rx {
            ReceiverKind::Bounded(rx) => rx.recv().await,
            ReceiverKind::Unbounded(rx) => rx.recv().await,
        }
    }

    /// Take the next item without waiting. Returns `None` if the queue is
    /// empty or another worker is currently receiving.
    pub fn try_recv(&self) -> Option<WorkItem> {
        let mut rx = self.inner.try_lock().ok()?;
        match &mut *rx {
            ReceiverKind::Bounded(rx) => rx.try_recv().ok(),
            ReceiverKind::Unbounded(rx) => rx.try_recv().ok(),
        }
    }
}

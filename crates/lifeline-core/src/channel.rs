//! Named, bounded, typed queue.
//!
//! A [`ChannelBase`] wraps a tokio bounded mpsc queue whose receiver is
//! shared behind an async mutex, so any number of producers and consumers can
//! use the same handle. The queue can be reallocated (`set_buffers`,
//! `set_channel`, `clear`) or closed for good (`close`).
//!
//! Reallocation drops whatever was buffered in the old queue. Consumers
//! already waiting on the old queue observe end-of-stream.

use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Mutex as AsyncMutex;
use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use lifeline_protocols::ChannelError;

/// Capacity of small control channels (`done`, `condition`).
pub const SMALL_BUFFER: usize = 2;
/// Capacity of medium channels (`ctl`, `telemetry`, `monitor`).
pub const MEDIUM_BUFFER: usize = 5;
/// Capacity of main channels and the fallback for a zero request.
pub const LARGE_BUFFER: usize = 10;

struct Queue<T> {
    tx: Option<mpsc::Sender<T>>,
    rx: Arc<AsyncMutex<mpsc::Receiver<T>>>,
    capacity: usize,
    retired: CancellationToken,
}

impl<T> Queue<T> {
    fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        Self {
            tx: Some(tx),
            rx: Arc::new(AsyncMutex::new(rx)),
            capacity,
            retired: CancellationToken::new(),
        }
    }
}

/// A single named, typed, bounded queue.
pub struct ChannelBase<T> {
    name: RwLock<String>,
    queue: RwLock<Queue<T>>,
}

impl<T> ChannelBase<T> {
    /// Create a channel. A zero capacity is raised to [`LARGE_BUFFER`].
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: RwLock::new(name.into()),
            queue: RwLock::new(Queue::new(effective_capacity(capacity))),
        }
    }

    pub fn name(&self) -> String {
        self.name.read().clone()
    }

    pub fn set_name(&self, name: impl Into<String>) {
        *self.name.write() = name.into();
    }

    pub fn capacity(&self) -> usize {
        self.queue.read().capacity
    }

    /// Name of the element type carried by this channel.
    pub fn kind(&self) -> &'static str {
        type_name::<T>()
    }

    pub fn is_closed(&self) -> bool {
        self.queue.read().tx.is_none()
    }

    /// Number of buffered messages.
    pub fn len(&self) -> usize {
        match &self.queue.read().tx {
            Some(tx) => tx.max_capacity() - tx.capacity(),
            None => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Enqueue without waiting. Fails with [`ChannelError::Full`] when the
    /// buffer has no room.
    pub fn try_send(&self, value: T) -> Result<(), ChannelError> {
        let queue = self.queue.read();
        let tx = queue
            .tx
            .as_ref()
            .ok_or_else(|| ChannelError::Closed(self.name()))?;
        tx.try_send(value).map_err(|e| match e {
            TrySendError::Full(_) => ChannelError::Full(self.name()),
            TrySendError::Closed(_) => ChannelError::Closed(self.name()),
        })
    }

    /// Enqueue, waiting for room. Aborted with [`ChannelError::Closed`] if
    /// the queue is closed or reallocated while waiting.
    pub async fn send(&self, value: T) -> Result<(), ChannelError> {
        let (tx, retired) = {
            let queue = self.queue.read();
            match &queue.tx {
                Some(tx) => (tx.clone(), queue.retired.clone()),
                None => return Err(ChannelError::Closed(self.name())),
            }
        };

        tokio::select! {
            result = tx.send(value) => result.map_err(|_| ChannelError::Closed(self.name())),
            _ = retired.cancelled() => Err(ChannelError::Closed(self.name())),
        }
    }

    /// Wait for the next message. Returns `None` once the queue is closed
    /// (or reallocated) and drained.
    pub async fn recv(&self) -> Option<T> {
        let rx = self.queue.read().rx.clone();
        let mut rx = rx.lock().await;
        rx.recv().await
    }

    /// Take a buffered message if one is ready and no other consumer holds
    /// the receiver.
    pub fn try_recv(&self) -> Option<T> {
        let rx = self.queue.read().rx.clone();
        let mut rx = rx.try_lock().ok()?;
        match rx.try_recv() {
            Ok(value) => Some(value),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Reallocate the queue with a new capacity, discarding buffered
    /// messages. Returns the capacity in effect, or 0 on a closed channel.
    pub fn set_buffers(&self, capacity: usize) -> usize {
        let capacity = effective_capacity(capacity);
        let mut queue = self.queue.write();
        if queue.tx.is_none() {
            debug!("Ignoring buffer resize on closed channel {}", self.name());
            return 0;
        }
        queue.retired.cancel();
        *queue = Queue::new(capacity);
        capacity
    }

    /// Reallocate the queue with its current capacity.
    pub fn set_channel(&self) -> usize {
        let capacity = self.capacity();
        self.set_buffers(capacity)
    }

    /// Close the current queue and replace it with an empty one.
    pub fn clear(&self) -> Result<(), ChannelError> {
        let mut queue = self.queue.write();
        if queue.tx.is_none() {
            return Err(ChannelError::AlreadyClosed(self.name()));
        }
        queue.retired.cancel();
        let capacity = queue.capacity;
        *queue = Queue::new(capacity);
        Ok(())
    }

    /// Close the channel permanently. Already buffered messages can still be
    /// received. A second close fails with [`ChannelError::AlreadyClosed`].
    pub fn close(&self) -> Result<(), ChannelError> {
        let mut queue = self.queue.write();
        if queue.tx.take().is_none() {
            return Err(ChannelError::AlreadyClosed(self.name()));
        }
        queue.retired.cancel();
        Ok(())
    }
}

impl<T> fmt::Debug for ChannelBase<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelBase")
            .field("name", &self.name())
            .field("kind", &self.kind())
            .field("capacity", &self.capacity())
            .field("closed", &self.is_closed())
            .finish()
    }
}

fn effective_capacity(capacity: usize) -> usize {
    if capacity == 0 { LARGE_BUFFER } else { capacity }
}

//! Bounded, paced queue for expand/collapse requests.
//!
//! [`ActionQueue::enqueue`] appends to a logical FIFO of at most `capacity`
//! actions and hands the action to a background drain task. The drain task
//! is a sequential loop (receive, wait one full interval, deliver), so each
//! delivery is spaced a full interval after the previous one was handed off,
//! however large the backlog.
//!
//! Delivery and bookkeeping are separate: the consumer calls
//! [`ActionQueue::dequeue`] after handling a delivered action, and only that
//! frees a slot in the logical queue.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::{Result, WikiGraphError};
use crate::types::{ActionKind, GraphAction, NodeId};

pub const DEFAULT_QUEUE_CAPACITY: usize = 3;
pub const DEFAULT_ACTION_INTERVAL: Duration = Duration::from_millis(1000);

/// Producer side of the action pipeline.
///
/// All methods take the inner lock briefly and never hold it across an
/// `.await`.
#[derive(Debug, Clone)]
pub struct ActionQueue {
    capacity: usize,
    pending: Arc<Mutex<VecDeque<GraphAction>>>,
    schedule: mpsc::UnboundedSender<GraphAction>,
}

impl ActionQueue {
    /// Start the drain task and return the queue plus the stream of
    /// delivered actions. Must be called inside a tokio runtime.
    pub fn spawn(
        capacity: usize,
        interval: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<GraphAction>) {
        let (schedule, scheduled) = mpsc::unbounded_channel();
        let (delivered, deliveries) = mpsc::unbounded_channel();
        tokio::spawn(drain(scheduled, delivered, interval));
        let queue = Self {
            capacity,
            pending: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            schedule,
        };
        (queue, deliveries)
    }

    /// Queue an action. Fails with [`WikiGraphError::QueueFull`] when
    /// `capacity` actions are already pending; the queue is left untouched.
    pub fn enqueue(&self, kind: ActionKind, node_id: impl Into<NodeId>) -> Result<GraphAction> {
        let action = GraphAction::new(kind, node_id);
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if pending.len() >= self.capacity {
            warn!(kind = %action.kind, node = %action.node_id, "action queue full");
            return Err(WikiGraphError::QueueFull {
                capacity: self.capacity,
            });
        }
        self.schedule
            .send(action.clone())
            .map_err(|_| WikiGraphError::Closed)?;
        pending.push_back(action.clone());
        debug!(kind = %action.kind, node = %action.node_id, queued = pending.len(), "action queued");
        Ok(action)
    }

    /// Acknowledge a processed delivery, freeing one slot.
    pub fn dequeue(&self) -> Option<GraphAction> {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.pop_front()
    }

    /// Current logical queue length.
    pub fn len(&self) -> usize {
        self.pending.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Pending actions, oldest first.
    pub fn pending(&self) -> Vec<GraphAction> {
        let pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.iter().cloned().collect()
    }
}

/// Chained-delay drain: each action waits a full `interval` starting from
/// the moment the previous one was delivered (or from its own arrival when
/// the queue was idle).
async fn drain(
    mut scheduled: mpsc::UnboundedReceiver<GraphAction>,
    delivered: mpsc::UnboundedSender<GraphAction>,
    interval: Duration,
) {
    while let Some(action) = scheduled.recv().await {
        tokio::time::sleep(interval).await;
        debug!(kind = %action.kind, node = %action.node_id, "action delivered");
        if delivered.send(action).is_err() {
            break;
        }
    }
}

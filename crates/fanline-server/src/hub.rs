//! Broadcast hub: one message stream fanned out to per-subscriber queues.

use std::collections::HashMap;
use std::sync::Arc;

use fanline_core::{Backlog, MessageSink};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

/// Unique id for one downstream subscriber.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubscriberId(String);

impl SubscriberId {
    fn new() -> Self {
        Self(format!("sub_{}", Uuid::now_v7()))
    }
}

impl std::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hub-side handle to one subscriber's delivery queue.
struct SubscriberHandle {
    tx: mpsc::Sender<Arc<String>>,
    token: CancellationToken,
}

/// Backlog and subscriber map, guarded together so a joining subscriber's
/// backlog snapshot and queue registration are a single atomic step.
struct HubState {
    backlog: Backlog,
    subscribers: HashMap<SubscriberId, SubscriberHandle>,
}

/// Everything a newly registered subscriber needs to run its delivery pump.
pub struct Subscription {
    /// The subscriber's id, used for deregistration and logging.
    pub id: SubscriberId,
    /// The private delivery queue.
    pub rx: mpsc::Receiver<Arc<String>>,
    /// Backlog snapshot taken atomically with registration, oldest first.
    pub replay: Vec<Arc<String>>,
    /// Cancelled on eviction; child of the hub token, so it also fires on
    /// hub shutdown.
    pub token: CancellationToken,
}

/// Fans one stream of messages out to every registered subscriber.
///
/// Fan-out never blocks: each subscriber has a private bounded queue and a
/// subscriber whose queue is full is evicted rather than waited on. The
/// per-message scan is O(subscribers) under one mutex, which is fine for
/// the modest subscriber counts this bot targets but is a known ceiling
/// somewhere in the low thousands of concurrent subscribers.
pub struct BroadcastHub {
    state: Mutex<HubState>,
    queue_capacity: usize,
    shutdown: CancellationToken,
}

impl BroadcastHub {
    /// Hub with a backlog of `backlog_capacity` messages (0 disables
    /// replay) and per-subscriber queues of `queue_capacity` messages.
    pub fn new(backlog_capacity: usize, queue_capacity: usize) -> Self {
        Self {
            state: Mutex::new(HubState {
                backlog: Backlog::new(backlog_capacity),
                subscribers: HashMap::new(),
            }),
            // A zero-capacity queue could never accept a message, so every
            // subscriber would be evicted on the first fan-out.
            queue_capacity: queue_capacity.max(1),
            shutdown: CancellationToken::new(),
        }
    }

    /// Register a new subscriber.
    ///
    /// The backlog snapshot and the queue-map insertion happen in one
    /// critical section, so a message observed by `on_message` lands either
    /// in the snapshot or in the queue — never both, never neither.
    pub fn subscribe(&self) -> Subscription {
        let id = SubscriberId::new();
        let (tx, rx) = mpsc::channel(self.queue_capacity);
        let token = self.shutdown.child_token();

        let replay = {
            let mut state = self.state.lock();
            let replay = state.backlog.snapshot();
            let _ = state.subscribers.insert(
                id.clone(),
                SubscriberHandle {
                    tx,
                    token: token.clone(),
                },
            );
            replay
        };

        debug!(subscriber = %id, replay = replay.len(), "subscriber registered");
        Subscription {
            id,
            rx,
            replay,
            token,
        }
    }

    /// Remove a subscriber. Returns `true` the first time, `false` after.
    ///
    /// The map removal under the hub lock is the once-guard: every cleanup
    /// path funnels through here, and only the caller that actually removed
    /// the entry proceeds to cancel its token.
    pub fn deregister(&self, id: &SubscriberId) -> bool {
        let removed = self.state.lock().subscribers.remove(id);
        match removed {
            Some(handle) => {
                handle.token.cancel();
                debug!(subscriber = %id, "subscriber deregistered");
                true
            }
            None => false,
        }
    }

    /// Signal hub-wide shutdown: every delivery pump observes it and exits.
    /// Idempotent.
    pub fn close(&self) {
        self.shutdown.cancel();
    }

    /// Token cancelled by [`close`](BroadcastHub::close); the server's
    /// accept loop stops on it.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Number of currently registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.state.lock().subscribers.len()
    }
}

impl MessageSink for BroadcastHub {
    /// Append to the backlog and fan out to every subscriber queue.
    ///
    /// A full queue evicts its subscriber (token cancel, cheap and
    /// non-blocking); the hub never waits on a slow consumer and never
    /// buffers more than the queue capacity per subscriber.
    fn on_message(&self, line: String) {
        let message = Arc::new(line);
        let mut state = self.state.lock();
        state.backlog.push(Arc::clone(&message));

        for (id, handle) in &state.subscribers {
            match handle.tx.try_send(Arc::clone(&message)) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(subscriber = %id, "delivery queue full, evicting subscriber");
                    handle.token.cancel();
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    // Pump already gone; deregistration is in flight.
                    handle.token.cancel();
                }
            }
        }
    }
}

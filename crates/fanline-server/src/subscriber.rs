//! Per-subscriber delivery pump.

use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::hub::BroadcastHub;

/// Write half of one downstream connection.
///
/// The pump owns the sink; the connection's read side is watched elsewhere
/// and surfaces as the `peer_closed` token handed to
/// [`BroadcastHub::attach`].
#[async_trait]
pub trait SubscriberSink: Send {
    /// Deliver one message as a single text frame.
    async fn send_line(&mut self, line: &str) -> io::Result<()>;
}

impl BroadcastHub {
    /// Register a subscriber, replay the backlog, and pump live messages
    /// into `sink` until the connection, the queue, or the hub closes.
    ///
    /// Every write races the cancellation tokens, so a subscriber whose
    /// socket stalls mid-write cannot pin the pump: eviction and hub
    /// shutdown abandon the write and force the connection closed.
    ///
    /// Cleanup runs exactly once on every exit path: the subscriber is
    /// removed from the map, its token is cancelled, and dropping the queue
    /// receiver closes the queue.
    pub async fn attach<S: SubscriberSink>(
        self: Arc<Self>,
        mut sink: S,
        peer_closed: CancellationToken,
    ) {
        let mut sub = self.subscribe();

        // Replay happens outside the hub lock; a send failure here means
        // the socket died before live delivery even started.
        for line in &sub.replay {
            if !write_or_cancelled(&mut sink, line, &sub.token, &peer_closed).await {
                debug!(subscriber = %sub.id, "subscriber lost during replay");
                let _ = self.deregister(&sub.id);
                return;
            }
        }

        loop {
            tokio::select! {
                // Eviction, or hub shutdown via the parent token.
                () = sub.token.cancelled() => break,
                () = peer_closed.cancelled() => break,
                message = sub.rx.recv() => match message {
                    Some(line) => {
                        if !write_or_cancelled(&mut sink, &line, &sub.token, &peer_closed)
                            .await
                        {
                            break;
                        }
                    }
                    None => break,
                },
            }
        }

        let _ = self.deregister(&sub.id);
    }
}

/// Deliver one line, abandoning the write if the subscriber is evicted or
/// the peer goes away first. Returns whether delivery may continue.
async fn write_or_cancelled<S: SubscriberSink>(
    sink: &mut S,
    line: &str,
    token: &CancellationToken,
    peer_closed: &CancellationToken,
) -> bool {
    tokio::select! {
        () = token.cancelled() => false,
        () = peer_closed.cancelled() => false,
        result = sink.send_line(line) => result.is_ok(),
    }
}

//! Bidirectional line relay over one duplex byte stream.

use std::sync::Arc;

use fanline_core::{CloseState, MessageSink, RelayError};
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Relays lines between a remote byte stream and a [`MessageSink`].
///
/// [`run`](LineRelay::run) drives two loops until both finish: a read loop
/// that turns inbound bytes into per-line `on_message` calls, and a write
/// loop that drains the send queue into the stream. Either loop ending —
/// EOF, I/O error, cancellation, or [`close`](LineRelay::close) — tears the
/// other down.
pub struct LineRelay {
    send_tx: Mutex<Option<mpsc::Sender<String>>>,
    close_state: CloseState,
    close_token: CancellationToken,
}

impl LineRelay {
    /// A relay that has not been started yet.
    pub fn new() -> Self {
        Self {
            send_tx: Mutex::new(None),
            close_state: CloseState::new(),
            close_token: CancellationToken::new(),
        }
    }

    /// Run both relay loops until the stream ends, an I/O error occurs, or
    /// `cancel` / [`close`](LineRelay::close) fires.
    ///
    /// Returns the first failure from either loop; clean EOF and clean
    /// cancellation are both `Ok`.
    pub async fn run<R, W>(
        &self,
        reader: R,
        writer: W,
        sink: Arc<dyn MessageSink>,
        cancel: CancellationToken,
    ) -> Result<(), RelayError>
    where
        R: AsyncRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send,
    {
        // The send queue holds at most one message: a sender suspends until
        // the write loop takes its message, which is the backpressure the
        // command path wants (distinct from the hub's never-block fan-out).
        let (tx, rx) = mpsc::channel::<String>(1);
        *self.send_tx.lock() = Some(tx);

        // Cancelled by whichever loop finishes first.
        let teardown = CancellationToken::new();

        let read_fut = async {
            let result = read_loop(reader, sink.as_ref(), &cancel, &self.close_token, &teardown).await;
            teardown.cancel();
            result
        };
        let write_fut = async {
            let result = write_loop(writer, rx, &cancel, &self.close_token, &teardown).await;
            teardown.cancel();
            result
        };

        let (read_result, write_result) = tokio::join!(read_fut, write_fut);
        self.close_state.finish_close();
        debug!(
            read_ok = read_result.is_ok(),
            write_ok = write_result.is_ok(),
            "relay loops finished"
        );

        read_result.and(write_result)
    }

    /// Enqueue an outbound message, suspending until the write loop accepts
    /// it. Bytes are written verbatim; include a trailing delimiter if the
    /// remote side expects one.
    pub async fn send(&self, message: impl Into<String>) -> Result<(), RelayError> {
        let tx = self
            .send_tx
            .lock()
            .clone()
            .ok_or(RelayError::NotInitialized)?;
        tx.send(message.into())
            .await
            .map_err(|_| RelayError::Closed)
    }

    /// Signal the relay to stop and close its stream.
    ///
    /// Fire-once: only the first call transitions the relay toward closed;
    /// repeated or concurrent calls are no-ops.
    pub fn close(&self) {
        if self.close_state.begin_close() {
            self.close_token.cancel();
        }
    }

    /// Whether [`close`](LineRelay::close) has been invoked or the relay
    /// has finished running.
    pub fn is_closing(&self) -> bool {
        self.close_state.is_closing() || self.close_token.is_cancelled()
    }
}

impl Default for LineRelay {
    fn default() -> Self {
        Self::new()
    }
}

/// Read newline-delimited lines and hand each to the sink, until EOF, a
/// read error, or any stop signal.
async fn read_loop<R>(
    reader: R,
    sink: &dyn MessageSink,
    cancel: &CancellationToken,
    close: &CancellationToken,
    teardown: &CancellationToken,
) -> Result<(), RelayError>
where
    R: AsyncRead + Unpin + Send,
{
    let mut lines = BufReader::new(reader).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => sink.on_message(line),
                // EOF is a clean terminal condition, not an error.
                Ok(None) => return Ok(()),
                Err(err) => return Err(RelayError::Transport(err)),
            },
            () = cancel.cancelled() => return Ok(()),
            () = close.cancelled() => return Ok(()),
            () = teardown.cancelled() => return Ok(()),
        }
    }
}

/// Drain the send queue into the stream; on any stop signal, shut the
/// write half down.
async fn write_loop<W>(
    mut writer: W,
    mut rx: mpsc::Receiver<String>,
    cancel: &CancellationToken,
    close: &CancellationToken,
    teardown: &CancellationToken,
) -> Result<(), RelayError>
where
    W: AsyncWrite + Unpin + Send,
{
    loop {
        tokio::select! {
            message = rx.recv() => match message {
                Some(message) => writer.write_all(message.as_bytes()).await?,
                None => return Ok(()),
            },
            () = cancel.cancelled() => break,
            () = close.cancelled() => break,
            () = teardown.cancelled() => break,
        }
    }
    writer.shutdown().await?;
    Ok(())
}

//! Remote transport seam.
//!
//! The relay core only ever sees opaque duplex byte halves; how the
//! connection is established (and authenticated) lives behind
//! [`RemoteTransport`]. [`TcpTransport`] is the shipped implementation; an
//! SSH transport would plug in at the same seam.

use async_trait::async_trait;
use fanline_core::RelayError;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::info;

/// Opaque read half of a remote connection.
pub type RemoteReader = Box<dyn AsyncRead + Send + Unpin>;
/// Opaque write half of a remote connection.
pub type RemoteWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Establishes the upstream duplex connection the relay runs over.
#[async_trait]
pub trait RemoteTransport: Send + Sync {
    /// Connect and return the stream halves.
    async fn connect(&self) -> Result<(RemoteReader, RemoteWriter), RelayError>;
}

/// Plain TCP transport to a line-oriented interactive host.
///
/// If an identity is configured it is announced as the first outbound line,
/// so hosts that prompt for a name on join see the bot's login identity.
pub struct TcpTransport {
    addr: String,
    identity: Option<String>,
}

impl TcpTransport {
    /// Transport dialing `addr`, announcing `identity` on connect when set.
    pub fn new(addr: impl Into<String>, identity: Option<String>) -> Self {
        Self {
            addr: addr.into(),
            identity,
        }
    }

    /// The remote address this transport dials.
    pub fn addr(&self) -> &str {
        &self.addr
    }
}

#[async_trait]
impl RemoteTransport for TcpTransport {
    async fn connect(&self) -> Result<(RemoteReader, RemoteWriter), RelayError> {
        let stream = TcpStream::connect(&self.addr).await?;
        let (reader, mut writer) = stream.into_split();

        if let Some(identity) = &self.identity {
            writer.write_all(format!("{identity}\n").as_bytes()).await?;
        }
        info!(addr = %self.addr, "connected to remote host");

        Ok((Box::new(reader), Box::new(writer)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, BufReader};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn connect_failure_is_transport_error() {
        // Bind then drop to get a port with nothing listening.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = TcpTransport::new(addr.to_string(), None);
        let result = transport.connect().await;
        assert!(matches!(result, Err(RelayError::Transport(_))));
    }

    #[tokio::test]
    async fn identity_announced_on_connect() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let accept = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut lines = BufReader::new(stream).lines();
            lines.next_line().await.unwrap()
        });

        let transport = TcpTransport::new(addr.to_string(), Some("relay-bot".into()));
        let (_reader, _writer) = transport.connect().await.unwrap();

        let first_line = accept.await.unwrap();
        assert_eq!(first_line.as_deref(), Some("relay-bot"));
    }

    #[tokio::test]
    async fn no_identity_sends_nothing_on_connect() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let accept = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut lines = BufReader::new(stream).lines();
            // Peer closes without writing, so the first read is EOF.
            lines.next_line().await.unwrap()
        });

        let transport = TcpTransport::new(addr.to_string(), None);
        let (reader, writer) = transport.connect().await.unwrap();
        drop(reader);
        drop(writer);

        let first_line = accept.await.unwrap();
        assert_eq!(first_line, None);
    }

    #[test]
    fn addr_accessor() {
        let transport = TcpTransport::new("example.org:2022", None);
        assert_eq!(transport.addr(), "example.org:2022");
    }
}

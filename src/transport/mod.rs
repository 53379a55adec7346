//! Line-agnostic TCP plumbing: accepting and opening connections, buffered
//! reads and queued writes, all reported through an [`EventHandler`].

mod connection;

pub use connection::{Connection, ConnectionId, EventHandler};
pub(crate) use connection::lock;

use anyhow::Context;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

fn is_transient_accept_error(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::TimedOut
    )
}

/// Binds `addr` and hands every accepted connection to `handler`.
///
/// Returns the bound address once listening; accepting continues on a
/// background task until the listener hits a non-transient error.
pub async fn listen(addr: impl ToSocketAddrs, handler: EventHandler) -> anyhow::Result<SocketAddr> {
    let listener = TcpListener::bind(addr)
        .await
        .context("failed to bind game listener")?;
    let local = listener
        .local_addr()
        .context("failed to read listener address")?;

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    let connection = Connection::from_stream(stream, Arc::clone(&handler));
                    tracing::debug!(connection_id = connection.id(), %peer, "accepted connection");
                    connection.fire();
                }
                Err(error) if is_transient_accept_error(&error) => {
                    tracing::warn!(?error, "accept failed");
                    Connection::failed(format!("accept failed: {error}"), Arc::clone(&handler)).fire();
                }
                Err(error) => {
                    tracing::error!(?error, "listener stopped accepting");
                    return;
                }
            }
        }
    });

    Ok(local)
}

/// Opens a connection to `host:port`, giving up after [`CONNECT_TIMEOUT`].
///
/// `handler` fires exactly once with either a ready handle or one carrying
/// the failure; the same handle is returned.
pub async fn connect(host: &str, port: u16, handler: EventHandler) -> Arc<Connection> {
    let attempt = tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect((host, port))).await;
    let connection = match attempt {
        Ok(Ok(stream)) => Connection::from_stream(stream, handler),
        Ok(Err(error)) => {
            tracing::warn!(host, port, ?error, "connect failed");
            Connection::failed(format!("connect to {host}:{port} failed: {error}"), handler)
        }
        Err(_) => {
            tracing::warn!(host, port, "connect timed out");
            Connection::failed(format!("connect to {host}:{port} timed out"), handler)
        }
    };
    connection.fire();
    connection
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::drain_lines;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(5);

    #[derive(Debug, PartialEq)]
    enum Seen {
        Line(String),
        Error(String),
    }

    fn line_collector(events: mpsc::UnboundedSender<Seen>) -> EventHandler {
        Arc::new(move |connection: &Arc<Connection>| {
            if let Some(message) = connection.error_message() {
                let _ = events.send(Seen::Error(message));
                return;
            }
            for line in connection.with_buffer(drain_lines) {
                let _ = events.send(Seen::Line(line));
            }
            connection.receive();
        })
    }

    #[tokio::test]
    async fn lines_split_across_reads_are_delivered_whole() {
        let (events, mut seen) = mpsc::unbounded_channel();
        let addr = listen("127.0.0.1:0", line_collector(events)).await.expect("listen");

        let mut client = TcpStream::connect(addr).await.expect("connect");
        client.write_all(b"hello\nwor").await.expect("write");
        client.flush().await.expect("flush");
        tokio::time::sleep(Duration::from_millis(20)).await;
        client.write_all(b"ld\n").await.expect("write");

        let first = timeout(WAIT, seen.recv()).await.expect("timely").expect("event");
        let second = timeout(WAIT, seen.recv()).await.expect("timely").expect("event");
        assert_eq!(first, Seen::Line("hello".to_string()));
        assert_eq!(second, Seen::Line("world".to_string()));
    }

    #[tokio::test]
    async fn peer_close_is_reported_once() {
        let (events, mut seen) = mpsc::unbounded_channel();
        let addr = listen("127.0.0.1:0", line_collector(events)).await.expect("listen");

        let client = TcpStream::connect(addr).await.expect("connect");
        drop(client);

        let event = timeout(WAIT, seen.recv()).await.expect("timely").expect("event");
        assert!(matches!(event, Seen::Error(_)));
        assert!(timeout(Duration::from_millis(200), seen.recv()).await.is_err());
    }

    #[tokio::test]
    async fn server_send_reaches_client() {
        let (handles, mut accepted) = mpsc::unbounded_channel();
        let handler: EventHandler = Arc::new(move |connection: &Arc<Connection>| {
            let _ = handles.send(Arc::clone(connection));
        });
        let addr = listen("127.0.0.1:0", handler).await.expect("listen");

        let mut client = TcpStream::connect(addr).await.expect("connect");
        let connection = timeout(WAIT, accepted.recv()).await.expect("timely").expect("handle");
        assert!(connection.send("12\n"));
        assert!(connection.send("2000\n"));

        let mut received = Vec::new();
        while received.len() < 8 {
            let mut chunk = [0u8; 16];
            let read = timeout(WAIT, client.read(&mut chunk))
                .await
                .expect("timely")
                .expect("read");
            assert!(read > 0);
            received.extend_from_slice(&chunk[..read]);
        }
        assert_eq!(received, b"12\n2000\n".to_vec());

        connection.close();
        connection.close();
        assert!(!connection.send("late\n"));
    }

    #[tokio::test]
    async fn refused_connect_fires_error_exactly_once() {
        let unused = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = unused.local_addr().expect("addr").port();
        drop(unused);

        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let handler: EventHandler = Arc::new(move |connection: &Arc<Connection>| {
            assert!(connection.has_error());
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let connection = connect("127.0.0.1", port, handler).await;

        assert!(connection.has_error());
        assert!(!connection.send("anything\n"));
        connection.receive();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn bind_conflict_is_an_error() {
        let taken = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = taken.local_addr().expect("addr");
        let handler: EventHandler = Arc::new(|_: &Arc<Connection>| {});

        assert!(listen(addr, handler).await.is_err());
    }
}

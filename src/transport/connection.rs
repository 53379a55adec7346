use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex as StdMutex;
use std::sync::{Arc, MutexGuard, PoisonError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex, Notify};

pub type ConnectionId = u32;

/// Invoked on accept/connect, on every batch of received bytes and on error.
/// Deliveries for one connection never overlap.
pub type EventHandler = Arc<dyn Fn(&Arc<Connection>) + Send + Sync>;

const READ_CHUNK_BYTES: usize = 4096;

static NEXT_CONNECTION_ID: AtomicU32 = AtomicU32::new(1);

pub(crate) fn lock<T>(mutex: &StdMutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct Connection {
    id: ConnectionId,
    peer: Option<SocketAddr>,
    reader: Mutex<Option<OwnedReadHalf>>,
    outbound: StdMutex<Option<mpsc::UnboundedSender<Vec<u8>>>>,
    pending: StdMutex<Vec<u8>>,
    error: StdMutex<Option<String>>,
    closed: AtomicBool,
    cancel_read: Notify,
    handler: StdMutex<EventHandler>,
    delivery: StdMutex<()>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("peer", &self.peer)
            .field("closed", &self.is_closed())
            .field("error", &self.error_message())
            .finish()
    }
}

impl Connection {
    fn next_id() -> ConnectionId {
        NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed)
    }

    /// Wraps a connected socket and starts its writer task.
    pub(crate) fn from_stream(stream: TcpStream, handler: EventHandler) -> Arc<Self> {
        if let Err(error) = stream.set_nodelay(true) {
            tracing::warn!(?error, "failed to enable TCP_NODELAY");
        }
        let peer = stream.peer_addr().ok();
        let (reader, mut writer) = stream.into_split();
        let (sender, mut receiver) = mpsc::unbounded_channel::<Vec<u8>>();

        let connection = Arc::new(Self {
            id: Self::next_id(),
            peer,
            reader: Mutex::new(Some(reader)),
            outbound: StdMutex::new(Some(sender)),
            pending: StdMutex::new(Vec::new()),
            error: StdMutex::new(None),
            closed: AtomicBool::new(false),
            cancel_read: Notify::new(),
            handler: StdMutex::new(handler),
            delivery: StdMutex::new(()),
        });

        let weak = Arc::downgrade(&connection);
        tokio::spawn(async move {
            while let Some(payload) = receiver.recv().await {
                if let Err(error) = writer.write_all(&payload).await {
                    if let Some(connection) = weak.upgrade() {
                        tracing::warn!(connection_id = connection.id, ?error, "send failed");
                        connection.mark_failed(format!("send failed: {error}"));
                    }
                    return;
                }
            }
            let _ = writer.shutdown().await;
        });

        connection
    }

    /// A handle that never connected. It only exists to carry `message` to the handler.
    pub(crate) fn failed(message: String, handler: EventHandler) -> Arc<Self> {
        Arc::new(Self {
            id: Self::next_id(),
            peer: None,
            reader: Mutex::new(None),
            outbound: StdMutex::new(None),
            pending: StdMutex::new(Vec::new()),
            error: StdMutex::new(Some(message)),
            closed: AtomicBool::new(true),
            cancel_read: Notify::new(),
            handler: StdMutex::new(handler),
            delivery: StdMutex::new(()),
        })
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    pub fn has_error(&self) -> bool {
        lock(&self.error).is_some()
    }

    pub fn error_message(&self) -> Option<String> {
        lock(&self.error).clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn set_handler(&self, handler: EventHandler) {
        *lock(&self.handler) = handler;
    }

    /// Runs `f` against the bytes received so far but not yet consumed.
    pub fn with_buffer<R>(&self, f: impl FnOnce(&mut Vec<u8>) -> R) -> R {
        let mut pending = lock(&self.pending);
        f(&mut pending)
    }

    /// Queues `text` for delivery. `false` means the handle is closed.
    pub fn send(&self, text: &str) -> bool {
        if self.is_closed() {
            return false;
        }
        let queued = match lock(&self.outbound).as_ref() {
            Some(sender) => sender.send(text.as_bytes().to_vec()).is_ok(),
            None => false,
        };
        if !queued {
            self.close();
        }
        queued
    }

    /// Arms a single read. Its outcome, data or error, is delivered to the handler.
    pub fn receive(self: &Arc<Self>) {
        if self.is_closed() {
            return;
        }
        let connection = Arc::clone(self);
        tokio::spawn(async move {
            let mut reader = connection.reader.lock().await;
            let Some(stream) = reader.as_mut() else { return };
            let mut chunk = [0u8; READ_CHUNK_BYTES];
            let outcome = tokio::select! {
                result = stream.read(&mut chunk) => Some(result),
                _ = connection.cancel_read.notified() => None,
            };
            match outcome {
                None => {
                    reader.take();
                }
                Some(Ok(0)) => {
                    reader.take();
                    drop(reader);
                    connection.mark_failed("connection closed by peer".to_string());
                    connection.fire();
                }
                Some(Ok(read)) => {
                    drop(reader);
                    lock(&connection.pending).extend_from_slice(&chunk[..read]);
                    connection.fire();
                }
                Some(Err(error)) => {
                    reader.take();
                    drop(reader);
                    connection.mark_failed(format!("receive failed: {error}"));
                    connection.fire();
                }
            }
        });
    }

    /// Stops outbound delivery and cancels any armed read. Safe to call repeatedly.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        lock(&self.outbound).take();
        self.cancel_read.notify_one();
    }

    fn mark_failed(&self, message: String) {
        {
            let mut error = lock(&self.error);
            if error.is_none() {
                *error = Some(message);
            }
        }
        self.closed.store(true, Ordering::Release);
        lock(&self.outbound).take();
        self.cancel_read.notify_one();
    }

    pub(crate) fn fire(self: &Arc<Self>) {
        let _delivery = lock(&self.delivery);
        let handler = Arc::clone(&lock(&self.handler));
        handler(self);
    }
}

use crate::game::types::EntityId;
use crate::transport::Connection;
use std::sync::Arc;

/// A connection that completed the handshake and now receives broadcasts.
#[derive(Debug)]
pub(crate) struct SessionEntry {
    pub(crate) connection: Arc<Connection>,
    pub(crate) snake_id: EntityId,
    pub(crate) walls_sent: bool,
}

impl SessionEntry {
    pub(crate) fn new(connection: Arc<Connection>, snake_id: EntityId) -> Self {
        Self {
            connection,
            snake_id,
            walls_sent: false,
        }
    }

    /// Sends one frame, followed by the wall records the first time through.
    pub(crate) fn deliver(&mut self, frame: &str, walls: &str) -> bool {
        let sent = if self.walls_sent || walls.is_empty() {
            self.connection.send(frame)
        } else {
            let mut first = String::with_capacity(frame.len() + walls.len());
            first.push_str(frame);
            first.push_str(walls);
            self.connection.send(&first)
        };
        if sent {
            self.walls_sent = true;
        }
        sent
    }
}

//! Headless client for the arena protocol.
//!
//! [`GameClient::connect`] performs the handshake and keeps a decoded copy of
//! the world up to date; consumers learn about changes through the returned
//! event channel and read state through [`GameClient::snapshot`].

use crate::game::types::{Direction, EntityId, Wall};
use crate::protocol::{decode_record, drain_lines, encode_line, MoveCommand, PowerupRecord, Record, SnakeRecord};
use crate::shared::names::validate_player_name;
use crate::transport::{self, lock, Connection, EventHandler};
use anyhow::Context;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    Joined { id: EntityId, world_size: u32 },
    WorldUpdated,
    Disconnected { reason: String },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientWorld {
    pub player_id: Option<EntityId>,
    pub world_size: Option<u32>,
    pub snakes: HashMap<EntityId, SnakeRecord>,
    pub powerups: HashMap<EntityId, PowerupRecord>,
    pub walls: HashMap<EntityId, Wall>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Applied {
    joined: bool,
    changed: bool,
}

impl ClientWorld {
    pub fn player(&self) -> Option<&SnakeRecord> {
        self.player_id.and_then(|id| self.snakes.get(&id))
    }

    fn apply(&mut self, record: Record) -> Applied {
        let mut applied = Applied::default();
        match record {
            Record::Integer(value) => {
                let Ok(value) = u32::try_from(value) else { return applied };
                if self.player_id.is_none() {
                    self.player_id = Some(value);
                } else if self.world_size.is_none() {
                    self.world_size = Some(value);
                    applied.joined = true;
                }
            }
            Record::Wall(wall) => {
                self.walls.insert(wall.id, wall);
                applied.changed = true;
            }
            Record::Snake(snake) => {
                if snake.dc {
                    self.snakes.remove(&snake.snake);
                } else {
                    self.snakes.insert(snake.snake, snake);
                }
                applied.changed = true;
            }
            Record::Powerup(powerup) => {
                if powerup.died {
                    self.powerups.remove(&powerup.power);
                } else {
                    self.powerups.insert(powerup.power, powerup);
                }
                applied.changed = true;
            }
            Record::Move(_) => {}
        }
        applied
    }
}

#[derive(Debug)]
pub struct GameClient {
    connection: Arc<Connection>,
    world: Arc<StdMutex<ClientWorld>>,
}

fn client_handler(
    world: Arc<StdMutex<ClientWorld>>,
    events: mpsc::UnboundedSender<ClientEvent>,
) -> EventHandler {
    Arc::new(move |connection: &Arc<Connection>| {
        if let Some(reason) = connection.error_message() {
            let _ = events.send(ClientEvent::Disconnected { reason });
            return;
        }
        let lines = connection.with_buffer(drain_lines);
        let mut joined = None;
        let mut changed = false;
        {
            let mut world = lock(&world);
            for record in lines.iter().filter_map(|line| decode_record(line)) {
                let applied = world.apply(record);
                if applied.joined {
                    joined = world.player_id.zip(world.world_size);
                }
                changed |= applied.changed;
            }
        }
        if let Some((id, world_size)) = joined {
            let _ = events.send(ClientEvent::Joined { id, world_size });
        }
        if changed {
            let _ = events.send(ClientEvent::WorldUpdated);
        }
        connection.receive();
    })
}

impl GameClient {
    /// Connects, sends `name` and starts decoding updates.
    pub async fn connect(
        host: &str,
        port: u16,
        name: &str,
    ) -> anyhow::Result<(Self, mpsc::UnboundedReceiver<ClientEvent>)> {
        let name = validate_player_name(name)?;
        let world = Arc::new(StdMutex::new(ClientWorld::default()));
        let (events, receiver) = mpsc::unbounded_channel();

        let connection = transport::connect(host, port, client_handler(Arc::clone(&world), events)).await;
        if let Some(reason) = connection.error_message() {
            return Err(anyhow::anyhow!(reason)).context("failed to reach game server");
        }
        if !connection.send(&format!("{name}\n")) {
            anyhow::bail!("connection closed before the player name was sent");
        }
        tracing::info!(host, port, name, "connected to game server");
        Ok((Self { connection, world }, receiver))
    }

    /// A consistent copy of everything decoded so far.
    pub fn snapshot(&self) -> ClientWorld {
        lock(&self.world).clone()
    }

    pub fn send_move(&self, direction: Direction) -> bool {
        match encode_line(&MoveCommand { moving: direction }) {
            Ok(line) => self.connection.send(&line),
            Err(error) => {
                tracing::warn!(?error, "failed to encode move");
                false
            }
        }
    }

    pub fn close(&self) {
        self.connection.close();
    }
}

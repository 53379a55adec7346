use super::constants::STATS_LOG_INTERVAL_TICKS;
use super::simulation::{self, seed_powerups, spawn_snake, TickReport};
use super::types::{EntityId, Wall};
use super::world::World;
use crate::config::GameSettings;
use crate::protocol::{decode_record, drain_lines, Encoder, PowerupRecord, Record, SnakeRecord};
use crate::shared::names::{sanitize_player_name, DEFAULT_PLAYER_NAME};
use crate::transport::{lock, Connection, ConnectionId, EventHandler};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use tokio::time::MissedTickBehavior;

mod session;

use session::SessionEntry;

/// Owns the world, the connected sessions and the game loop.
#[derive(Debug)]
pub struct Room {
  world: Arc<World>,
  sessions: StdMutex<HashMap<ConnectionId, SessionEntry>>,
  pending_disconnects: StdMutex<HashSet<ConnectionId>>,
  rng: StdMutex<StdRng>,
  walls_payload: String,
  ticks: AtomicU64,
}

fn encode_walls(walls: &[Wall]) -> String {
  let mut encoder = Encoder::with_capacity(walls.len() * 64);
  for wall in walls {
    if let Err(error) = encoder.push(wall) {
      tracing::warn!(?error, wall_id = wall.id, "failed to encode wall");
    }
  }
  encoder.into_string()
}

impl Room {
  pub fn new(settings: &GameSettings) -> Self {
    let rng = match settings.seed {
      Some(seed) => StdRng::seed_from_u64(seed),
      None => StdRng::from_entropy(),
    };
    let world = World::new(settings.world_settings(), settings.walls.iter().copied());
    Self::with_world(world, rng)
  }

  pub(crate) fn with_world(world: World, mut rng: StdRng) -> Self {
    seed_powerups(&world, &mut rng);
    let walls_payload = encode_walls(&world.snapshot().walls);
    Self {
      world: Arc::new(world),
      sessions: StdMutex::new(HashMap::new()),
      pending_disconnects: StdMutex::new(HashSet::new()),
      rng: StdMutex::new(rng),
      walls_payload,
      ticks: AtomicU64::new(0),
    }
  }

  pub fn world(&self) -> &Arc<World> {
    &self.world
  }

  pub fn session_count(&self) -> usize {
    lock(&self.sessions).len()
  }

  pub fn pending_disconnect_count(&self) -> usize {
    lock(&self.pending_disconnects).len()
  }

  /// Handler for freshly accepted connections: waits for the player name.
  pub fn accept_handler(self: &Arc<Self>) -> EventHandler {
    let room = Arc::clone(self);
    Arc::new(move |connection: &Arc<Connection>| room.on_accept(connection))
  }

  fn on_accept(self: &Arc<Self>, connection: &Arc<Connection>) {
    if let Some(error) = connection.error_message() {
      tracing::warn!(%error, "dropping failed connection");
      return;
    }
    tracing::info!(connection_id = connection.id(), peer = ?connection.peer(), "client connected");
    let room = Arc::clone(self);
    connection.set_handler(Arc::new(move |connection: &Arc<Connection>| {
      room.on_handshake_data(connection)
    }));
    connection.receive();
  }

  fn on_handshake_data(self: &Arc<Self>, connection: &Arc<Connection>) {
    if connection.has_error() {
      tracing::info!(connection_id = connection.id(), "client left before handshake");
      connection.close();
      return;
    }
    let lines = connection.with_buffer(drain_lines);
    let mut lines = lines.into_iter();
    let Some(name) = lines.next() else {
      connection.receive();
      return;
    };
    let Some(snake_id) = self.handshake(connection, &name) else { return };

    let room = Arc::clone(self);
    connection.set_handler(Arc::new(move |connection: &Arc<Connection>| {
      room.on_session_data(connection, snake_id)
    }));
    for line in lines {
      self.apply_command(snake_id, &line);
    }
    connection.receive();
  }

  /// Replies with the player's id and the world size, then registers the
  /// player. Both happen under the session lock so no broadcast can come first.
  fn handshake(&self, connection: &Arc<Connection>, raw_name: &str) -> Option<EntityId> {
    let name = sanitize_player_name(raw_name, DEFAULT_PLAYER_NAME);
    let snake_id = connection.id();

    let mut sessions = lock(&self.sessions);
    let mut reply = Encoder::with_capacity(24);
    reply.push_integer(i64::from(snake_id));
    reply.push_integer(i64::from(self.world.settings.size));
    if !connection.send(&reply.into_string()) {
      tracing::warn!(connection_id = snake_id, "handshake reply failed");
      connection.close();
      return None;
    }

    let snake = {
      let mut rng = lock(&self.rng);
      spawn_snake(&self.world, &mut *rng, snake_id, name.clone())
    };
    if !self.world.insert_snake(snake) {
      tracing::warn!(snake_id, "snake id already in use");
      connection.close();
      return None;
    }
    sessions.insert(snake_id, SessionEntry::new(Arc::clone(connection), snake_id));
    tracing::info!(snake_id, %name, "player joined");
    Some(snake_id)
  }

  fn on_session_data(&self, connection: &Arc<Connection>, snake_id: EntityId) {
    if let Some(error) = connection.error_message() {
      tracing::info!(snake_id, %error, "client connection lost");
      self.request_disconnect(connection.id());
      return;
    }
    for line in connection.with_buffer(drain_lines) {
      self.apply_command(snake_id, &line);
    }
    connection.receive();
  }

  fn apply_command(&self, snake_id: EntityId, line: &str) {
    match decode_record(line) {
      Some(Record::Move(command)) => {
        self.world.change_direction(snake_id, command.moving);
      }
      Some(Record::Integer(_) | Record::Wall(_) | Record::Snake(_) | Record::Powerup(_)) => {
        tracing::trace!(snake_id, line, "ignoring non-command record from client");
      }
      None => {}
    }
  }

  fn request_disconnect(&self, connection_id: ConnectionId) {
    lock(&self.pending_disconnects).insert(connection_id);
  }

  /// Closes and unregisters every session queued for removal, flagging its snake.
  fn flush_disconnects(&self) -> usize {
    let pending = std::mem::take(&mut *lock(&self.pending_disconnects));
    if pending.is_empty() {
      return 0;
    }
    let mut sessions = lock(&self.sessions);
    let mut removed = 0;
    for connection_id in pending {
      let Some(entry) = sessions.remove(&connection_id) else { continue };
      entry.connection.close();
      self.world.mark_disconnected(entry.snake_id);
      tracing::info!(snake_id = entry.snake_id, "player disconnected");
      removed += 1;
    }
    removed
  }

  /// Serializes every snake, then every visible powerup, one line each.
  fn encode_frame(&self) -> String {
    let mut encoder = Encoder::with_capacity(self.world.snakes.len() * 256);
    for entry in self.world.snakes.iter() {
      let record = SnakeRecord::from(entry.value());
      if let Err(error) = encoder.push(&record) {
        tracing::warn!(?error, snake_id = record.snake, "failed to encode snake");
      }
    }
    for entry in self.world.powerups.iter() {
      let powerup = entry.value();
      if !powerup.is_active() && !powerup.died {
        continue;
      }
      if let Err(error) = encoder.push(&PowerupRecord::from(powerup)) {
        tracing::warn!(?error, powerup_id = powerup.id, "failed to encode powerup");
      }
    }
    encoder.into_string()
  }

  fn broadcast(&self) {
    let frame = self.encode_frame();
    let mut failed = Vec::new();
    {
      let mut sessions = lock(&self.sessions);
      for (connection_id, entry) in sessions.iter_mut() {
        if !entry.deliver(&frame, &self.walls_payload) {
          failed.push(*connection_id);
        }
      }
    }
    if !failed.is_empty() {
      tracing::debug!(count = failed.len(), "broadcast failed for some sessions");
      lock(&self.pending_disconnects).extend(failed);
    }
  }

  /// One frame: retire disconnected sessions, broadcast, drop the snakes that
  /// were just announced as gone, then simulate.
  ///
  /// Removal follows the broadcast so a departing snake goes out exactly once
  /// with `dc` set.
  pub fn tick(&self) -> TickReport {
    self.flush_disconnects();
    self.broadcast();
    for snake_id in self.world.remove_disconnected() {
      tracing::debug!(snake_id, "removed disconnected snake");
    }
    let report = {
      let mut rng = lock(&self.rng);
      simulation::advance(&self.world, &mut *rng)
    };

    let tick = self.ticks.fetch_add(1, Ordering::Relaxed) + 1;
    if tick % STATS_LOG_INTERVAL_TICKS == 0 {
      tracing::debug!(
        tick,
        sessions = self.session_count(),
        snakes = self.world.snakes.len(),
        "tick stats"
      );
    }
    report
  }

  /// Ticks forever at the configured frame interval.
  pub async fn run(self: Arc<Self>) {
    let mut interval = tokio::time::interval(self.world.settings.frame_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await;
    loop {
      interval.tick().await;
      self.tick();
    }
  }
}

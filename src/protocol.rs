use crate::game::types::{Direction, EntityId, Powerup, Snake, Vector2, Wall};
use serde::{Deserialize, Serialize};

pub const LINE_TERMINATOR: u8 = b'\n';

/// Removes every complete line from `buffer` and returns them in order.
///
/// Framing works on raw bytes so a multi-byte character split across reads
/// stays intact in the leftover fragment. A trailing `\r` is stripped.
pub fn drain_lines(buffer: &mut Vec<u8>) -> Vec<String> {
  let Some(last) = buffer.iter().rposition(|byte| *byte == LINE_TERMINATOR) else {
    return Vec::new();
  };
  let complete: Vec<u8> = buffer.drain(..=last).collect();
  complete[..last]
    .split(|byte| *byte == LINE_TERMINATOR)
    .map(|line| {
      let line = line.strip_suffix(b"\r").unwrap_or(line);
      String::from_utf8_lossy(line).into_owned()
    })
    .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnakeRecord {
  pub snake: EntityId,
  pub name: String,
  pub body: Vec<Vector2>,
  pub dir: Vector2,
  pub score: u32,
  #[serde(default)]
  pub died: bool,
  #[serde(default)]
  pub alive: bool,
  #[serde(default)]
  pub dc: bool,
  #[serde(default)]
  pub join: bool,
}

impl From<&Snake> for SnakeRecord {
  fn from(snake: &Snake) -> Self {
    Self {
      snake: snake.id,
      name: snake.name.clone(),
      body: snake.body.clone(),
      dir: snake.dir.unit(),
      score: snake.score,
      died: snake.died,
      alive: snake.alive,
      dc: snake.dc,
      join: snake.join,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerupRecord {
  pub power: EntityId,
  pub loc: Vector2,
  #[serde(default)]
  pub died: bool,
}

impl From<&Powerup> for PowerupRecord {
  fn from(powerup: &Powerup) -> Self {
    Self {
      power: powerup.id,
      loc: powerup.loc,
      died: powerup.died,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveCommand {
  pub moving: Direction,
}

/// Every record kind that can appear on a line. Variants are tried in order;
/// each entity kind is told apart by its identity field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Record {
  Integer(i64),
  Wall(Wall),
  Snake(SnakeRecord),
  Powerup(PowerupRecord),
  Move(MoveCommand),
}

pub fn decode_record(line: &str) -> Option<Record> {
  match serde_json::from_str::<Record>(line.trim()) {
    Ok(record) => Some(record),
    Err(error) => {
      tracing::trace!(%error, line, "dropping unrecognized line");
      None
    }
  }
}

pub fn encode_line<T: Serialize>(record: &T) -> serde_json::Result<String> {
  let mut line = serde_json::to_string(record)?;
  line.push(LINE_TERMINATOR as char);
  Ok(line)
}

/// Accumulates newline-terminated records into one outbound payload.
pub struct Encoder {
  buffer: String,
}

impl Encoder {
  pub fn with_capacity(capacity: usize) -> Self {
    Self {
      buffer: String::with_capacity(capacity),
    }
  }

  pub fn push<T: Serialize>(&mut self, record: &T) -> serde_json::Result<()> {
    let line = serde_json::to_string(record)?;
    self.buffer.push_str(&line);
    self.buffer.push(LINE_TERMINATOR as char);
    Ok(())
  }

  pub fn push_integer(&mut self, value: i64) {
    self.buffer.push_str(&value.to_string());
    self.buffer.push(LINE_TERMINATOR as char);
  }

  pub fn into_string(self) -> String {
    self.buffer
  }
}

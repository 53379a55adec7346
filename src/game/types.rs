use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

pub type EntityId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector2 {
  #[serde(rename = "X")]
  pub x: f64,
  #[serde(rename = "Y")]
  pub y: f64,
}

impl Vector2 {
  pub const fn new(x: f64, y: f64) -> Self {
    Self { x, y }
  }
}

impl Add for Vector2 {
  type Output = Vector2;

  fn add(self, rhs: Vector2) -> Vector2 {
    Vector2 {
      x: self.x + rhs.x,
      y: self.y + rhs.y,
    }
  }
}

impl Sub for Vector2 {
  type Output = Vector2;

  fn sub(self, rhs: Vector2) -> Vector2 {
    Vector2 {
      x: self.x - rhs.x,
      y: self.y - rhs.y,
    }
  }
}

impl Mul<f64> for Vector2 {
  type Output = Vector2;

  fn mul(self, rhs: f64) -> Vector2 {
    Vector2 {
      x: self.x * rhs,
      y: self.y * rhs,
    }
  }
}

/// Screen-space cardinal heading; "up" is negative Y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
  Up,
  Down,
  Left,
  Right,
}

impl Direction {
  pub const ALL: [Direction; 4] = [
    Direction::Up,
    Direction::Down,
    Direction::Left,
    Direction::Right,
  ];

  pub fn unit(self) -> Vector2 {
    match self {
      Direction::Up => Vector2::new(0.0, -1.0),
      Direction::Down => Vector2::new(0.0, 1.0),
      Direction::Left => Vector2::new(-1.0, 0.0),
      Direction::Right => Vector2::new(1.0, 0.0),
    }
  }

  pub fn opposite(self) -> Direction {
    match self {
      Direction::Up => Direction::Down,
      Direction::Down => Direction::Up,
      Direction::Left => Direction::Right,
      Direction::Right => Direction::Left,
    }
  }

  /// Direction of a purely horizontal or vertical, non-zero delta.
  pub fn from_delta(delta: Vector2) -> Option<Direction> {
    match (delta.x, delta.y) {
      (x, y) if y == 0.0 && x > 0.0 => Some(Direction::Right),
      (x, y) if y == 0.0 && x < 0.0 => Some(Direction::Left),
      (x, y) if x == 0.0 && y > 0.0 => Some(Direction::Down),
      (x, y) if x == 0.0 && y < 0.0 => Some(Direction::Up),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnakeConfig {
  pub speed: f64,
  pub starting_length: f64,
  pub growth: f64,
}

#[derive(Debug, Clone)]
pub struct Snake {
  pub id: EntityId,
  pub name: String,
  pub body: Vec<Vector2>,
  pub dir: Direction,
  pub score: u32,
  pub died: bool,
  pub alive: bool,
  pub dc: bool,
  pub join: bool,
  pub config: SnakeConfig,
  pub respawn_timer: u32,
}

impl Snake {
  pub fn head(&self) -> Vector2 {
    self.body[self.body.len() - 1]
  }

  pub fn tail(&self) -> Vector2 {
    self.body[0]
  }

  pub fn target_length(&self) -> f64 {
    self.config.starting_length + self.score as f64 * self.config.growth
  }

  /// Applies a movement request unless it would reverse the snake into itself.
  pub fn change_direction(&mut self, requested: Direction) -> bool {
    if requested == self.dir.opposite() {
      return false;
    }
    self.dir = requested;
    true
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PowerupState {
  Active,
  Regenerating { frames_left: u32 },
}

#[derive(Debug, Clone)]
pub struct Powerup {
  pub id: EntityId,
  pub loc: Vector2,
  pub died: bool,
  pub state: PowerupState,
}

impl Powerup {
  pub fn is_active(&self) -> bool {
    matches!(self.state, PowerupState::Active)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wall {
  #[serde(rename = "wall")]
  pub id: EntityId,
  pub p1: Vector2,
  pub p2: Vector2,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn make_snake(dir: Direction) -> Snake {
    Snake {
      id: 1,
      name: "Test".to_string(),
      body: vec![Vector2::new(0.0, 0.0), Vector2::new(10.0, 0.0)],
      dir,
      score: 0,
      died: false,
      alive: true,
      dc: false,
      join: false,
      config: SnakeConfig {
        speed: 1.0,
        starting_length: 10.0,
        growth: 5.0,
      },
      respawn_timer: 0,
    }
  }

  #[test]
  fn reverse_request_is_rejected() {
    let mut snake = make_snake(Direction::Right);

    assert!(!snake.change_direction(Direction::Left));
    assert_eq!(snake.dir.unit(), Vector2::new(1.0, 0.0));

    assert!(snake.change_direction(Direction::Up));
    assert_eq!(snake.dir.unit(), Vector2::new(0.0, -1.0));
  }

  #[test]
  fn same_direction_request_is_accepted() {
    let mut snake = make_snake(Direction::Down);
    assert!(snake.change_direction(Direction::Down));
    assert_eq!(snake.dir, Direction::Down);
  }

  #[test]
  fn from_delta_requires_axis_alignment() {
    assert_eq!(
      Direction::from_delta(Vector2::new(3.0, 0.0)),
      Some(Direction::Right)
    );
    assert_eq!(
      Direction::from_delta(Vector2::new(0.0, -2.0)),
      Some(Direction::Up)
    );
    assert_eq!(Direction::from_delta(Vector2::new(1.0, 1.0)), None);
    assert_eq!(Direction::from_delta(Vector2::new(0.0, 0.0)), None);
  }

  #[test]
  fn target_length_grows_with_score() {
    let mut snake = make_snake(Direction::Right);
    snake.score = 3;
    assert_eq!(snake.target_length(), 25.0);
  }
}

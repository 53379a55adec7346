use crate::game::constants::{
  DEFAULT_MAX_POWERUPS, DEFAULT_MAX_POWERUP_DELAY, DEFAULT_MS_PER_FRAME, DEFAULT_PORT,
  DEFAULT_RESPAWN_RATE, DEFAULT_SNAKE_GROWTH, DEFAULT_SNAKE_SPEED, DEFAULT_SNAKE_STARTING_LENGTH,
  DEFAULT_WORLD_SIZE,
};
use crate::game::types::{SnakeConfig, Wall};
use crate::game::world::WorldSettings;
use anyhow::Context;
use serde::Deserialize;
use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};

pub const DEFAULT_SETTINGS_PATH: &str = "settings.json";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameSettings {
  pub world_size: u32,
  pub ms_per_frame: u64,
  pub respawn_rate: u32,
  pub snake_speed: f64,
  pub snake_starting_length: f64,
  pub snake_growth: f64,
  pub max_powerups: u32,
  pub max_powerup_delay: u32,
  pub seed: Option<u64>,
  pub walls: Vec<Wall>,
}

impl Default for GameSettings {
  fn default() -> Self {
    Self {
      world_size: DEFAULT_WORLD_SIZE,
      ms_per_frame: DEFAULT_MS_PER_FRAME,
      respawn_rate: DEFAULT_RESPAWN_RATE,
      snake_speed: DEFAULT_SNAKE_SPEED,
      snake_starting_length: DEFAULT_SNAKE_STARTING_LENGTH,
      snake_growth: DEFAULT_SNAKE_GROWTH,
      max_powerups: DEFAULT_MAX_POWERUPS,
      max_powerup_delay: DEFAULT_MAX_POWERUP_DELAY,
      seed: None,
      walls: Vec::new(),
    }
  }
}

impl GameSettings {
  pub fn from_json(text: &str) -> anyhow::Result<Self> {
    let settings: GameSettings = serde_json::from_str(text).context("settings are not valid JSON")?;
    settings.validate()?;
    Ok(settings)
  }

  /// Reads `path`; a missing file yields the defaults.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    match std::fs::read_to_string(path) {
      Ok(text) => Self::from_json(&text).with_context(|| format!("invalid settings in {}", path.display())),
      Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
        tracing::warn!(path = %path.display(), "settings file not found, using defaults");
        Ok(Self::default())
      }
      Err(error) => Err(error).with_context(|| format!("failed to read {}", path.display())),
    }
  }

  pub fn validate(&self) -> anyhow::Result<()> {
    if self.world_size == 0 {
      anyhow::bail!("world_size must be positive");
    }
    if self.ms_per_frame == 0 {
      anyhow::bail!("ms_per_frame must be positive");
    }
    if !(self.snake_speed.is_finite() && self.snake_speed > 0.0) {
      anyhow::bail!("snake_speed must be positive");
    }
    if !(self.snake_starting_length.is_finite() && self.snake_starting_length > 0.0) {
      anyhow::bail!("snake_starting_length must be positive");
    }
    if !(self.snake_growth.is_finite() && self.snake_growth >= 0.0) {
      anyhow::bail!("snake_growth must not be negative");
    }
    let mut seen = HashSet::new();
    for wall in &self.walls {
      if !seen.insert(wall.id) {
        anyhow::bail!("wall id {} is used more than once", wall.id);
      }
    }
    Ok(())
  }

  pub fn world_settings(&self) -> WorldSettings {
    WorldSettings {
      size: self.world_size,
      ms_per_frame: self.ms_per_frame,
      respawn_rate: self.respawn_rate,
      max_powerups: self.max_powerups,
      max_powerup_delay: self.max_powerup_delay,
      snake: SnakeConfig {
        speed: self.snake_speed,
        starting_length: self.snake_starting_length,
        growth: self.snake_growth,
      },
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
  pub port: u16,
  pub settings: GameSettings,
}

fn parse_env<T: std::str::FromStr>(name: &str) -> anyhow::Result<Option<T>>
where
  T::Err: std::fmt::Display,
{
  match env::var(name) {
    Ok(value) => value
      .trim()
      .parse()
      .map(Some)
      .map_err(|error| anyhow::anyhow!("{name}={value:?} is invalid: {error}")),
    Err(_) => Ok(None),
  }
}

impl ServerConfig {
  /// `SETTINGS_PATH`, `PORT` and `GAME_SEED` from the environment.
  pub fn from_env() -> anyhow::Result<Self> {
    let path = env::var("SETTINGS_PATH")
      .map(PathBuf::from)
      .unwrap_or_else(|_| PathBuf::from(DEFAULT_SETTINGS_PATH));
    let mut settings = GameSettings::load(&path)?;
    if let Some(seed) = parse_env::<u64>("GAME_SEED")? {
      settings.seed = Some(seed);
    }
    let port = parse_env::<u16>("PORT")?.unwrap_or(DEFAULT_PORT);
    Ok(Self { port, settings })
  }
}

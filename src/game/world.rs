//! Canonical world state shared between connection callbacks and the game loop.
//!
//! Every collection is a `DashMap`. Callers must never hold an entry guard of
//! one snake while reading or writing another snake; the engine collects ids,
//! mutates entries one at a time, and evaluates cross-snake rules against a
//! cloned snapshot.

use super::constants::WALL_PADDING;
use super::math::Aabb;
use super::types::{Direction, EntityId, Powerup, Snake, SnakeConfig, Wall};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct WorldSettings {
    pub size: u32,
    pub ms_per_frame: u64,
    pub respawn_rate: u32,
    pub max_powerups: u32,
    pub max_powerup_delay: u32,
    pub snake: SnakeConfig,
}

impl WorldSettings {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.ms_per_frame)
    }
}

#[derive(Debug)]
pub struct World {
    pub settings: WorldSettings,
    pub snakes: DashMap<EntityId, Snake>,
    pub powerups: DashMap<EntityId, Powerup>,
    pub walls: DashMap<EntityId, Wall>,
}

#[derive(Debug, Clone, Default)]
pub struct WorldSnapshot {
    pub snakes: Vec<Snake>,
    pub powerups: Vec<Powerup>,
    pub walls: Vec<Wall>,
}

impl World {
    pub fn new(settings: WorldSettings, walls: impl IntoIterator<Item = Wall>) -> Self {
        let wall_map = DashMap::new();
        for wall in walls {
            wall_map.insert(wall.id, wall);
        }
        Self {
            settings,
            snakes: DashMap::new(),
            powerups: DashMap::new(),
            walls: wall_map,
        }
    }

    pub fn size(&self) -> f64 {
        self.settings.size as f64
    }

    /// Inserts a snake unless its identity is already taken.
    pub fn insert_snake(&self, snake: Snake) -> bool {
        match self.snakes.entry(snake.id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(snake);
                true
            }
        }
    }

    pub fn change_direction(&self, snake_id: EntityId, requested: Direction) -> bool {
        let Some(mut snake) = self.snakes.get_mut(&snake_id) else { return false };
        snake.change_direction(requested)
    }

    pub fn mark_disconnected(&self, snake_id: EntityId) -> bool {
        let Some(mut snake) = self.snakes.get_mut(&snake_id) else { return false };
        snake.dc = true;
        true
    }

    pub fn remove_disconnected(&self) -> Vec<EntityId> {
        let mut removed = Vec::new();
        self.snakes.retain(|id, snake| {
            if snake.dc {
                removed.push(*id);
                false
            } else {
                true
            }
        });
        removed
    }

    pub fn wall_boxes(&self) -> Vec<Aabb> {
        self.walls
            .iter()
            .map(|wall| Aabb::from_points(wall.p1, wall.p2).padded(WALL_PADDING))
            .collect()
    }

    pub fn snake_ids(&self) -> Vec<EntityId> {
        self.snakes.iter().map(|entry| *entry.key()).collect()
    }

    pub fn powerup_ids(&self) -> Vec<EntityId> {
        self.powerups.iter().map(|entry| *entry.key()).collect()
    }

    /// Clones every collection, sorted by identity.
    pub fn snapshot(&self) -> WorldSnapshot {
        let mut snakes: Vec<Snake> = self.snakes.iter().map(|entry| entry.value().clone()).collect();
        snakes.sort_by_key(|snake| snake.id);
        let mut powerups: Vec<Powerup> = self
            .powerups
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        powerups.sort_by_key(|powerup| powerup.id);
        let mut walls: Vec<Wall> = self.walls.iter().map(|entry| *entry.value()).collect();
        walls.sort_by_key(|wall| wall.id);
        WorldSnapshot {
            snakes,
            powerups,
            walls,
        }
    }
}

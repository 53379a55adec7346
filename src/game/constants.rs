pub const SNAKE_HEAD_PADDING: f64 = 5.0;
pub const WALL_PADDING: f64 = 25.0;
pub const POWERUP_RADIUS: f64 = 8.0;
pub const SNAKE_COLLISION_DISTANCE: f64 = 4.0;
pub const GROWTH_STEP: f64 = 1.0;
pub const MAX_SPAWN_ATTEMPTS: usize = 1000;
pub const SPAWN_RETRY_FRAMES: u32 = 1;
pub const LENGTH_EPSILON: f64 = 1e-9;
pub const STATS_LOG_INTERVAL_TICKS: u64 = 300;

pub const DEFAULT_PORT: u16 = 11000;
pub const DEFAULT_WORLD_SIZE: u32 = 2000;
pub const DEFAULT_MS_PER_FRAME: u64 = 34;
pub const DEFAULT_RESPAWN_RATE: u32 = 100;
pub const DEFAULT_SNAKE_SPEED: f64 = 6.0;
pub const DEFAULT_SNAKE_STARTING_LENGTH: f64 = 120.0;
pub const DEFAULT_SNAKE_GROWTH: f64 = 24.0;
pub const DEFAULT_MAX_POWERUPS: u32 = 20;
pub const DEFAULT_MAX_POWERUP_DELAY: u32 = 75;

use super::constants::SPAWN_RETRY_FRAMES;
use super::physics::{captures_powerup, hits_snake, hits_wall};
use super::snake::{advance_snake, grow_tail};
use super::spawn::{find_powerup_location, find_snake_placement, sample_snake_placement};
use super::types::{Direction, EntityId, Powerup, PowerupState, Snake, Vector2};
use super::world::World;
use rand::Rng;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct TickReport {
    pub deaths: Vec<EntityId>,
    pub respawns: Vec<EntityId>,
    pub captures: Vec<(EntityId, EntityId)>,
}

fn regeneration_delay<R: Rng + ?Sized>(rng: &mut R, max_delay: u32) -> u32 {
    if max_delay == 0 {
        0
    } else {
        rng.gen_range(0..max_delay)
    }
}

/// Builds the snake for a freshly accepted player. If no clear placement is
/// found it starts dead and retries on the next tick.
pub fn spawn_snake<R: Rng + ?Sized>(world: &World, rng: &mut R, id: EntityId, name: String) -> Snake {
    let config = world.settings.snake;
    let size = world.size();
    let mut snake = Snake {
        id,
        name,
        body: Vec::new(),
        dir: Direction::Up,
        score: 0,
        died: false,
        alive: true,
        dc: false,
        join: true,
        config,
        respawn_timer: 0,
    };
    match find_snake_placement(rng, size, config.starting_length, &world.wall_boxes()) {
        Some(placement) => {
            snake.body = placement.body;
            snake.dir = placement.dir;
        }
        None => {
            let fallback = sample_snake_placement(rng, size, config.starting_length);
            snake.body = fallback.body;
            snake.dir = fallback.dir;
            snake.alive = false;
            snake.respawn_timer = SPAWN_RETRY_FRAMES;
            tracing::debug!(snake_id = id, "no clear spawn point, deferring");
        }
    }
    snake
}

/// Creates powerups `1..=max_powerups`. Any that cannot be placed start out
/// regenerating and are retried by the next tick.
pub fn seed_powerups<R: Rng + ?Sized>(world: &World, rng: &mut R) {
    let size = world.size();
    let walls = world.wall_boxes();
    for id in 1..=world.settings.max_powerups {
        let powerup = match find_powerup_location(rng, size, &walls) {
            Some(loc) => Powerup {
                id,
                loc,
                died: false,
                state: PowerupState::Active,
            },
            None => Powerup {
                id,
                loc: Vector2::default(),
                died: false,
                state: PowerupState::Regenerating {
                    frames_left: SPAWN_RETRY_FRAMES,
                },
            },
        };
        world.powerups.insert(id, powerup);
    }
}

fn tick_powerups<R: Rng + ?Sized>(world: &World, rng: &mut R) {
    let size = world.size();
    let walls = world.wall_boxes();
    for id in world.powerup_ids() {
        let Some(mut powerup) = world.powerups.get_mut(&id) else { continue };
        powerup.died = false;
        let PowerupState::Regenerating { frames_left } = powerup.state else { continue };
        let frames_left = frames_left.saturating_sub(1);
        if frames_left > 0 {
            powerup.state = PowerupState::Regenerating { frames_left };
            continue;
        }
        match find_powerup_location(rng, size, &walls) {
            Some(loc) => {
                powerup.loc = loc;
                powerup.state = PowerupState::Active;
            }
            None => {
                powerup.state = PowerupState::Regenerating {
                    frames_left: SPAWN_RETRY_FRAMES,
                };
            }
        }
    }
}

/// Counts down a dead snake and places it again once the countdown is done.
/// Returns true if the snake came back this tick.
fn tick_respawn<R: Rng + ?Sized>(snake: &mut Snake, world: &World, rng: &mut R) -> bool {
    snake.respawn_timer = snake.respawn_timer.saturating_sub(1);
    if snake.respawn_timer > 0 {
        return false;
    }
    let placement = find_snake_placement(
        rng,
        world.size(),
        snake.config.starting_length,
        &world.wall_boxes(),
    );
    let Some(placement) = placement else {
        snake.respawn_timer = SPAWN_RETRY_FRAMES;
        return false;
    };
    snake.body = placement.body;
    snake.dir = placement.dir;
    snake.score = 0;
    snake.alive = true;
    snake.died = false;
    true
}

/// Advances the world by one tick.
///
/// Movement is applied snake by snake; collisions are then judged against a
/// snapshot taken after every snake has moved, so the outcome does not depend
/// on iteration order.
pub fn advance<R: Rng + ?Sized>(world: &World, rng: &mut R) -> TickReport {
    let mut report = TickReport::default();
    let size = world.size();

    tick_powerups(world, rng);

    let mut ids = world.snake_ids();
    ids.sort_unstable();
    let mut moved = Vec::with_capacity(ids.len());
    for id in ids {
        let Some(mut snake) = world.snakes.get_mut(&id) else { continue };
        if snake.dc {
            continue;
        }
        snake.died = false;
        snake.join = false;
        if !snake.alive {
            if tick_respawn(&mut snake, world, rng) {
                tracing::debug!(snake_id = id, "snake respawned");
                report.respawns.push(id);
            }
            continue;
        }
        advance_snake(&mut snake, size);
        moved.push(id);
    }

    let snapshot = world.snapshot().snakes;
    let walls = world.wall_boxes();
    let mut survivors = Vec::with_capacity(moved.len());
    for snake in snapshot.iter().filter(|snake| moved.contains(&snake.id)) {
        let head = snake.head();
        if hits_wall(head, &walls) || hits_snake(snake.id, head, &snapshot, size) {
            report.deaths.push(snake.id);
        } else {
            survivors.push((snake.id, head, snake.dir));
        }
    }

    for id in &report.deaths {
        let Some(mut snake) = world.snakes.get_mut(id) else { continue };
        snake.died = true;
        snake.alive = false;
        snake.respawn_timer = world.settings.respawn_rate;
        tracing::debug!(snake_id = *id, score = snake.score, "snake died");
    }

    let mut powerup_ids = world.powerup_ids();
    powerup_ids.sort_unstable();
    for (snake_id, head, dir) in survivors {
        let mut eaten = 0;
        for powerup_id in &powerup_ids {
            let Some(mut powerup) = world.powerups.get_mut(powerup_id) else { continue };
            if !powerup.is_active() || !captures_powerup(head, dir, powerup.loc) {
                continue;
            }
            powerup.died = true;
            powerup.state = PowerupState::Regenerating {
                frames_left: regeneration_delay(rng, world.settings.max_powerup_delay),
            };
            report.captures.push((snake_id, *powerup_id));
            eaten += 1;
        }
        if eaten == 0 {
            continue;
        }
        let Some(mut snake) = world.snakes.get_mut(&snake_id) else { continue };
        for _ in 0..eaten {
            snake.score += 1;
            grow_tail(&mut snake, size);
        }
    }

    report
}

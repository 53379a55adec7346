use super::constants::{GROWTH_STEP, LENGTH_EPSILON};
use super::math::{
    is_wrap_seam, normalize, wrap_modular, wrap_to_opposite_edge, wrapped_distance, wrapped_offset,
};
use super::types::{Direction, Snake, Vector2};

pub fn body_length(body: &[Vector2], world_size: f64) -> f64 {
    body.windows(2)
        .map(|pair| wrapped_distance(pair[0], pair[1], world_size))
        .sum()
}

fn head_segment_direction(body: &[Vector2]) -> Option<Direction> {
    if body.len() < 2 {
        return None;
    }
    let head = body[body.len() - 1];
    let neck = body[body.len() - 2];
    Direction::from_delta(head - neck)
}

/// Moves the head one step and trims the tail back to the target length.
///
/// A straight move stretches the head segment only while it stays within
/// half the world; past that a collinear point is added so no stored segment
/// can be mistaken for a wrap seam.
pub fn advance_snake(snake: &mut Snake, world_size: f64) {
    let head = snake.head();
    let mut next = head + snake.dir.unit() * snake.config.speed;
    let wrapped = wrap_to_opposite_edge(&mut next, world_size);

    let continues_straight = !wrapped
        && snake.body.len() >= 2
        && head_segment_direction(&snake.body) == Some(snake.dir)
        && !is_wrap_seam(snake.body[snake.body.len() - 2], next, world_size);
    if continues_straight {
        let last = snake.body.len() - 1;
        snake.body[last] = next;
    } else {
        snake.body.push(next);
    }

    let target = snake.target_length();
    trim_tail(&mut snake.body, target, world_size);
}

pub fn trim_tail(body: &mut Vec<Vector2>, target: f64, world_size: f64) {
    let mut excess = body_length(body, world_size) - target;
    while excess > LENGTH_EPSILON && body.len() >= 2 {
        let segment = wrapped_distance(body[0], body[1], world_size);
        if segment <= excess && body.len() > 2 {
            body.remove(0);
            excess -= segment;
            continue;
        }
        let step = excess.min(segment);
        let toward = normalize(wrapped_offset(body[0], body[1], world_size));
        body[0] = wrap_modular(body[0] + toward * step, world_size);
        break;
    }
}

/// Direction pointing away from the body at the tail, taken from the first
/// segment with any length.
fn tail_outward(body: &[Vector2], world_size: f64) -> Option<Vector2> {
    body.windows(2)
        .map(|pair| normalize(wrapped_offset(pair[1], pair[0], world_size)))
        .find(|outward| *outward != Vector2::new(0.0, 0.0))
}

/// Extends the tail outward after a capture. Overshoot past `growth` is kept.
///
/// Long growth is laid down in pieces of at most a quarter of the world.
pub fn grow_tail(snake: &mut Snake, world_size: f64) {
    let outward = tail_outward(&snake.body, world_size).unwrap_or_else(|| snake.dir.opposite().unit());

    let mut added = 0.0;
    while added < snake.config.growth {
        added += GROWTH_STEP;
    }

    let max_piece = world_size / 4.0;
    let mut tail = snake.tail();
    let mut remaining = added;
    while remaining > LENGTH_EPSILON {
        let piece = remaining.min(max_piece);
        tail = wrap_modular(tail + outward * piece, world_size);
        snake.body.insert(0, tail);
        remaining -= piece;
    }
}

use super::constants::{POWERUP_RADIUS, SNAKE_COLLISION_DISTANCE, SNAKE_HEAD_PADDING};
use super::math::{is_wrap_seam, point_segment_distance_squared, Aabb};
use super::types::{Direction, EntityId, Snake, Vector2};

pub fn head_box(head: Vector2) -> Aabb {
    Aabb::around(head, SNAKE_HEAD_PADDING)
}

/// `wall_boxes` are already padded by the wall padding.
pub fn hits_wall(head: Vector2, wall_boxes: &[Aabb]) -> bool {
    let head = head_box(head);
    wall_boxes.iter().any(|wall| wall.intersects(&head))
}

/// Checks `head` against every segment of every live snake in `snakes`.
///
/// `self_id` names the snake owning `head`; its head segment and the neck
/// segment behind it are skipped. Right after a turn the head is still within
/// `SNAKE_COLLISION_DISTANCE` of the corner it shares with the neck whenever
/// the speed is below that distance, which would read as a self-hit.
pub fn hits_snake(self_id: EntityId, head: Vector2, snakes: &[Snake], world_size: f64) -> bool {
    let threshold = SNAKE_COLLISION_DISTANCE * SNAKE_COLLISION_DISTANCE;
    for other in snakes {
        if !other.alive || other.dc || other.body.len() < 2 {
            continue;
        }
        let segment_count = other.body.len() - 1;
        let checked = if other.id == self_id {
            segment_count.saturating_sub(2)
        } else {
            segment_count
        };
        for index in 0..checked {
            let a = other.body[index];
            let b = other.body[index + 1];
            if is_wrap_seam(a, b, world_size) {
                continue;
            }
            if point_segment_distance_squared(head, a, b) <= threshold {
                return true;
            }
        }
    }
    false
}

/// Rectangle reaching `SNAKE_HEAD_PADDING` ahead of and behind the head along
/// its heading, and the same distance to either side.
pub fn capture_rect(head: Vector2, dir: Direction) -> Aabb {
    let forward = dir.unit();
    let side = Vector2::new(-forward.y, forward.x);
    let reach = forward * SNAKE_HEAD_PADDING + side * SNAKE_HEAD_PADDING;
    Aabb::from_points(head - reach, head + reach)
}

pub fn captures_powerup(head: Vector2, dir: Direction, powerup: Vector2) -> bool {
    capture_rect(head, dir).intersects(&Aabb::around(powerup, POWERUP_RADIUS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::constants::WALL_PADDING;
    use crate::game::types::SnakeConfig;

    fn make_snake(id: EntityId, body: Vec<Vector2>, dir: Direction) -> Snake {
        Snake {
            id,
            name: "Test".to_string(),
            body,
            dir,
            score: 0,
            died: false,
            alive: true,
            dc: false,
            join: false,
            config: SnakeConfig {
                speed: 6.0,
                starting_length: 120.0,
                growth: 24.0,
            },
            respawn_timer: 0,
        }
    }

    fn wall_box(p1: Vector2, p2: Vector2) -> Aabb {
        Aabb::from_points(p1, p2).padded(WALL_PADDING)
    }

    #[test]
    fn head_inside_vertical_wall_collides() {
        let walls = vec![wall_box(Vector2::new(0.0, 0.0), Vector2::new(0.0, 100.0))];

        assert!(hits_wall(Vector2::new(0.0, 50.0), &walls));
        assert!(hits_wall(Vector2::new(29.0, 50.0), &walls));
        assert!(!hits_wall(Vector2::new(31.0, 50.0), &walls));
        assert!(!hits_wall(Vector2::new(0.0, 131.0), &walls));
    }

    #[test]
    fn degenerate_wall_is_a_single_tile() {
        let walls = vec![wall_box(Vector2::new(200.0, 200.0), Vector2::new(200.0, 200.0))];
        assert!(hits_wall(Vector2::new(225.0, 175.0), &walls));
        assert!(!hits_wall(Vector2::new(240.0, 200.0), &walls));
    }

    #[test]
    fn head_touching_other_snake_body_collides() {
        let other = make_snake(
            2,
            vec![Vector2::new(0.0, -50.0), Vector2::new(0.0, 50.0)],
            Direction::Down,
        );
        let snakes = vec![other];

        assert!(hits_snake(1, Vector2::new(3.0, 0.0), &snakes, 2000.0));
        assert!(hits_snake(1, Vector2::new(-4.0, 10.0), &snakes, 2000.0));
        assert!(!hits_snake(1, Vector2::new(5.0, 0.0), &snakes, 2000.0));
    }

    #[test]
    fn dead_and_disconnected_snakes_are_not_obstacles() {
        let mut dead = make_snake(
            2,
            vec![Vector2::new(0.0, -50.0), Vector2::new(0.0, 50.0)],
            Direction::Down,
        );
        dead.alive = false;
        let mut gone = make_snake(
            3,
            vec![Vector2::new(-50.0, 0.0), Vector2::new(50.0, 0.0)],
            Direction::Right,
        );
        gone.dc = true;

        assert!(!hits_snake(1, Vector2::new(0.0, 0.0), &[dead, gone], 2000.0));
    }

    #[test]
    fn own_head_and_neck_segments_are_ignored() {
        let snake = make_snake(
            1,
            vec![Vector2::new(0.0, 0.0), Vector2::new(50.0, 0.0), Vector2::new(50.0, 3.0)],
            Direction::Down,
        );
        let head = snake.head();
        assert!(!hits_snake(1, head, &[snake], 2000.0));
    }

    #[test]
    fn snake_can_run_into_its_own_older_body() {
        let snake = make_snake(
            1,
            vec![
                Vector2::new(0.0, 0.0),
                Vector2::new(40.0, 0.0),
                Vector2::new(40.0, 20.0),
                Vector2::new(20.0, 20.0),
                Vector2::new(20.0, 2.0),
            ],
            Direction::Up,
        );
        let head = snake.head();
        assert!(hits_snake(1, head, &[snake], 2000.0));
    }

    #[test]
    fn wrap_seam_is_not_a_segment() {
        let other = make_snake(
            2,
            vec![Vector2::new(-100.0, 0.0), Vector2::new(100.0, 0.0)],
            Direction::Right,
        );
        assert!(!hits_snake(1, Vector2::new(0.0, 0.0), &[other], 200.0));
    }

    #[test]
    fn capture_rect_is_symmetric_for_every_heading() {
        let head = Vector2::new(10.0, 10.0);
        for dir in Direction::ALL {
            let rect = capture_rect(head, dir);
            assert_eq!(rect.min, Vector2::new(5.0, 5.0));
            assert_eq!(rect.max, Vector2::new(15.0, 15.0));
        }
    }

    #[test]
    fn powerup_within_padding_is_captured() {
        let head = Vector2::new(0.0, 0.0);
        assert!(captures_powerup(head, Direction::Up, Vector2::new(0.0, -13.0)));
        assert!(captures_powerup(head, Direction::Left, Vector2::new(13.0, 0.0)));
        assert!(!captures_powerup(head, Direction::Up, Vector2::new(0.0, -14.0)));
    }
}

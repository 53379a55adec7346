use super::constants::{MAX_SPAWN_ATTEMPTS, POWERUP_RADIUS, SNAKE_HEAD_PADDING};
use super::math::{in_bounds, Aabb};
use super::types::{Direction, Vector2};
use rand::Rng;

#[derive(Debug, Clone, PartialEq)]
pub struct SnakePlacement {
    pub body: Vec<Vector2>,
    pub dir: Direction,
}

fn sample_point<R: Rng + ?Sized>(rng: &mut R, world_size: f64) -> Vector2 {
    let half = world_size / 2.0;
    Vector2::new(rng.gen_range(-half..half), rng.gen_range(-half..half))
}

pub fn sample_snake_placement<R: Rng + ?Sized>(
    rng: &mut R,
    world_size: f64,
    length: f64,
) -> SnakePlacement {
    let tail = sample_point(rng, world_size);
    let dir = Direction::ALL[rng.gen_range(0..Direction::ALL.len())];
    SnakePlacement {
        body: straight_body(tail, dir, length, world_size),
        dir,
    }
}

/// Lays a straight body from `tail` in pieces of at most a quarter of the
/// world, well clear of the half-world span that reads as a wrap seam.
fn straight_body(tail: Vector2, dir: Direction, length: f64, world_size: f64) -> Vec<Vector2> {
    let max_segment = world_size / 4.0;
    let mut body = vec![tail];
    let mut laid = 0.0;
    while length - laid > max_segment {
        laid += max_segment;
        body.push(tail + dir.unit() * laid);
    }
    body.push(tail + dir.unit() * length);
    body
}

fn snake_placement_is_clear(placement: &SnakePlacement, world_size: f64, wall_boxes: &[Aabb]) -> bool {
    let (Some(tail), Some(head)) = (placement.body.first(), placement.body.last()) else {
        return false;
    };
    let body_box = Aabb::from_points(*tail, *head).padded(SNAKE_HEAD_PADDING);
    placement.body.iter().all(|point| in_bounds(*point, world_size))
        && !wall_boxes.iter().any(|wall| wall.intersects(&body_box))
}

/// Samples placements until one clears every wall and fits in the world.
/// Returns `None` once `MAX_SPAWN_ATTEMPTS` candidates have failed.
pub fn find_snake_placement<R: Rng + ?Sized>(
    rng: &mut R,
    world_size: f64,
    length: f64,
    wall_boxes: &[Aabb],
) -> Option<SnakePlacement> {
    (0..MAX_SPAWN_ATTEMPTS)
        .map(|_| sample_snake_placement(rng, world_size, length))
        .find(|placement| snake_placement_is_clear(placement, world_size, wall_boxes))
}

pub fn find_powerup_location<R: Rng + ?Sized>(
    rng: &mut R,
    world_size: f64,
    wall_boxes: &[Aabb],
) -> Option<Vector2> {
    for _ in 0..MAX_SPAWN_ATTEMPTS {
        let point = sample_point(rng, world_size);
        let loc = Vector2::new(point.x.trunc(), point.y.trunc());
        let zone = Aabb::around(loc, POWERUP_RADIUS);
        if !wall_boxes.iter().any(|wall| wall.intersects(&zone)) {
            return Some(loc);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::constants::WALL_PADDING;
    use crate::game::math::is_wrap_seam;
    use crate::game::snake::body_length;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn placement_is_straight_and_of_requested_length() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let placement = sample_snake_placement(&mut rng, 2000.0, 120.0);
            let delta = placement.body[1] - placement.body[0];
            assert_eq!(Direction::from_delta(delta), Some(placement.dir));
            assert!((body_length(&placement.body, 2000.0) - 120.0).abs() < 1e-9);
        }
    }

    #[test]
    fn found_placement_avoids_walls_and_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(3);
        let walls = vec![
            Aabb::from_points(Vector2::new(-500.0, -500.0), Vector2::new(500.0, 0.0)).padded(WALL_PADDING),
        ];
        for _ in 0..50 {
            let placement = find_snake_placement(&mut rng, 1000.0, 60.0, &walls).expect("placement");
            assert!(placement.body.iter().all(|point| in_bounds(*point, 1000.0)));
            assert!(placement.body.iter().all(|point| point.y > WALL_PADDING));
        }
    }

    #[test]
    fn placement_gives_up_when_world_is_walled_off() {
        let mut rng = StdRng::seed_from_u64(5);
        let walls = vec![Aabb::from_points(Vector2::new(-600.0, -600.0), Vector2::new(600.0, 600.0))];

        assert_eq!(find_snake_placement(&mut rng, 1000.0, 60.0, &walls), None);
        assert_eq!(find_powerup_location(&mut rng, 1000.0, &walls), None);
    }

    #[test]
    fn powerup_location_is_whole_and_clear_of_walls() {
        let mut rng = StdRng::seed_from_u64(8);
        let walls = vec![Aabb::from_points(Vector2::new(0.0, -500.0), Vector2::new(500.0, 500.0)).padded(WALL_PADDING)];
        for _ in 0..50 {
            let loc = find_powerup_location(&mut rng, 1000.0, &walls).expect("location");
            assert_eq!(loc.x, loc.x.trunc());
            assert!(loc.x < -(WALL_PADDING + POWERUP_RADIUS));
        }
    }

    #[test]
    fn long_placement_is_split_below_half_the_world() {
        let mut rng = StdRng::seed_from_u64(21);
        for _ in 0..50 {
            let placement = sample_snake_placement(&mut rng, 1000.0, 800.0);
            assert_eq!(placement.body.len(), 5);
            assert!((body_length(&placement.body, 1000.0) - 800.0).abs() < 1e-9);
            for pair in placement.body.windows(2) {
                assert!(!is_wrap_seam(pair[0], pair[1], 1000.0));
                assert_eq!(Direction::from_delta(pair[1] - pair[0]), Some(placement.dir));
            }
        }
    }
}

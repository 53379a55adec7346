use super::types::Vector2;

pub fn length(point: Vector2) -> f64 {
  (point.x * point.x + point.y * point.y).sqrt()
}

pub fn normalize(point: Vector2) -> Vector2 {
  let len = length(point);
  if !len.is_finite() || len == 0.0 {
    return Vector2 { x: 0.0, y: 0.0 };
  }
  Vector2 {
    x: point.x / len,
    y: point.y / len,
  }
}

pub fn distance_squared(a: Vector2, b: Vector2) -> f64 {
  (a.x - b.x).powi(2) + (a.y - b.y).powi(2)
}

/// Shortest signed offset from `from` to `to` on one axis of a torus of side `size`.
pub fn wrapped_delta(from: f64, to: f64, size: f64) -> f64 {
  let mut delta = to - from;
  let half = size / 2.0;
  if delta > half {
    delta -= size;
  } else if delta < -half {
    delta += size;
  }
  delta
}

pub fn wrapped_offset(from: Vector2, to: Vector2, size: f64) -> Vector2 {
  Vector2 {
    x: wrapped_delta(from.x, to.x, size),
    y: wrapped_delta(from.y, to.y, size),
  }
}

pub fn wrapped_distance(a: Vector2, b: Vector2, size: f64) -> f64 {
  length(wrapped_offset(a, b, size))
}

/// Snaps any coordinate past the edge to the opposite edge. Returns true if it wrapped.
pub fn wrap_to_opposite_edge(point: &mut Vector2, size: f64) -> bool {
  let half = size / 2.0;
  let mut wrapped = false;
  if point.x > half {
    point.x = -half;
    wrapped = true;
  } else if point.x < -half {
    point.x = half;
    wrapped = true;
  }
  if point.y > half {
    point.y = -half;
    wrapped = true;
  } else if point.y < -half {
    point.y = half;
    wrapped = true;
  }
  wrapped
}

/// Folds a point back into the world square, preserving distance travelled.
pub fn wrap_modular(point: Vector2, size: f64) -> Vector2 {
  let half = size / 2.0;
  let fold = |value: f64| {
    if value > half || value < -half {
      (value + half).rem_euclid(size) - half
    } else {
      value
    }
  };
  Vector2 {
    x: fold(point.x),
    y: fold(point.y),
  }
}

pub fn in_bounds(point: Vector2, size: f64) -> bool {
  let half = size / 2.0;
  point.x >= -half && point.x <= half && point.y >= -half && point.y <= half
}

/// A stored segment that jumps across the world edge rather than lying on the plane.
pub fn is_wrap_seam(a: Vector2, b: Vector2, size: f64) -> bool {
  let half = size / 2.0;
  (a.x - b.x).abs() > half || (a.y - b.y).abs() > half
}

pub fn point_segment_distance_squared(point: Vector2, a: Vector2, b: Vector2) -> f64 {
  let ab = b - a;
  let len_sq = ab.x * ab.x + ab.y * ab.y;
  if len_sq == 0.0 {
    return distance_squared(point, a);
  }
  let ap = point - a;
  let t = clamp((ap.x * ab.x + ap.y * ab.y) / len_sq, 0.0, 1.0);
  distance_squared(point, a + ab * t)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
  pub min: Vector2,
  pub max: Vector2,
}

impl Aabb {
  pub fn from_points(a: Vector2, b: Vector2) -> Self {
    Self {
      min: Vector2::new(a.x.min(b.x), a.y.min(b.y)),
      max: Vector2::new(a.x.max(b.x), a.y.max(b.y)),
    }
  }

  pub fn around(center: Vector2, radius: f64) -> Self {
    Self::from_points(center, center).padded(radius)
  }

  pub fn padded(self, padding: f64) -> Self {
    Self {
      min: Vector2::new(self.min.x - padding, self.min.y - padding),
      max: Vector2::new(self.max.x + padding, self.max.y + padding),
    }
  }

  pub fn intersects(&self, other: &Aabb) -> bool {
    self.min.x <= other.max.x
      && self.max.x >= other.min.x
      && self.min.y <= other.max.y
      && self.max.y >= other.min.y
  }
}

pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
  value.min(max).max(min)
}

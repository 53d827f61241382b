use serde::{Deserialize, Serialize};

/// A point or displacement in world units. Y grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned bounding box with closed bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Aabb {
    /// Bounding box of a vertex list. Empty input yields an inverted box that
    /// intersects nothing.
    pub fn from_points(points: &[Point]) -> Self {
        let mut aabb = Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        };
        for p in points {
            aabb.min_x = aabb.min_x.min(p.x);
            aabb.min_y = aabb.min_y.min(p.y);
            aabb.max_x = aabb.max_x.max(p.x);
            aabb.max_y = aabb.max_y.max(p.y);
        }
        aabb
    }

    pub fn expanded(&self, margin: f64) -> Self {
        Self {
            min_x: self.min_x - margin,
            min_y: self.min_y - margin,
            max_x: self.max_x + margin,
            max_y: self.max_y + margin,
        }
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        !(self.max_x < other.min_x
            || other.max_x < self.min_x
            || self.max_y < other.min_y
            || other.max_y < self.min_y)
    }
}

/// Result of a separating-axis test.
///
/// `move_x`/`move_y` is the minimum translation that pushes the first polygon
/// out of the second. Both are zero when there is no collision.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Collision {
    pub colliding: bool,
    pub move_x: f64,
    pub move_y: f64,
}

/// Separating-axis test between two convex polygons.
///
/// With `ignore_touching_edges`, polygons whose edges merely touch (zero
/// penetration along some axis) are not colliding. This is what lets a box
/// rest exactly on top of a platform without being considered inside it.
pub fn collision_test(a: &[Point], b: &[Point], ignore_touching_edges: bool) -> Collision {
    if a.len() < 2 || b.len() < 2 {
        return Collision::default();
    }

    let mut min_dist = f64::MAX;
    let mut axis_x = 0.0;
    let mut axis_y = 0.0;

    let edges = edges_of(a).chain(edges_of(b));
    for (ex, ey) in edges {
        let (nx, ny) = normalise(-ey, ex);
        let (min_a, max_a) = project(nx, ny, a);
        let (min_b, max_b) = project(nx, ny, b);
        let dist = interval_distance(min_a, max_a, min_b, max_b);

        if dist > 0.0 || (dist == 0.0 && ignore_touching_edges) {
            return Collision::default();
        }

        let abs_dist = dist.abs();
        if abs_dist < min_dist {
            min_dist = abs_dist;
            axis_x = nx;
            axis_y = ny;
        }
    }

    // Orient the axis so that it pushes `a` away from `b`.
    let center_a = centroid(a);
    let center_b = centroid(b);
    let dx = center_a.x - center_b.x;
    let dy = center_a.y - center_b.y;
    if dx * axis_x + dy * axis_y < 0.0 {
        axis_x = -axis_x;
        axis_y = -axis_y;
    }

    Collision {
        colliding: true,
        move_x: axis_x * min_dist,
        move_y: axis_y * min_dist,
    }
}

/// True when the polygon is convex and non-degenerate (at least three
/// vertices and non-zero area). Winding order does not matter.
pub fn is_convex(points: &[Point]) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    let mut sign = 0.0_f64;
    for i in 0..n {
        let p0 = points[i];
        let p1 = points[(i + 1) % n];
        let p2 = points[(i + 2) % n];
        let cross = (p1.x - p0.x) * (p2.y - p1.y) - (p1.y - p0.y) * (p2.x - p1.x);
        if cross == 0.0 {
            continue;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    sign != 0.0
}

/// Round half toward positive infinity (`-2.5` becomes `-2`).
///
/// Pixel snapping must be symmetric around the object's motion, so this is
/// used instead of [`f64::round`], which rounds half away from zero.
pub fn round_half_up(v: f64) -> f64 {
    (v + 0.5).floor()
}

fn edges_of(points: &[Point]) -> impl Iterator<Item = (f64, f64)> + '_ {
    let n = points.len();
    (0..n).map(move |i| {
        let p = points[i];
        let q = points[(i + 1) % n];
        (q.x - p.x, q.y - p.y)
    })
}

fn normalise(x: f64, y: f64) -> (f64, f64) {
    let len = (x * x + y * y).sqrt();
    if len == 0.0 { (x, y) } else { (x / len, y / len) }
}

fn project(nx: f64, ny: f64, points: &[Point]) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for p in points {
        let d = nx * p.x + ny * p.y;
        min = min.min(d);
        max = max.max(d);
    }
    (min, max)
}

fn interval_distance(min_a: f64, max_a: f64, min_b: f64, max_b: f64) -> f64 {
    if min_a < min_b {
        min_b - max_a
    } else {
        min_a - max_b
    }
}

fn centroid(points: &[Point]) -> Point {
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Point::new(sx / n, sy / n)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: f64, y: f64, w: f64, h: f64) -> Vec<Point> {
        vec![
            Point::new(x, y),
            Point::new(x + w, y),
            Point::new(x + w, y + h),
            Point::new(x, y + h),
        ]
    }

    #[test]
    fn separated_rectangles_do_not_collide() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        let b = rect(20.0, 0.0, 10.0, 10.0);
        assert!(!collision_test(&a, &b, true).colliding);
        assert!(!collision_test(&a, &b, false).colliding);
    }

    #[test]
    fn touching_edges_depend_on_flag() {
        // Box resting exactly on top of a platform.
        let a = rect(0.0, -20.0, 10.0, 20.0);
        let b = rect(0.0, 0.0, 60.0, 32.0);
        assert!(!collision_test(&a, &b, true).colliding);
        assert!(collision_test(&a, &b, false).colliding);
    }

    #[test]
    fn overlap_pushes_first_polygon_out() {
        // 3 units of penetration from above.
        let a = rect(0.0, -17.0, 10.0, 20.0);
        let b = rect(-20.0, 0.0, 60.0, 32.0);
        let result = collision_test(&a, &b, true);
        assert!(result.colliding);
        assert_eq!(result.move_x, 0.0);
        assert_eq!(result.move_y, -3.0);
    }

    #[test]
    fn overlap_from_the_side_pushes_horizontally() {
        let a = rect(8.0, 0.0, 10.0, 10.0);
        let b = rect(17.0, -50.0, 10.0, 100.0);
        let result = collision_test(&a, &b, true);
        assert!(result.colliding);
        assert_eq!(result.move_x, -1.0);
        assert_eq!(result.move_y, 0.0);
    }

    #[test]
    fn triangle_slope_collides_only_under_hypotenuse() {
        // 45 degree ramp rising to the right: (0,0) -> (100,-100) -> (100,0).
        let ramp = vec![
            Point::new(0.0, 0.0),
            Point::new(100.0, -100.0),
            Point::new(100.0, 0.0),
        ];
        let above = rect(10.0, -40.0, 10.0, 20.0);
        let inside = rect(60.0, -60.0, 10.0, 20.0);
        assert!(!collision_test(&above, &ramp, true).colliding);
        assert!(collision_test(&inside, &ramp, true).colliding);
    }

    #[test]
    fn degenerate_input_never_collides() {
        let a = vec![Point::new(0.0, 0.0)];
        let b = rect(0.0, 0.0, 10.0, 10.0);
        assert_eq!(collision_test(&a, &b, false), Collision::default());
    }

    #[test]
    fn convexity_check() {
        assert!(is_convex(&rect(0.0, 0.0, 5.0, 5.0)));
        assert!(is_convex(&[
            Point::new(0.0, 0.0),
            Point::new(100.0, -100.0),
            Point::new(100.0, 0.0),
        ]));
        // Arrow head: concave.
        assert!(!is_convex(&[
            Point::new(0.0, 0.0),
            Point::new(10.0, 5.0),
            Point::new(0.0, 10.0),
            Point::new(4.0, 5.0),
        ]));
        // Collinear points have no area.
        assert!(!is_convex(&[
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(2.0, 0.0),
        ]));
    }

    #[test]
    fn rounding_is_half_up() {
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(-2.5), -2.0);
        assert_eq!(round_half_up(-29.16), -29.0);
        assert_eq!(round_half_up(0.49), 0.0);
    }

    #[test]
    fn aabb_intersection_is_closed() {
        let a = Aabb::from_points(&rect(0.0, 0.0, 10.0, 10.0));
        let b = Aabb::from_points(&rect(10.0, 0.0, 10.0, 10.0));
        let c = Aabb::from_points(&rect(10.5, 0.0, 10.0, 10.0));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(a.expanded(0.5).intersects(&c));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn collision_is_symmetric(
                ax in -50.0f64..50.0, ay in -50.0f64..50.0,
                bx in -50.0f64..50.0, by in -50.0f64..50.0,
                aw in 1.0f64..40.0, ah in 1.0f64..40.0,
                bw in 1.0f64..40.0, bh in 1.0f64..40.0,
            ) {
                let a = rect(ax, ay, aw, ah);
                let b = rect(bx, by, bw, bh);
                prop_assert_eq!(
                    collision_test(&a, &b, true).colliding,
                    collision_test(&b, &a, true).colliding
                );
            }

            #[test]
            fn minimum_translation_separates_rectangles(
                ax in -20.0f64..20.0, ay in -20.0f64..20.0,
                aw in 1.0f64..30.0, ah in 1.0f64..30.0,
            ) {
                let a = rect(ax, ay, aw, ah);
                let b = rect(0.0, 0.0, 25.0, 25.0);
                let result = collision_test(&a, &b, true);
                let depth = result.move_x.hypot(result.move_y);
                if result.colliding && depth > 1e-6 {
                    // Overshoot slightly so rounding cannot leave a sliver.
                    let moved: Vec<Point> = a
                        .iter()
                        .map(|p| p.offset(result.move_x * 1.01, result.move_y * 1.01))
                        .collect();
                    prop_assert!(!collision_test(&moved, &b, true).colliding);
                }
            }
        }
    }
}

// Phase 2: 最小外接矩形（凸包 + rotating calipers）

use std::cmp::Ordering;

/// Floating point 2D coordinate. The axis naming is positional only:
/// callers decide whether `x` holds the column or the row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Vec2 { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinAreaRect {
    pub center: Vec2,
    /// Extent along `axis`.
    pub width: f64,
    /// Extent perpendicular to `axis`.
    pub height: f64,
    /// Orientation of the rectangle's edges in degrees, reduced to `[0, 90)`.
    pub angle: f64,
    axis: Vec2,
}

impl MinAreaRect {
    /// Compute the tightest rotated rectangle around `points`.
    ///
    /// Returns `None` for an empty slice. A single point or a collinear set
    /// yields a rectangle with zero height.
    pub fn from_points(points: &[Vec2]) -> Option<Self> {
        let hull = convex_hull(points);
        match hull.len() {
            0 => None,
            1 => Some(MinAreaRect {
                center: hull[0],
                width: 0.0,
                height: 0.0,
                angle: 0.0,
                axis: Vec2::new(1.0, 0.0),
            }),
            _ => Some(rotating_calipers(&hull)),
        }
    }

    /// The four corners in boundary order.
    pub fn corners(&self) -> [Vec2; 4] {
        let u = self.axis;
        let v = Vec2::new(-u.y, u.x);
        let hw = self.width / 2.0;
        let hh = self.height / 2.0;
        let at = |a: f64, b: f64| {
            Vec2::new(
                self.center.x + a * u.x + b * v.x,
                self.center.y + a * u.y + b * v.y,
            )
        };
        [at(-hw, -hh), at(hw, -hh), at(hw, hh), at(-hw, hh)]
    }
}

fn cross(o: Vec2, a: Vec2, b: Vec2) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Andrew's monotone chain. Collinear points are dropped.
fn convex_hull(points: &[Vec2]) -> Vec<Vec2> {
    let mut pts: Vec<Vec2> = points.to_vec();
    pts.sort_by(|a, b| {
        a.x.partial_cmp(&b.x)
            .unwrap_or(Ordering::Equal)
            .then(a.y.partial_cmp(&b.y).unwrap_or(Ordering::Equal))
    });
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }

    let mut lower: Vec<Vec2> = Vec::with_capacity(pts.len());
    for &p in &pts {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(p);
    }

    let mut upper: Vec<Vec2> = Vec::with_capacity(pts.len());
    for &p in pts.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(p);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

fn rotating_calipers(hull: &[Vec2]) -> MinAreaRect {
    let n = hull.len();
    let mut best: Option<(f64, MinAreaRect)> = None;

    for i in 0..n {
        let a = hull[i];
        let b = hull[(i + 1) % n];
        let (ex, ey) = (b.x - a.x, b.y - a.y);
        let len = ex.hypot(ey);
        if len < f64::EPSILON {
            continue;
        }
        let u = Vec2::new(ex / len, ey / len);
        let v = Vec2::new(-u.y, u.x);

        let (mut min_u, mut max_u) = (f64::MAX, f64::MIN);
        let (mut min_v, mut max_v) = (f64::MAX, f64::MIN);
        for p in hull {
            let (dx, dy) = (p.x - a.x, p.y - a.y);
            let pu = dx * u.x + dy * u.y;
            let pv = dx * v.x + dy * v.y;
            min_u = min_u.min(pu);
            max_u = max_u.max(pu);
            min_v = min_v.min(pv);
            max_v = max_v.max(pv);
        }

        let width = max_u - min_u;
        let height = max_v - min_v;
        let area = width * height;
        if best.as_ref().is_some_and(|(best_area, _)| area >= *best_area) {
            continue;
        }

        let cu = (min_u + max_u) / 2.0;
        let cv = (min_v + max_v) / 2.0;
        let center = Vec2::new(a.x + cu * u.x + cv * v.x, a.y + cu * u.y + cv * v.y);
        best = Some((
            area,
            MinAreaRect {
                center,
                width,
                height,
                angle: reduce_angle(ey.atan2(ex).to_degrees()),
                axis: u,
            },
        ));
    }

    // Every edge is degenerate only if all hull points coincide, which
    // convex_hull already collapses to a single point.
    best.map(|(_, rect)| rect).unwrap_or(MinAreaRect {
        center: hull[0],
        width: 0.0,
        height: 0.0,
        angle: 0.0,
        axis: Vec2::new(1.0, 0.0),
    })
}

/// Reduce an edge direction to `[0, 90)`, snapping float noise on exact angles.
fn reduce_angle(deg: f64) -> f64 {
    let mut a = deg.rem_euclid(90.0);
    if (a - a.round()).abs() < 1e-9 {
        a = a.round();
    }
    if a >= 90.0 { a - 90.0 } else { a }
}

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};

/// A 2D point. The engine works in Y-up millimetres everywhere internally
///; flipping Y is a renderer concern.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    pub fn distance_to(self, other: Point2D) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl Add<Vector2D> for Point2D {
    type Output = Point2D;
    fn add(self, v: Vector2D) -> Point2D {
        Point2D {
            x: self.x + v.x,
            y: self.y + v.y,
        }
    }
}

impl Sub for Point2D {
    type Output = Vector2D;
    fn sub(self, other: Point2D) -> Vector2D {
        Vector2D {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

/// A 2D vector (displacement or tangent/handle direction).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector2D {
    pub x: f64,
    pub y: f64,
}

impl Vector2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn normalized(self) -> Vector2D {
        let len = self.length();
        if len < 1e-12 {
            Vector2D::new(0.0, 0.0)
        } else {
            Vector2D::new(self.x / len, self.y / len)
        }
    }

    /// Rotate by `degrees` counter-clockwise.
    pub fn rotated(self, degrees: f64) -> Vector2D {
        let rad = degrees.to_radians();
        let (s, c) = rad.sin_cos();
        Vector2D::new(self.x * c - self.y * s, self.x * s + self.y * c)
    }

    pub fn angle_degrees(self) -> f64 {
        self.y.atan2(self.x).to_degrees()
    }
}

impl Mul<f64> for Vector2D {
    type Output = Vector2D;
    fn mul(self, scalar: f64) -> Vector2D {
        Vector2D::new(self.x * scalar, self.y * scalar)
    }
}

impl Neg for Vector2D {
    type Output = Vector2D;
    fn neg(self) -> Vector2D {
        Vector2D::new(-self.x, -self.y)
    }
}

impl Add for Vector2D {
    type Output = Vector2D;
    fn add(self, other: Vector2D) -> Vector2D {
        Vector2D::new(self.x + other.x, self.y + other.y)
    }
}

/// An axis-aligned rectangle, origin at the bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Point2D,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(origin: Point2D, width: f64, height: f64) -> Self {
        Self {
            origin,
            width,
            height,
        }
    }

    pub fn min_x(&self) -> f64 {
        self.origin.x
    }
    pub fn min_y(&self) -> f64 {
        self.origin.y
    }
    pub fn max_x(&self) -> f64 {
        self.origin.x + self.width
    }
    pub fn max_y(&self) -> f64 {
        self.origin.y + self.height
    }

    pub fn center(&self) -> Point2D {
        Point2D::new(self.origin.x + self.width / 2.0, self.origin.y + self.height / 2.0)
    }

    /// Grow the rect outward by `margin` on every side.
    pub fn padded(&self, margin: f64) -> Rect {
        Rect::new(
            Point2D::new(self.origin.x - margin, self.origin.y - margin),
            self.width + 2.0 * margin,
            self.height + 2.0 * margin,
        )
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.min_x() < other.max_x()
            && self.max_x() > other.min_x()
            && self.min_y() < other.max_y()
            && self.max_y() > other.min_y()
    }
}

/// A rigid-body transform: rotate then translate, standard 2D composition
/// used by SnapResolver and Flattener to accumulate FootprintReference
/// transforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2D {
    pub translation: Vector2D,
    pub rotation_deg: f64,
}

impl Transform2D {
    pub fn identity() -> Self {
        Self {
            translation: Vector2D::new(0.0, 0.0),
            rotation_deg: 0.0,
        }
    }

    pub fn new(translation: Vector2D, rotation_deg: f64) -> Self {
        Self {
            translation,
            rotation_deg,
        }
    }

    /// Apply this transform to a point: rotate then translate.
    pub fn apply_point(&self, p: Point2D) -> Point2D {
        let v = Vector2D::new(p.x, p.y).rotated(self.rotation_deg);
        Point2D::new(v.x + self.translation.x, v.y + self.translation.y)
    }

    /// Apply this transform to a direction: rotation only, no translation.
    pub fn apply_vector(&self, v: Vector2D) -> Vector2D {
        v.rotated(self.rotation_deg)
    }

    /// Compose `self` then `child`: child's local frame is nested inside
    /// self's, matching the order a FootprintReference descends into a
    /// child footprint (translate by child.xy, rotate by child.angle, both
    /// expressed in the parent's already-accumulated frame).
    pub fn then(&self, child: Transform2D) -> Transform2D {
        let translation = Vector2D::new(
            self.apply_point(Point2D::new(child.translation.x, child.translation.y)).x,
            self.apply_point(Point2D::new(child.translation.x, child.translation.y)).y,
        );
        Transform2D {
            translation,
            rotation_deg: self.rotation_deg + child.rotation_deg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_distance() {
        let a = Point2D::new(0.0, 0.0);
        let b = Point2D::new(3.0, 4.0);
        assert!((a.distance_to(b) - 5.0).abs() < 1e-10);
    }

    #[test]
    fn vector_rotation_quarter_turn() {
        let v = Vector2D::new(1.0, 0.0).rotated(90.0);
        assert!(v.x.abs() < 1e-9);
        assert!((v.y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn transform_compose_matches_snap_example() {
        // root references child translated (10,0) rotated 90deg;
        // child has a point at local (5,0). Expected absolute position (10,5).
        let outer = Transform2D::new(Vector2D::new(10.0, 0.0), 90.0);
        let local = Point2D::new(5.0, 0.0);
        let abs = outer.apply_point(local);
        assert!((abs.x - 10.0).abs() < 1e-9);
        assert!((abs.y - 5.0).abs() < 1e-9);
    }

    #[test]
    fn rect_padded_grows_symmetrically() {
        let r = Rect::new(Point2D::new(0.0, 0.0), 10.0, 10.0);
        let p = r.padded(2.0);
        assert!((p.min_x() - (-2.0)).abs() < 1e-9);
        assert!((p.width - 14.0).abs() < 1e-9);
    }
}

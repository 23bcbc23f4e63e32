use std::ops::{Add, AddAssign, Mul, Sub};

use serde::{Deserialize, Serialize};

/// 2D point/vector in virtual-desktop pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Unit vector, or `None` for a (near-)zero vector so callers are
    /// forced to handle the degenerate case before dividing.
    pub fn normalized(self) -> Option<Self> {
        let len = self.length();
        if len <= f64::EPSILON {
            return None;
        }
        Some(Self {
            x: self.x / len,
            y: self.y / len,
        })
    }
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

/// Avatar footprint in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Screen rectangle in physical pixels (virtual desktop coordinates).
///
/// The tracked game window's rectangle doubles as the simulation boundary:
/// collision surfaces sit at its four edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn center_x(&self) -> f64 {
        self.left + self.width() * 0.5
    }

    pub fn center_y(&self) -> f64 {
        self.top + self.height() * 0.5
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.top && p.y <= self.bottom
    }

    /// Reject non-finite or degenerate rectangles coming off the
    /// platform boundary.
    pub fn sanitize(self) -> Option<Self> {
        if !(self.left.is_finite()
            && self.top.is_finite()
            && self.right.is_finite()
            && self.bottom.is_finite()
            && self.left < self.right
            && self.top < self.bottom)
        {
            return None;
        }
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_rejects_zero_vector() {
        assert!(Vec2::ZERO.normalized().is_none());

        let unit = Vec2::new(3.0, 4.0).normalized().unwrap();
        assert!((unit.x - 0.6).abs() < 1e-12);
        assert!((unit.y - 0.8).abs() < 1e-12);
    }

    #[test]
    fn sanitize_rejects_degenerate_rects() {
        assert!(Rect::new(0.0, 0.0, 800.0, 600.0).sanitize().is_some());
        assert!(Rect::new(100.0, 0.0, 100.0, 600.0).sanitize().is_none());
        assert!(Rect::new(f64::NAN, 0.0, 800.0, 600.0).sanitize().is_none());
        assert!(Rect::new(800.0, 0.0, 0.0, 600.0).sanitize().is_none());
    }

    #[test]
    fn rect_accessors() {
        let r = Rect::new(10.0, 20.0, 110.0, 220.0);
        assert_eq!(r.width(), 100.0);
        assert_eq!(r.height(), 200.0);
        assert_eq!(r.center_x(), 60.0);
        assert_eq!(r.center_y(), 120.0);
        assert!(r.contains(Vec2::new(50.0, 50.0)));
        assert!(!r.contains(Vec2::new(5.0, 50.0)));
    }
}

//! Geometric primitives used by the patch model and the arranger.

use serde::{Deserialize, Serialize};

/// A position on a canvas, in screen pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    x: f32,
    y: f32,
}

impl Point {
    /// Creates a new point with the specified coordinates
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the x-coordinate of the point
    pub fn x(self) -> f32 {
        self.x
    }

    /// Returns the y-coordinate of the point
    pub fn y(self) -> f32 {
        self.y
    }

    /// Returns a copy with the x-coordinate replaced
    pub fn with_x(self, x: f32) -> Self {
        Self { x, ..self }
    }

    /// Returns a copy with the y-coordinate replaced
    pub fn with_y(self, y: f32) -> Self {
        Self { y, ..self }
    }

    /// Adds another point to this point, returning a new point
    pub fn add_point(self, other: Point) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    /// Multiplies both coordinates by the given factor
    pub fn scale(self, factor: f32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }
}

/// Represents the dimensions of an element with width and height
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    width: f32,
    height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Returns the width dimension of this size
    pub fn width(self) -> f32 {
        self.width
    }

    /// Returns the height dimension of this size
    pub fn height(self) -> f32 {
        self.height
    }

    /// Returns a new Size with the maximum width and height between this size and another
    pub fn max(self, other: Size) -> Self {
        Self {
            width: self.width.max(other.width),
            height: self.height.max(other.height),
        }
    }

    /// Returns true if both width and height are zero
    pub fn is_zero(self) -> bool {
        self.width == 0.0 && self.height == 0.0
    }
}

/// A rectangle given by two corners, as written in graph and coords
/// statements (`x1 y1 x2 y2`).
///
/// The corners are kept as written: a value range may well have `y1 > y2`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Area {
    start: Point,
    end: Point,
}

impl Area {
    pub fn new(start: Point, end: Point) -> Self {
        Self {
            start,
            end,
        }
    }

    /// Builds an area from the four values in statement order.
    pub fn from_values(values: [f32; 4]) -> Self {
        Self {
            start: Point::new(values[0], values[1]),
            end: Point::new(values[2], values[3]),
        }
    }

    /// The first corner.
    pub fn start(self) -> Point {
        self.start
    }

    /// The second corner.
    pub fn end(self) -> Point {
        self.end
    }

    /// The four values in statement order.
    pub fn values(self) -> [f32; 4] {
        [self.start.x, self.start.y, self.end.x, self.end.y]
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn test_point_add_and_scale() {
        let p = Point::new(10.0, 20.0).add_point(Point::new(5.0, -5.0));
        assert_approx_eq!(f32, p.x(), 15.0);
        assert_approx_eq!(f32, p.y(), 15.0);

        let scaled = p.scale(2.0);
        assert_approx_eq!(f32, scaled.x(), 30.0);
        assert_approx_eq!(f32, scaled.y(), 30.0);
    }

    #[test]
    fn test_point_with_coordinate() {
        let p = Point::new(1.0, 2.0);
        assert_eq!(p.with_x(7.0), Point::new(7.0, 2.0));
        assert_eq!(p.with_y(7.0), Point::new(1.0, 7.0));
    }

    #[test]
    fn test_size_max() {
        let size = Size::new(10.0, 40.0).max(Size::new(30.0, 20.0));
        assert_approx_eq!(f32, size.width(), 30.0);
        assert_approx_eq!(f32, size.height(), 40.0);
        assert!(Size::default().is_zero());
    }

    #[test]
    fn test_area_keeps_statement_order() {
        let area = Area::from_values([0.0, 1.0, 100.0, -1.0]);
        assert_eq!(area.values(), [0.0, 1.0, 100.0, -1.0]);
        assert_eq!(area.start(), Point::new(0.0, 1.0));
        assert_eq!(area.end(), Point::new(100.0, -1.0));
    }
}

/// 2D point with sub-pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// X coordinate
    pub x: f32,
    /// Y coordinate
    pub y: f32,
}

impl Point {
    /// Create a new point
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point) -> f32 {
        self.distance_squared(other).sqrt()
    }

    /// Squared distance (no sqrt)
    pub fn distance_squared(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Vector from `self` to `other`
    pub fn to(&self, other: &Point) -> Point {
        Point::new(other.x - self.x, other.y - self.y)
    }

    /// `self + v * t`
    pub fn offset(&self, v: &Point, t: f32) -> Point {
        Point::new(self.x + v.x * t, self.y + v.y * t)
    }

    /// Z component of the cross product of two vectors
    pub fn cross(&self, other: &Point) -> f32 {
        self.x * other.y - self.y * other.x
    }

    /// Dot product of two vectors
    pub fn dot(&self, other: &Point) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Vector length
    pub fn norm(&self) -> f32 {
        self.dot(self).sqrt()
    }
}

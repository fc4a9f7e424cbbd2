/// BoundingBox represents an axis-aligned rectangle in integer pixel
/// coordinates, stored as its top-left and bottom-right corners. A
/// well-formed box satisfies `x1 < x2` and `y1 < y2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    /// Left edge of the bounding box (i.e. min-x)
    x1: i32,
    /// Top edge of the bounding box (i.e. min-y)
    y1: i32,
    /// Right edge of the bounding box (i.e. max-x)
    x2: i32,
    /// Bottom edge of the bounding box (i.e. max-y)
    y2: i32,
}

impl BoundingBox {
    /// Returns a new BoundingBox
    ///
    /// # Parameters
    ///
    /// * `x1`: Bounding box left edge.
    /// * `y1`: Bounding box top edge.
    /// * `x2`: Bounding box right edge.
    /// * `y2`: Bounding box bottom edge.
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> BoundingBox {
        BoundingBox { x1, y1, x2, y2 }
    }

    /// Returns the left edge of the bounding box
    pub fn x1(&self) -> i32 {
        self.x1
    }

    /// Returns the top edge of the bounding box
    pub fn y1(&self) -> i32 {
        self.y1
    }

    /// Returns the right edge of the bounding box
    pub fn x2(&self) -> i32 {
        self.x2
    }

    /// Returns the bottom edge of the bounding box
    pub fn y2(&self) -> i32 {
        self.y2
    }

    /// Returns the width of the bounding box
    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    /// Returns the height of the bounding box
    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    /// Returns the area of the bounding box
    pub fn area(&self) -> i64 {
        self.width() as i64 * self.height() as i64
    }

    /// Returns the horizontal centroid, rounded down to whole pixels
    pub fn center_x(&self) -> i32 {
        (self.x1 + self.x2) / 2
    }

    /// Returns the vertical centroid, rounded down to whole pixels
    pub fn center_y(&self) -> i32 {
        (self.y1 + self.y2) / 2
    }

    /// Returns true when the box has no positive extent on either axis
    pub fn is_degenerate(&self) -> bool {
        self.x2 <= self.x1 || self.y2 <= self.y1
    }
}

/// Direction of travel that is counted when a centroid crosses the line.
///
/// The scan direction of the slide video is an external contract, so the
/// counted direction is configuration rather than a constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossingDirection {
    RightToLeft,
    LeftToRight,
}

/// CountingLine is the fixed vertical pixel boundary used for counting.
#[derive(Debug, Clone, Copy)]
pub struct CountingLine {
    /// Horizontal pixel position of the line.
    x: i32,
    /// The direction of travel that fires a crossing.
    direction: CrossingDirection,
}

impl CountingLine {
    /// Returns a new CountingLine
    ///
    /// # Parameters
    ///
    /// * `x`: Horizontal pixel position of the line.
    /// * `direction`: The direction of travel that fires a crossing.
    pub fn new(x: i32, direction: CrossingDirection) -> CountingLine {
        CountingLine { x, direction }
    }

    /// Returns the horizontal position of the line
    pub fn x(&self) -> i32 {
        self.x
    }

    /// Returns the counted direction
    pub fn direction(&self) -> CrossingDirection {
        self.direction
    }

    /// Returns true when a centroid moving from `prev_center_x` to
    /// `curr_center_x` crossed the line in the counted direction. Motion that
    /// stays on one side, or moves against the counted direction, never
    /// fires.
    pub fn crossed(&self, prev_center_x: i32, curr_center_x: i32) -> bool {
        match self.direction {
            CrossingDirection::RightToLeft => prev_center_x > self.x && curr_center_x <= self.x,
            CrossingDirection::LeftToRight => prev_center_x < self.x && curr_center_x >= self.x,
        }
    }

    /// Returns true when a first-seen centroid already lies at or past the
    /// line on the counted side. Such an object is assumed to have crossed
    /// before entering the frame and must never be counted.
    pub fn starts_beyond(&self, center_x: i32) -> bool {
        match self.direction {
            CrossingDirection::RightToLeft => center_x <= self.x,
            CrossingDirection::LeftToRight => center_x >= self.x,
        }
    }
}

use std::hash::{Hash, Hasher};

use crate::BoundingBox;

/// A single counted identity followed across consecutive frames.
///
/// A track records every position it was matched at, whether it has already
/// been counted (`crossed`), and how many consecutive frames have passed
/// since it was last matched (`disappeared`). The `found` flag is only
/// meaningful within one frame: it is cleared at the start of each frame and
/// set when the track matches a detection, which also caps each track at one
/// match per frame.
#[derive(Debug)]
pub struct Track {
    /// A unique track identifier, never reused within a run.
    track_id: usize,
    /// Detector class identifier, fixed at creation.
    class_id: usize,
    /// Matched positions, append-only, one per matched frame.
    positions: Vec<BoundingBox>,
    /// Whether the track has been counted. Monotone false to true.
    crossed: bool,
    /// Consecutive frames since the last match.
    disappeared: usize,
    /// Whether the track matched a detection in the current frame.
    found: bool,
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.track_id == other.track_id
    }
}

impl Eq for Track {}

impl Hash for Track {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.track_id.hash(state);
    }
}

impl Track {
    /// Returns a new Track seeded with its first observed position.
    ///
    /// # Parameters
    ///
    /// * `track_id`: A unique track identifier.
    /// * `class_id`: The detector class identifier, immutable thereafter.
    /// * `bbox`: The first observed position.
    /// * `crossed`: Whether the track starts on the far side of the counting
    ///   line and must never be counted.
    pub(crate) fn new(track_id: usize, class_id: usize, bbox: BoundingBox, crossed: bool) -> Track {
        Track {
            track_id,
            class_id,
            positions: vec![bbox],
            crossed,
            disappeared: 0,
            found: true,
        }
    }

    /// Return the identifier of the track
    pub fn track_id(&self) -> usize {
        self.track_id
    }

    /// Return the class identifier of the track
    pub fn class_id(&self) -> usize {
        self.class_id
    }

    /// Return every matched position of the track, oldest first
    pub fn positions(&self) -> &[BoundingBox] {
        &self.positions
    }

    /// Return the most recent matched position
    pub fn last_position(&self) -> BoundingBox {
        self.positions[self.positions.len() - 1]
    }

    /// Return the position from the previous matched frame, if the track has
    /// been matched more than once
    pub fn previous_position(&self) -> Option<BoundingBox> {
        self.positions
            .len()
            .checked_sub(2)
            .map(|index| self.positions[index])
    }

    /// Return whether the track has already been counted
    pub fn is_crossed(&self) -> bool {
        self.crossed
    }

    /// Return the consecutive missed-frame count
    pub fn disappeared(&self) -> usize {
        self.disappeared
    }

    /// Return whether the track matched a detection in the current frame
    pub fn is_found(&self) -> bool {
        self.found
    }

    /// Clear the per-frame match flag. Called once per track at the start of
    /// every frame.
    pub(crate) fn begin_frame(&mut self) {
        self.found = false;
    }

    /// Record a matched detection position for the current frame.
    pub(crate) fn update(&mut self, bbox: BoundingBox) {
        self.positions.push(bbox);
        self.found = true;
        self.disappeared = 0;
    }

    /// Advance the missed-frame counter for an unmatched frame.
    pub(crate) fn mark_missed(&mut self) {
        self.disappeared += 1;
    }

    /// Latch the counted flag. Irreversible.
    pub(crate) fn mark_crossed(&mut self) {
        self.crossed = true;
    }
}

#[cfg(test)]
mod tests {
    use crate::*;

    #[test]
    fn update_resets_disappearance() {
        let mut track = Track::new(0, 1, BoundingBox::new(0, 0, 10, 10), false);
        track.begin_frame();
        track.mark_missed();
        track.begin_frame();
        track.mark_missed();
        assert_eq!(track.disappeared(), 2);
        assert!(!track.is_found());

        track.begin_frame();
        track.update(BoundingBox::new(1, 1, 11, 11));
        assert_eq!(track.disappeared(), 0);
        assert!(track.is_found());
        assert_eq!(track.positions().len(), 2);
    }

    #[test]
    fn previous_position_needs_two_entries() {
        let mut track = Track::new(0, 1, BoundingBox::new(0, 0, 10, 10), false);
        assert!(track.previous_position().is_none());

        track.update(BoundingBox::new(5, 0, 15, 10));
        assert_eq!(track.previous_position(), Some(BoundingBox::new(0, 0, 10, 10)));
        assert_eq!(track.last_position(), BoundingBox::new(5, 0, 15, 10));
    }

    #[test]
    fn crossed_is_latched() {
        let mut track = Track::new(0, 1, BoundingBox::new(0, 0, 10, 10), false);
        assert!(!track.is_crossed());
        track.mark_crossed();
        assert!(track.is_crossed());
    }
}

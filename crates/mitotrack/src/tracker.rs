use crate::*;
use anyhow::Result;
use tracing::{debug, info};

/// This is the line-crossing multi-target tracker.
///
/// The tracker owns the whole per-run state: the track store, the id
/// allocator, the tally and the event list. It is strictly
/// frame-synchronous: one call to [`Tracker::update`] processes exactly one
/// frame (association, lifecycle, crossing detection, tally), and callers
/// must supply frames in monotonically increasing order because eviction and
/// crossing detection are order dependent.
///
/// Association is greedy and per-detection: each detection, in detector
/// output order, takes the unmatched same-class track with the highest IoU
/// strictly above the match threshold, first-encountered winning ties. A
/// later, better-matching detection never steals an already matched track.
/// This is a deliberate design choice, not a bug; changing it to a globally
/// optimal assignment would change observable counts.
///
/// # Examples
///
/// ```
/// use mitotrack::{BoundingBox, Detection, Tracker};
///
/// // the counting line defaults to the frame midpoint, here x = 500
/// let mut tracker = Tracker::new(1000, 800);
///
/// // frame 0: a figure right of the line
/// tracker
///     .update(vec![Detection::new(
///         None,
///         BoundingBox::new(440, 300, 600, 400),
///         1,
///         0.9,
///     )])
///     .unwrap();
///
/// // frame 1: the same figure, now left of the line
/// let fired = tracker
///     .update(vec![Detection::new(
///         None,
///         BoundingBox::new(400, 300, 560, 400),
///         1,
///         0.9,
///     )])
///     .unwrap();
///
/// assert_eq!(fired.len(), 1);
/// assert_eq!(tracker.tally().mitotic(), 1);
/// ```
#[derive(Debug)]
pub struct Tracker {
    /// Frame height in pixels; fixes the vertical validity band.
    frame_height: i32,
    /// Detections below this confidence are discarded entirely.
    confidence_threshold: f32,
    /// Minimum IoU for associating a detection with a live track.
    iou_threshold: f32,
    /// Consecutive missed frames a track survives before eviction.
    max_disappeared: usize,
    /// Fraction of the frame height excluded at the top and bottom edges.
    band_margin_ratio: f32,
    /// The vertical reference line and counted direction.
    line: CountingLine,
    /// Mapping from detector class ids to figure categories.
    class_map: ClassMap,
    /// The list of live tracks, in creation order.
    tracks: Vec<Track>,
    /// Used to allocate identifiers to new tracks.
    next_id: usize,
    /// Per-class crossing counts.
    tally: Tally,
    /// Every crossing event fired so far, in firing order.
    events: Vec<CrossingEvent>,
    /// Index of the next frame to process.
    frame_index: usize,
}

impl Tracker {
    /// Returns a new Tracker for frames of the given dimensions.
    ///
    /// The reference line defaults to the horizontal midpoint with
    /// right-to-left counting, the confidence threshold to `0.70`, the IoU
    /// match threshold to `0.30`, the disappearance eviction threshold to
    /// `15` frames and the vertical validity band to 5% top and bottom
    /// margins.
    ///
    /// # Parameters
    ///
    /// * `frame_width`: Frame width in pixels.
    /// * `frame_height`: Frame height in pixels.
    pub fn new(frame_width: i32, frame_height: i32) -> Tracker {
        Tracker {
            frame_height,
            confidence_threshold: 0.70,
            iou_threshold: 0.30,
            max_disappeared: 15,
            band_margin_ratio: 0.05,
            line: CountingLine::new(frame_width / 2, CrossingDirection::RightToLeft),
            class_map: ClassMap::default(),
            tracks: Vec::new(),
            next_id: 0,
            tally: Tally::default(),
            events: Vec::new(),
            frame_index: 0,
        }
    }

    /// Set the confidence threshold
    pub fn with_confidence_threshold(&mut self, confidence_threshold: f32) -> &mut Self {
        self.confidence_threshold = confidence_threshold;
        self
    }

    /// Set the IoU match threshold
    pub fn with_iou_threshold(&mut self, iou_threshold: f32) -> &mut Self {
        self.iou_threshold = iou_threshold;
        self
    }

    /// Set the disappearance eviction threshold
    pub fn with_max_disappeared(&mut self, max_disappeared: usize) -> &mut Self {
        self.max_disappeared = max_disappeared;
        self
    }

    /// Set the vertical validity band margin as a fraction of frame height
    pub fn with_band_margin_ratio(&mut self, band_margin_ratio: f32) -> &mut Self {
        self.band_margin_ratio = band_margin_ratio;
        self
    }

    /// Set the counting line
    pub fn with_line(&mut self, line: CountingLine) -> &mut Self {
        self.line = line;
        self
    }

    /// Set the class map
    pub fn with_class_map(&mut self, class_map: ClassMap) -> &mut Self {
        self.class_map = class_map;
        self
    }

    /// Return the live tracks, in creation order
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Return the per-class crossing counts
    pub fn tally(&self) -> Tally {
        self.tally
    }

    /// Return every crossing event fired so far, in firing order
    pub fn events(&self) -> &[CrossingEvent] {
        &self.events
    }

    /// Return the index of the next frame to process
    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    /// Process one frame of detections.
    ///
    /// Detections that are malformed, below the confidence threshold, or
    /// entirely outside the vertical validity band leave no trace on the
    /// track store. Every surviving detection either updates the best
    /// matching unmatched track of its class or registers a new one. The
    /// end-of-frame sweep then advances disappearance counters and evicts
    /// expired tracks.
    ///
    /// # Parameters
    ///
    /// * `detections`: The detector output for this frame, in detector
    ///   order.
    ///
    /// # Returns
    ///
    /// The crossing events fired by this frame, in firing order. Each track
    /// fires at most one event over its whole lifetime.
    pub fn update(&mut self, detections: Vec<Detection>) -> Result<Vec<CrossingEvent>> {
        for track in &mut self.tracks {
            track.begin_frame();
        }

        let mut fired = Vec::new();
        for detection in detections {
            if !detection.is_well_formed()
                || detection.confidence() < self.confidence_threshold
                || self.outside_band(&detection.bbox())
            {
                continue;
            }

            match self.best_match(&detection) {
                Some(index) => {
                    if let Some(event) = self.associate(index, &detection) {
                        fired.push(event);
                    }
                }
                None => self.register(&detection),
            }
        }

        self.sweep();
        self.frame_index += 1;
        Ok(fired)
    }

    /// Advance one frame for which the detector produced no usable output.
    ///
    /// This is the documented detector-failure policy: the frame contributes
    /// no detections, but the disappearance sweep still runs so that track
    /// lifetimes stay aligned with the frame stream. Preserving forward
    /// progress is preferred over aborting the stream.
    pub fn skip_frame(&mut self) {
        for track in &mut self.tracks {
            track.begin_frame();
        }
        self.sweep();
        self.frame_index += 1;
    }

    /// A detection is skipped when its box lies entirely inside the excluded
    /// top or bottom margin, where edge artifacts of the scan window appear.
    fn outside_band(&self, bbox: &BoundingBox) -> bool {
        let gap = (self.frame_height as f32 * self.band_margin_ratio) as i32;
        bbox.y2() < gap || bbox.y1() > self.frame_height - gap
    }

    /// Greedy candidate selection: the unmatched same-class track with the
    /// highest IoU strictly above the threshold. Both comparisons are
    /// strictly greater, so the first candidate encountered wins ties.
    fn best_match(&self, detection: &Detection) -> Option<usize> {
        let candidates = self
            .tracks
            .iter()
            .enumerate()
            .filter(|(_, track)| !track.is_found() && track.class_id() == detection.class_id())
            .map(|(index, _)| index)
            .collect::<Vec<_>>();
        if candidates.is_empty() {
            return None;
        }

        let last_positions = candidates
            .iter()
            .map(|&index| self.tracks[index].last_position())
            .collect::<Vec<_>>();
        let scores =
            iou_matching::intersection_over_union_candidates(&detection.bbox(), &last_positions);

        let mut best: Option<(usize, f32)> = None;
        for (&candidate, &score) in candidates.iter().zip(scores.iter()) {
            if score > self.iou_threshold && best.map_or(true, |(_, best_score)| score > best_score)
            {
                best = Some((candidate, score));
            }
        }
        best.map(|(index, _)| index)
    }

    /// Update a matched track and run crossing detection on its last two
    /// positions. Fires at most once per track lifetime.
    fn associate(&mut self, index: usize, detection: &Detection) -> Option<CrossingEvent> {
        let track = &mut self.tracks[index];
        track.update(detection.bbox());

        if track.is_crossed() {
            return None;
        }
        let prev = track.previous_position()?;
        let curr = track.last_position();
        if !self.line.crossed(prev.center_x(), curr.center_x()) {
            return None;
        }

        track.mark_crossed();
        let class = self.class_map.label(track.class_id());
        let sequence_number = self.tally.record(class);
        let event = CrossingEvent {
            frame_index: self.frame_index,
            class,
            confidence: detection.confidence(),
            sequence_number,
        };
        info!(
            track_id = track.track_id(),
            frame = self.frame_index,
            class = class.as_str(),
            count = sequence_number,
            "figure crossed the line"
        );
        self.events.push(event.clone());
        Some(event)
    }

    /// Register a new track for an unmatched detection. A track whose first
    /// centroid already lies past the line is created pre-crossed so it is
    /// never counted when it moves further across.
    fn register(&mut self, detection: &Detection) {
        let crossed = self.line.starts_beyond(detection.bbox().center_x());
        if crossed {
            debug!(
                track_id = self.next_id,
                "track first seen past the line, marked already crossed"
            );
        }
        self.tracks.push(Track::new(
            self.next_id,
            detection.class_id(),
            detection.bbox(),
            crossed,
        ));
        self.next_id += 1;
    }

    /// End-of-frame sweep: advance disappearance counters for unmatched
    /// tracks and evict every track past the threshold. Eviction is
    /// unconditional and has no recovery path.
    fn sweep(&mut self) {
        for track in &mut self.tracks {
            if !track.is_found() {
                track.mark_missed();
            }
        }
        let max_disappeared = self.max_disappeared;
        self.tracks.retain(|track| {
            let keep = track.disappeared() <= max_disappeared;
            if !keep {
                debug!(
                    track_id = track.track_id(),
                    disappeared = track.disappeared(),
                    "track evicted"
                );
            }
            keep
        });
    }
}

#[cfg(test)]
mod tests {
    use crate::*;
    use anyhow::Result;

    fn det(x1: i32, y1: i32, x2: i32, y2: i32, class_id: usize, confidence: f32) -> Detection {
        Detection::new(None, BoundingBox::new(x1, y1, x2, y2), class_id, confidence)
    }

    #[test]
    fn counts_one_crossing_right_to_left() -> Result<()> {
        let mut tracker = Tracker::new(1000, 800);

        // frame 0: centroid x = 520, right of the line at 500
        let fired = tracker.update(vec![det(440, 300, 600, 400, 1, 0.9)])?;
        assert!(fired.is_empty());

        // frame 1: centroid x = 480, the crossing fires
        let fired = tracker.update(vec![det(400, 300, 560, 400, 1, 0.9)])?;
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].class, FigureClass::Mitotic);
        assert_eq!(fired[0].frame_index, 1);
        assert_eq!(fired[0].sequence_number, 1);
        assert_eq!(fired[0].confidence, 0.9);
        assert_eq!(tracker.tally().mitotic(), 1);

        // frame 2: moving further left never fires again
        let fired = tracker.update(vec![det(360, 300, 520, 400, 1, 0.9)])?;
        assert!(fired.is_empty());
        assert_eq!(tracker.tally().mitotic(), 1);
        assert_eq!(tracker.events().len(), 1);

        Ok(())
    }

    #[test]
    fn first_sighting_past_the_line_is_never_counted() -> Result<()> {
        let mut tracker = Tracker::new(1000, 800);

        // first-seen centroid at x = 400, already left of the line
        tracker.update(vec![det(340, 300, 460, 400, 1, 0.9)])?;
        assert!(tracker.tracks()[0].is_crossed());

        // moving further left fires nothing
        tracker.update(vec![det(300, 300, 420, 400, 1, 0.9)])?;
        tracker.update(vec![det(260, 300, 380, 400, 1, 0.9)])?;
        assert_eq!(tracker.tally().total(), 0);
        assert!(tracker.events().is_empty());

        Ok(())
    }

    #[test]
    fn returning_across_the_line_is_not_counted_twice() -> Result<()> {
        let mut tracker = Tracker::new(1000, 800);

        // cross right to left, then drift back right and cross again
        tracker.update(vec![det(440, 300, 600, 400, 1, 0.9)])?;
        let fired = tracker.update(vec![det(400, 300, 560, 400, 1, 0.9)])?;
        assert_eq!(fired.len(), 1);
        tracker.update(vec![det(440, 300, 600, 400, 1, 0.9)])?;
        let fired = tracker.update(vec![det(400, 300, 560, 400, 1, 0.9)])?;
        assert!(fired.is_empty());
        assert_eq!(tracker.tally().mitotic(), 1);

        Ok(())
    }

    #[test]
    fn left_to_right_motion_never_fires_by_default() -> Result<()> {
        let mut tracker = Tracker::new(1000, 800);

        // starts left of the line (pre-crossed), moves right across it, then
        // back left again: no event either way
        tracker.update(vec![det(400, 300, 560, 400, 1, 0.9)])?;
        tracker.update(vec![det(440, 300, 600, 400, 1, 0.9)])?;
        tracker.update(vec![det(400, 300, 560, 400, 1, 0.9)])?;
        assert_eq!(tracker.tally().total(), 0);

        Ok(())
    }

    #[test]
    fn counted_direction_is_configurable() -> Result<()> {
        let mut tracker = Tracker::new(1000, 800);
        tracker.with_line(CountingLine::new(500, CrossingDirection::LeftToRight));

        tracker.update(vec![det(400, 300, 560, 400, 1, 0.9)])?;
        let fired = tracker.update(vec![det(440, 300, 600, 400, 1, 0.9)])?;
        assert_eq!(fired.len(), 1);
        assert_eq!(tracker.tally().mitotic(), 1);

        Ok(())
    }

    #[test]
    fn low_confidence_detections_leave_no_trace() -> Result<()> {
        let mut tracker = Tracker::new(1000, 800);

        tracker.update(vec![det(600, 300, 700, 400, 1, 0.5)])?;
        assert!(tracker.tracks().is_empty());

        // just below the threshold still discarded, at the threshold kept
        tracker.update(vec![det(600, 300, 700, 400, 1, 0.6999)])?;
        assert!(tracker.tracks().is_empty());
        tracker.update(vec![det(600, 300, 700, 400, 1, 0.70)])?;
        assert_eq!(tracker.tracks().len(), 1);

        Ok(())
    }

    #[test]
    fn malformed_detections_are_silently_excluded() -> Result<()> {
        let mut tracker = Tracker::new(1000, 800);

        tracker.update(vec![
            det(600, 300, 700, 400, 1, 1.5),
            det(700, 400, 700, 500, 1, 0.9),
            det(600, 500, 700, 450, 1, 0.9),
        ])?;
        assert!(tracker.tracks().is_empty());

        Ok(())
    }

    #[test]
    fn edge_band_detections_are_skipped() -> Result<()> {
        // height 800 gives a 40 px margin top and bottom
        let mut tracker = Tracker::new(1000, 800);

        // entirely above the top margin
        tracker.update(vec![det(600, 0, 660, 30, 1, 0.9)])?;
        // entirely below the bottom margin
        tracker.update(vec![det(600, 770, 660, 799, 1, 0.9)])?;
        assert!(tracker.tracks().is_empty());

        // straddling the margin is kept
        tracker.update(vec![det(600, 20, 660, 90, 1, 0.9)])?;
        assert_eq!(tracker.tracks().len(), 1);

        Ok(())
    }

    #[test]
    fn disappearance_resets_on_rematch() -> Result<()> {
        let mut tracker = Tracker::new(1000, 800);

        tracker.update(vec![det(600, 300, 700, 400, 0, 0.9)])?;
        for expected in 1..=3 {
            tracker.update(vec![])?;
            assert_eq!(tracker.tracks()[0].disappeared(), expected);
        }

        tracker.update(vec![det(600, 300, 700, 400, 0, 0.9)])?;
        assert_eq!(tracker.tracks()[0].disappeared(), 0);
        assert_eq!(tracker.tracks()[0].positions().len(), 2);

        Ok(())
    }

    #[test]
    fn evicts_after_threshold_and_never_reuses_ids() -> Result<()> {
        let mut tracker = Tracker::new(1000, 800);

        tracker.update(vec![det(600, 300, 700, 400, 0, 0.9)])?;
        let first_id = tracker.tracks()[0].track_id();

        // 15 missed frames: still live
        for _ in 0..15 {
            tracker.update(vec![])?;
        }
        assert_eq!(tracker.tracks().len(), 1);
        assert_eq!(tracker.tracks()[0].disappeared(), 15);

        // the 16th missed frame exceeds the threshold
        tracker.update(vec![])?;
        assert!(tracker.tracks().is_empty());

        // the same box seen again becomes a fresh identity
        tracker.update(vec![det(600, 300, 700, 400, 0, 0.9)])?;
        assert_ne!(tracker.tracks()[0].track_id(), first_id);
        assert_eq!(tracker.tracks()[0].track_id(), first_id + 1);

        Ok(())
    }

    #[test]
    fn tracks_only_match_their_own_class() -> Result<()> {
        let mut tracker = Tracker::new(1000, 800);

        tracker.update(vec![det(600, 300, 700, 400, 1, 0.9)])?;
        // identical box, different class: a second track is registered
        tracker.update(vec![det(600, 300, 700, 400, 0, 0.9)])?;
        assert_eq!(tracker.tracks().len(), 2);
        assert_eq!(tracker.tracks()[0].class_id(), 1);
        assert_eq!(tracker.tracks()[1].class_id(), 0);

        Ok(())
    }

    #[test]
    fn greedy_tie_break_is_first_encountered() -> Result<()> {
        let mut tracker = Tracker::new(1000, 800);

        // two tracks whose last positions overlap the next detection equally
        tracker.update(vec![
            det(600, 300, 700, 400, 0, 0.9),
            det(620, 300, 720, 400, 0, 0.9),
        ])?;

        // equidistant detection: the earlier-created track wins the tie
        tracker.update(vec![det(610, 300, 710, 400, 0, 0.9)])?;
        assert_eq!(tracker.tracks()[0].positions().len(), 2);
        assert_eq!(tracker.tracks()[1].positions().len(), 1);
        assert_eq!(tracker.tracks()[1].disappeared(), 1);

        Ok(())
    }

    #[test]
    fn a_track_matches_at_most_once_per_frame() -> Result<()> {
        let mut tracker = Tracker::new(1000, 800);

        tracker.update(vec![det(600, 300, 700, 400, 0, 0.9)])?;
        // two strong candidates in one frame: the second starts a new track
        tracker.update(vec![
            det(605, 300, 705, 400, 0, 0.9),
            det(610, 300, 710, 400, 0, 0.9),
        ])?;
        assert_eq!(tracker.tracks().len(), 2);
        assert_eq!(tracker.tracks()[0].positions().len(), 2);

        Ok(())
    }

    #[test]
    fn skip_frame_runs_the_sweep_only() -> Result<()> {
        let mut tracker = Tracker::new(1000, 800);

        tracker.update(vec![det(600, 300, 700, 400, 0, 0.9)])?;
        for _ in 0..16 {
            tracker.skip_frame();
        }
        assert!(tracker.tracks().is_empty());
        assert_eq!(tracker.frame_index(), 17);
        assert_eq!(tracker.tally().total(), 0);

        Ok(())
    }

    #[test]
    fn tally_matches_emitted_events() -> Result<()> {
        let mut tracker = Tracker::new(1000, 800);

        // one mitotic and one non-mitotic figure crossing on the same frames
        tracker.update(vec![
            det(440, 300, 600, 400, 1, 0.9),
            det(440, 500, 600, 600, 0, 0.8),
        ])?;
        tracker.update(vec![
            det(400, 300, 560, 400, 1, 0.9),
            det(400, 500, 560, 600, 0, 0.8),
        ])?;

        let mitotic_events = tracker
            .events()
            .iter()
            .filter(|event| event.class == FigureClass::Mitotic)
            .count();
        let non_mitotic_events = tracker
            .events()
            .iter()
            .filter(|event| event.class == FigureClass::NonMitotic)
            .count();
        assert_eq!(tracker.tally().mitotic(), mitotic_events);
        assert_eq!(tracker.tally().non_mitotic(), non_mitotic_events);
        assert_eq!(tracker.tally().total(), 2);

        Ok(())
    }

    #[test]
    fn class_map_controls_the_counted_category() -> Result<()> {
        let mut tracker = Tracker::new(1000, 800);
        tracker.with_class_map(ClassMap::new(0));

        tracker.update(vec![det(440, 300, 600, 400, 0, 0.9)])?;
        let fired = tracker.update(vec![det(400, 300, 560, 400, 0, 0.9)])?;
        assert_eq!(fired[0].class, FigureClass::Mitotic);
        assert_eq!(tracker.tally().mitotic(), 1);
        assert_eq!(tracker.tally().non_mitotic(), 0);

        Ok(())
    }
}

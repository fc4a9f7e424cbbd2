/// Figure category after applying the class map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FigureClass {
    Mitotic,
    NonMitotic,
}

impl FigureClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mitotic => "mitotic",
            Self::NonMitotic => "non_mitotic",
        }
    }
}

/// ClassMap maps the detector's numeric class id onto figure categories.
///
/// Detector label ordering is an external contract that can change between
/// model exports, so the mapping is injected at construction rather than
/// hard-coded into the counting logic. The default maps class id `1` to
/// mitotic.
#[derive(Debug, Clone, Copy)]
pub struct ClassMap {
    mitotic_class_id: usize,
}

impl Default for ClassMap {
    fn default() -> Self {
        ClassMap {
            mitotic_class_id: 1,
        }
    }
}

impl ClassMap {
    /// Returns a new ClassMap
    ///
    /// # Parameters
    ///
    /// * `mitotic_class_id`: The detector class id that labels mitotic
    ///   figures; every other class id labels non-mitotic figures.
    pub fn new(mitotic_class_id: usize) -> ClassMap {
        ClassMap { mitotic_class_id }
    }

    /// Returns the figure category for a detector class id
    pub fn label(&self, class_id: usize) -> FigureClass {
        if class_id == self.mitotic_class_id {
            FigureClass::Mitotic
        } else {
            FigureClass::NonMitotic
        }
    }
}

/// CrossingEvent records one counted line crossing.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossingEvent {
    /// Frame index at which the crossing fired.
    pub frame_index: usize,
    /// Figure category of the counted track.
    pub class: FigureClass,
    /// Confidence of the detection that triggered the crossing.
    pub confidence: f32,
    /// Per-class running count at the time of the event, starting at 1.
    pub sequence_number: usize,
}

/// Tally accumulates per-class crossing counts. Counters only increase.
#[derive(Debug, Default, Clone, Copy)]
pub struct Tally {
    mitotic: usize,
    non_mitotic: usize,
}

impl Tally {
    /// Returns the mitotic figure count
    pub fn mitotic(&self) -> usize {
        self.mitotic
    }

    /// Returns the non-mitotic figure count
    pub fn non_mitotic(&self) -> usize {
        self.non_mitotic
    }

    /// Returns the combined figure count
    pub fn total(&self) -> usize {
        self.mitotic + self.non_mitotic
    }

    /// Increment the counter for one figure class and return the
    /// post-increment per-class count, used as the event sequence number.
    pub(crate) fn record(&mut self, class: FigureClass) -> usize {
        match class {
            FigureClass::Mitotic => {
                self.mitotic += 1;
                self.mitotic
            }
            FigureClass::NonMitotic => {
                self.non_mitotic += 1;
                self.non_mitotic
            }
        }
    }
}

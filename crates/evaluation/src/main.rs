use anyhow::{Context, Result};
use clap::Parser;
use mitotrack::{hpf, BoundingBox, ClassMap, Detection, Tracker};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// One detector output row in the input CSV.
#[derive(Debug, Deserialize)]
struct DetectionRecord {
    frame: usize,
    class_id: usize,
    confidence: f32,
    x1: i32,
    y1: i32,
    x2: i32,
    y2: i32,
}

/// Replay per-frame detection records through the line-crossing tracker and
/// report crossing events and the final tally.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// CSV file of detections with header frame,class_id,confidence,x1,y1,x2,y2
    #[arg(short, long)]
    input: PathBuf,

    /// Frame width in pixels
    #[arg(long)]
    width: i32,

    /// Frame height in pixels
    #[arg(long)]
    height: i32,

    /// Minimum confidence for a detection to be considered
    #[arg(long, default_value_t = 0.70)]
    confidence_threshold: f32,

    /// Minimum IoU for frame-to-frame association
    #[arg(long, default_value_t = 0.30)]
    iou_threshold: f32,

    /// Consecutive missed frames before a track is evicted
    #[arg(long, default_value_t = 15)]
    max_disappeared: usize,

    /// Detector class id counted as mitotic
    #[arg(long, default_value_t = 1)]
    mitotic_class_id: usize,

    /// Estimated number of high-power fields covered by the scan; enables
    /// the mitoses-per-10-HPF density and grade in the summary
    #[arg(long)]
    total_hpfs: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // setup logging
    tracing_subscriber::fmt().init();

    let mut reader = csv::Reader::from_path(&args.input)
        .with_context(|| format!("opening detections file {}", args.input.display()))?;

    // group records by frame; frames absent from the file had no detector
    // output and are replayed through the failure policy below
    let mut frames: BTreeMap<usize, Vec<Detection>> = BTreeMap::new();
    let mut last_frame = 0;
    for row in reader.deserialize::<DetectionRecord>() {
        match row {
            Ok(record) => {
                last_frame = last_frame.max(record.frame);
                frames.entry(record.frame).or_default().push(Detection::new(
                    None,
                    BoundingBox::new(record.x1, record.y1, record.x2, record.y2),
                    record.class_id,
                    record.confidence,
                ));
            }
            Err(err) => warn!(%err, "skipping unreadable detection record"),
        }
    }
    info!(
        frames = frames.len(),
        last_frame, "replaying detection stream"
    );

    let mut tracker = Tracker::new(args.width, args.height);
    tracker
        .with_confidence_threshold(args.confidence_threshold)
        .with_iou_threshold(args.iou_threshold)
        .with_max_disappeared(args.max_disappeared)
        .with_class_map(ClassMap::new(args.mitotic_class_id));

    // frames must be replayed in strictly increasing order; the crossing and
    // eviction logic is order dependent
    for frame in 0..=last_frame {
        match frames.remove(&frame) {
            Some(detections) => {
                let fired = tracker.update(detections)?;
                for event in &fired {
                    info!(
                        frame = event.frame_index,
                        class = event.class.as_str(),
                        sequence = event.sequence_number,
                        confidence = event.confidence as f64,
                        "crossing counted"
                    );
                }
            }
            None => {
                debug!(frame, "no detector output, running disappearance sweep only");
                tracker.skip_frame();
            }
        }
    }

    let tally = tracker.tally();
    println!("mitotic figures: {}", tally.mitotic());
    println!("non-mitotic figures: {}", tally.non_mitotic());
    println!("total figures: {}", tally.total());

    if let Some(total_hpfs) = args.total_hpfs {
        let density = hpf::mitoses_per_10_hpf(tally.mitotic(), total_hpfs);
        println!("mitoses per 10 HPF: {density:.2}");
        println!("tumor grade: {}", hpf::tumor_grade(density));
    }

    Ok(())
}

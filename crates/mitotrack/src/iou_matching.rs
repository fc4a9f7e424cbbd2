use crate::BoundingBox;
use ndarray::Array1;

/// Compute intersection over union.
///
/// # Parameters
///
/// * `a`: A bounding box in corner format.
/// * `b`: A bounding box in the same format.
///
/// # Returns
///
/// The intersection over union in `[0.0, 1.0]`. A degenerate intersection
/// (the boxes do not overlap) and a zero-area union both resolve to `0.0`
/// rather than producing negative-area artifacts or dividing by zero.
pub fn intersection_over_union(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let x_left = a.x1().max(b.x1());
    let y_top = a.y1().max(b.y1());
    let x_right = a.x2().min(b.x2());
    let y_bottom = a.y2().min(b.y2());

    if x_right < x_left || y_bottom < y_top {
        return 0.0;
    }

    let intersection = (x_right - x_left) as i64 * (y_bottom - y_top) as i64;
    let union = a.area() + b.area() - intersection;

    if union > 0 {
        intersection as f32 / union as f32
    } else {
        0.0
    }
}

/// Compute intersection over union between one box and each candidate.
///
/// # Parameters
///
/// * `bbox`: The box to score, typically a detection.
/// * `candidates`: Candidate boxes, typically the last positions of live
///   tracks.
///
/// # Returns
///
/// One score per candidate, in candidate order.
pub fn intersection_over_union_candidates(
    bbox: &BoundingBox,
    candidates: &[BoundingBox],
) -> Array1<f32> {
    Array1::from_iter(
        candidates
            .iter()
            .map(|candidate| intersection_over_union(bbox, candidate)),
    )
}

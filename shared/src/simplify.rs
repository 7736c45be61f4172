use crate::Point;

/// Result of [`simplify_with_stats`]: the kept coordinates plus the size of the input.
#[derive(Clone, Debug, PartialEq)]
pub struct Simplified {
    pub points: Vec<[f64; 2]>,
    pub input_len: usize,
}

/// Greedy distance filter over a drawn stroke.
///
/// The first point is the initial anchor. A later point is kept when it lies at
/// least `min_distance` from the anchor, and then becomes the new anchor. The
/// true last point is appended afterwards if it is still `min_distance` or more
/// away from the last kept point. Inputs of two points or fewer come back as-is.
pub fn simplify(points: &[Point], min_distance: f64) -> Vec<[f64; 2]> {
    if points.len() <= 2 {
        return points.iter().map(|point| point.to_pair()).collect();
    }

    let mut anchor = points[0];
    let mut kept = vec![anchor.to_pair()];
    for &point in &points[1..] {
        if anchor.distance_to(point) >= min_distance {
            kept.push(point.to_pair());
            anchor = point;
        }
    }

    // `anchor` is the last kept point here.
    if let Some(&last) = points.last() {
        if anchor.distance_to(last) >= min_distance {
            kept.push(last.to_pair());
        }
    }
    kept
}

pub fn simplify_with_stats(points: &[Point], min_distance: f64) -> Simplified {
    Simplified {
        points: simplify(points, min_distance),
        input_len: points.len(),
    }
}

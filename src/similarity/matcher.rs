//! Nearest-centroid lookup

/// Euclidean (L2) distance between two points
pub fn euclidean(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Index of the centroid closest to `query`.
///
/// Linear scan with a strict comparison, so among equidistant centroids the
/// lowest index wins. Returns `None` for an empty centroid set.
pub fn nearest_centroid(query: &[f64; 3], centroids: &[[f64; 3]]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;

    for (idx, centroid) in centroids.iter().enumerate() {
        let dist = euclidean(query, centroid);
        match best {
            Some((_, best_dist)) if dist >= best_dist => {}
            _ => best = Some((idx, dist)),
        }
    }

    best.map(|(idx, _)| idx)
}

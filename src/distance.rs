//! Cosine distance between embedding vectors
//!
//! Accumulation is done in `f64` so that an example compared with itself
//! comes out at (or within rounding of) zero.

/// L2 norm of a vector
pub fn l2_norm(v: &[f32]) -> f64 {
    v.iter().map(|&x| f64::from(x) * f64::from(x)).sum::<f64>().sqrt()
}

/// Cosine similarity in `[-1, 1]`
///
/// A zero-norm vector has similarity 0 with everything. Callers guarantee
/// equal lengths; the router checks dimensionality before comparing.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    let norms = l2_norm(a) * l2_norm(b);
    if norms == 0.0 {
        return 0.0;
    }
    let dot: f64 = a
        .iter()
        .zip(b)
        .map(|(&x, &y)| f64::from(x) * f64::from(y))
        .sum();
    (dot / norms).clamp(-1.0, 1.0)
}

/// `1 - cosine_similarity`, in `[0, 2]`
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    (1.0 - cosine_similarity(a, b)).clamp(0.0, 2.0) as f32
}

//! Small vector helpers shared by every stage that touches embeddings.
//!
//! All similarity math in this system is an inner product over unit-norm
//! vectors, which makes it equal to cosine similarity. Anything that produces
//! a vector (catalog load, query encoding, taste aggregation) must normalize
//! before handing it to the similarity index.

/// Inner product of two equal-length vectors.
///
/// Callers are responsible for checking dimensions; on unit-norm inputs the
/// result is the cosine similarity in `[-1, 1]`.
#[inline]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// L2 norm of a vector.
#[inline]
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Scale `v` to unit L2 norm in place.
///
/// Returns `false` (leaving `v` untouched) when the norm is zero, so callers
/// can surface the degenerate case instead of propagating NaN.
pub fn normalize(v: &mut [f32]) -> bool {
    let norm = l2_norm(v);
    if norm == 0.0 {
        return false;
    }
    for x in v.iter_mut() {
        *x /= norm;
    }
    true
}

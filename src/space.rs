//! Distance spaces used during index construction.
//!
//! The index treats points as opaque handles; all it asks of a space is a
//! build-time distance between two of them. Distances are `f32` and are
//! compared with [`f32::total_cmp`] throughout the crate, so a space may
//! return any finite or non-finite value it likes, and the walk stays
//! well-defined either way.
//!
//! Nothing here assumes the triangle inequality. A space only has to be
//! symmetric in value; [`DotProductSpace`] deliberately is not a metric.

/// A distance oracle over opaque points, used while the graph is built.
///
/// Implementations are shared by all indexing workers, hence `Sync`.
pub trait Space<P: ?Sized>: Sync {
    /// Distance between two stored points at indexing time.
    ///
    /// May be a faster or looser proxy than whatever a query uses; the two
    /// never have to agree exactly.
    fn index_time_distance(&self, a: &P, b: &P) -> f32;
}

/// Euclidean (L2) distance over dense `f32` slices.
///
/// Works on the squared distance: the ordering is the same and the square
/// root is never needed for neighbor comparison.
#[derive(Debug, Clone, Copy, Default)]
pub struct L2Space;

impl Space<[f32]> for L2Space {
    #[inline]
    fn index_time_distance(&self, a: &[f32], b: &[f32]) -> f32 {
        l2_distance_squared(a, b)
    }
}

/// Negated dot product over dense `f32` slices.
///
/// This is the maximum-inner-product ordering expressed as a "distance". It
/// violates the triangle inequality and can go negative, which makes it a
/// useful exercise for the non-metric tolerance of the index.
#[derive(Debug, Clone, Copy, Default)]
pub struct DotProductSpace;

impl Space<[f32]> for DotProductSpace {
    #[inline]
    fn index_time_distance(&self, a: &[f32], b: &[f32]) -> f32 {
        -a.iter().zip(b.iter()).map(|(x, y)| x * y).sum::<f32>()
    }
}

/// Squared L2 distance between two slices.
///
/// If dimensions mismatch, returns `f32::INFINITY` so the pair is never
/// selected as a nearest neighbor.
#[inline]
#[must_use]
pub fn l2_distance_squared(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::INFINITY;
    }
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn l2_zero_on_identical() {
        let v = vec![0.25, -1.5, 3.0];
        assert_eq!(l2_distance_squared(&v, &v), 0.0);
    }

    #[test]
    fn l2_symmetric() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![-1.0, 0.5, 2.0];
        assert_eq!(l2_distance_squared(&a, &b), l2_distance_squared(&b, &a));
    }

    #[test]
    fn l2_dimension_mismatch_is_infinite() {
        assert_eq!(l2_distance_squared(&[1.0], &[1.0, 2.0]), f32::INFINITY);
    }

    #[test]
    fn dot_product_space_is_non_metric() {
        let space = DotProductSpace;
        // Distance to self is negative for any nonzero vector: not a metric.
        let v = [1.0f32, 2.0];
        assert!(space.index_time_distance(&v, &v) < 0.0);
    }
}

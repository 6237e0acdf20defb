//! k-NN query objects and result sinks.
//!
//! A query owns its own distance computation (which may cache or transform)
//! and its own result policy. The index walks the graph and offers
//! candidates; the sink decides what to keep. [`KnnCollector`] is the
//! default sink: a capacity-bounded max-heap that deduplicates by point
//! identity.

use std::collections::BinaryHeap;

/// A k-NN query against the index.
///
/// `'p` is the lifetime of the indexed points; offered points live at least
/// that long, so a sink may retain them.
pub trait KnnQuery<'p, P: ?Sized> {
    /// Distance from the query to a candidate point.
    fn distance_to(&self, point: &'p P) -> f32;

    /// Number of results the query retains. The index uses this as the `k`
    /// of its walk.
    fn result_capacity(&self) -> usize;

    /// Offer a candidate. Never fails; capacity and deduplication are the
    /// sink's concern.
    fn offer(&mut self, dist: f32, point: &'p P);
}

/// A retained search hit, ordered by distance so the heap top is the worst.
struct Hit<'p, P: ?Sized> {
    dist: f32,
    point: &'p P,
}

impl<P: ?Sized> PartialEq for Hit<'_, P> {
    fn eq(&self, other: &Self) -> bool {
        self.dist.total_cmp(&other.dist).is_eq()
    }
}

impl<P: ?Sized> Eq for Hit<'_, P> {}

impl<P: ?Sized> PartialOrd for Hit<'_, P> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<P: ?Sized> Ord for Hit<'_, P> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.dist.total_cmp(&other.dist)
    }
}

/// Default k-NN sink: keeps the `k` nearest offered points.
///
/// Distance to the query is computed by the supplied closure, so a caller
/// can route through any space, cache, or transform. Points offered more
/// than once (the walker restarts from random entries, so revisits happen)
/// are kept once.
pub struct KnnCollector<'p, P: ?Sized, F> {
    dist_fn: F,
    capacity: usize,
    heap: BinaryHeap<Hit<'p, P>>,
}

impl<'p, P: ?Sized, F> KnnCollector<'p, P, F>
where
    F: Fn(&P) -> f32,
{
    /// Create a collector retaining at most `capacity` points.
    pub fn new(capacity: usize, dist_fn: F) -> Self {
        Self {
            dist_fn,
            capacity,
            heap: BinaryHeap::with_capacity(capacity + 1),
        }
    }

    /// Number of points currently retained.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// True when nothing has been retained.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drain the collector into `(distance, point)` pairs, nearest first.
    pub fn into_sorted_hits(self) -> Vec<(f32, &'p P)> {
        let mut hits: Vec<(f32, &'p P)> =
            self.heap.into_iter().map(|h| (h.dist, h.point)).collect();
        hits.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));
        hits
    }
}

impl<'p, P: ?Sized, F> KnnQuery<'p, P> for KnnCollector<'p, P, F>
where
    F: Fn(&P) -> f32,
{
    fn distance_to(&self, point: &'p P) -> f32 {
        (self.dist_fn)(point)
    }

    fn result_capacity(&self) -> usize {
        self.capacity
    }

    fn offer(&mut self, dist: f32, point: &'p P) {
        if self.capacity == 0 {
            return;
        }
        // Identity dedup: the same stored point may be offered by several
        // walk attempts.
        if self.heap.iter().any(|h| std::ptr::eq(h.point, point)) {
            return;
        }
        if self.heap.len() < self.capacity {
            self.heap.push(Hit { dist, point });
        } else if let Some(worst) = self.heap.peek() {
            if dist < worst.dist {
                self.heap.push(Hit { dist, point });
                self.heap.pop();
            }
        }
    }
}

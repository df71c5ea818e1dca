//! Chunk and bucket boundaries for the staged writes.

use std::ops::Range;

/// Splits `len` items into at most `parts` contiguous, near-equal index
/// ranges. Earlier ranges take the remainder, so sizes differ by at most one.
/// Empty ranges are never returned.
pub fn index_ranges(len: usize, parts: usize) -> Vec<Range<usize>> {
    let parts = parts.max(1);
    let base = len / parts;
    let bigger = len % parts;

    let mut ranges = Vec::with_capacity(parts.min(len));
    let mut start = 0;
    for i in 0..parts {
        let size = if i < bigger { base + 1 } else { base };
        if size == 0 {
            break;
        }
        ranges.push(start..start + size);
        start += size;
    }
    ranges
}

/// Half-open amount range `[lower, upper)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmountBucket {
    pub lower: f64,
    pub upper: f64,
}

impl AmountBucket {
    pub fn contains(&self, amount: f64) -> bool {
        amount >= self.lower && amount < self.upper
    }
}

/// Splits `[min, max + 1)` into `parts` disjoint, contiguous buckets, so
/// every amount in `[min, max]` falls in exactly one bucket. The last bucket
/// is open-ended: `max + 1.0` equals `max` once `max` reaches 2^53.
pub fn amount_buckets(min: f64, max: f64, parts: usize) -> Vec<AmountBucket> {
    let parts = parts.max(1);
    let width = (max.max(min) + 1.0 - min) / parts as f64;

    (0..parts)
        .map(|i| AmountBucket {
            lower: min + width * i as f64,
            upper: if i + 1 == parts {
                f64::INFINITY
            } else {
                min + width * (i + 1) as f64
            },
        })
        .collect()
}

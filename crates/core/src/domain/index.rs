// Sequence Indexing (negative indices, slices, permutations)

use super::error::{DomainError, Result};
use super::queue::Position;
use std::ops::{Range, RangeFrom, RangeFull, RangeTo};

/// Map a possibly negative index onto `[0, len)`.
///
/// `-1` is the last position. Returns `None` when the index falls outside
/// `[-len, len)`, which includes every index on an empty queue.
pub fn normalize_index(index: i64, len: i64) -> Option<Position> {
    let position = if index < 0 { index + len } else { index };
    (0..len).contains(&position).then_some(position)
}

/// Insertion point for `index`, clamped to `[0, len]` like `list.insert`
pub fn clamp_insert_index(index: i64, len: i64) -> Position {
    if index < 0 {
        (index + len).max(0)
    } else {
        index.min(len)
    }
}

/// Check that `order` is a permutation of `0..order.len()`
pub fn validate_permutation(order: &[usize]) -> Result<()> {
    let mut seen = vec![false; order.len()];
    for &target in order {
        match seen.get_mut(target) {
            Some(slot) if !*slot => *slot = true,
            _ => return Err(DomainError::InvalidPermutation(order.len())),
        }
    }
    Ok(())
}

/// Half-open slice `[start, stop)` with a step, as in Python's `seq[start:stop:step]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceSpec {
    pub start: Option<i64>,
    pub stop: Option<i64>,
    pub step: i64,
}

impl SliceSpec {
    pub fn new(start: Option<i64>, stop: Option<i64>) -> Self {
        Self {
            start,
            stop,
            step: 1,
        }
    }

    pub fn all() -> Self {
        Self::new(None, None)
    }

    pub fn with_step(mut self, step: i64) -> Self {
        self.step = step;
        self
    }

    /// Positions selected by this slice on a sequence of length `len`, in visiting order.
    ///
    /// Bounds are clamped rather than rejected, so an out-of-range slice yields
    /// an empty list. Only a zero step is an error.
    pub fn indices(&self, len: i64) -> Result<Vec<Position>> {
        let step = self.step;
        if step == 0 {
            return Err(DomainError::ZeroSliceStep);
        }

        let (lower, upper) = if step > 0 { (0, len) } else { (-1, len - 1) };
        let clamp = |bound: i64| {
            if bound < 0 {
                (bound + len).max(lower)
            } else {
                bound.min(upper)
            }
        };

        let start = self
            .start
            .map(clamp)
            .unwrap_or(if step > 0 { lower } else { upper });
        let stop = self
            .stop
            .map(clamp)
            .unwrap_or(if step > 0 { upper } else { lower });

        let mut positions = Vec::new();
        let mut position = start;
        if step > 0 {
            while position < stop {
                positions.push(position);
                match position.checked_add(step) {
                    Some(next) => position = next,
                    None => break,
                }
            }
        } else {
            while position > stop {
                positions.push(position);
                match position.checked_add(step) {
                    Some(next) => position = next,
                    None => break,
                }
            }
        }
        Ok(positions)
    }
}

impl Default for SliceSpec {
    fn default() -> Self {
        Self::all()
    }
}

impl From<Range<i64>> for SliceSpec {
    fn from(range: Range<i64>) -> Self {
        Self::new(Some(range.start), Some(range.end))
    }
}

impl From<RangeFrom<i64>> for SliceSpec {
    fn from(range: RangeFrom<i64>) -> Self {
        Self::new(Some(range.start), None)
    }
}

impl From<RangeTo<i64>> for SliceSpec {
    fn from(range: RangeTo<i64>) -> Self {
        Self::new(None, Some(range.end))
    }
}

impl From<RangeFull> for SliceSpec {
    fn from(_: RangeFull) -> Self {
        Self::all()
    }
}

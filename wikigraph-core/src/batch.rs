//! Fixed-size batch planning for store writes.
//!
//! `len` items split into `ceil(len / batch_size)` batches; every batch holds
//! exactly `batch_size` items except the last, which holds the remainder.
//! Batches are plain sub-slices of the input, so no placeholder entries can
//! ever reach a writer.

use std::ops::Range;

use crate::error::{CoreError, Result};

/// Default number of items per write transaction.
pub const DEFAULT_BATCH_SIZE: usize = 256;

/// Batch arithmetic for a collection of `len` items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPlan {
    len: usize,
    batch_size: usize,
    batch_count: usize,
    last_len: usize,
}

impl BatchPlan {
    /// Plan batches for `len` items.
    pub fn new(len: usize, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(CoreError::InvalidBatchSize(batch_size));
        }

        let batch_count = len.div_ceil(batch_size);
        let last_len = match batch_count {
            0 => 0,
            n => len - batch_size * (n - 1),
        };

        Ok(Self {
            len,
            batch_size,
            batch_count,
            last_len,
        })
    }

    /// Total number of items.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn batch_count(&self) -> usize {
        self.batch_count
    }

    /// Length of the final batch (0 only when there are no items).
    pub fn last_len(&self) -> usize {
        self.last_len
    }

    /// Item range covered by batch `index`.
    pub fn range(&self, index: usize) -> Option<Range<usize>> {
        if index >= self.batch_count {
            return None;
        }
        let start = index * self.batch_size;
        let len = if index + 1 == self.batch_count {
            self.last_len
        } else {
            self.batch_size
        };
        Some(start..start + len)
    }
}

/// One batch of items, borrowed from the planned slice.
#[derive(Debug, Clone)]
pub struct Batch<'a, T> {
    /// Zero-based position of this batch.
    pub index: usize,
    pub items: &'a [T],
}

impl<T> Batch<'_, T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Iterator over the batches of a slice.
#[derive(Debug, Clone)]
pub struct Batches<'a, T> {
    plan: BatchPlan,
    items: &'a [T],
    next: usize,
}

impl<'a, T> Batches<'a, T> {
    pub fn plan(&self) -> BatchPlan {
        self.plan
    }
}

impl<'a, T> Iterator for Batches<'a, T> {
    type Item = Batch<'a, T>;

    fn next(&mut self) -> Option<Self::Item> {
        let range = self.plan.range(self.next)?;
        let batch = Batch {
            index: self.next,
            items: &self.items[range],
        };
        self.next += 1;
        Some(batch)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.plan.batch_count() - self.next;
        (remaining, Some(remaining))
    }
}

impl<T> ExactSizeIterator for Batches<'_, T> {}

/// Split `items` into batches of `batch_size`.
pub fn plan<T>(items: &[T], batch_size: usize) -> Result<Batches<'_, T>> {
    Ok(Batches {
        plan: BatchPlan::new(items.len(), batch_size)?,
        items,
        next: 0,
    })
}

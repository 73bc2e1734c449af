//! Global row numbering ("blank info") across coils
//!
//! Every coil gets one contiguous block of numbers the first time it is
//! seen. Blocks are appended in allocation order and never move, so a
//! number shown to a user keeps pointing at the same coil and row for the
//! life of the process. Only the last block may grow, since nothing follows it.

use ahash::AHashMap;
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::schema::numeric_key;
use crate::DataError;

/// Block of blank info numbers owned by one coil. `start..=end` inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoilRange {
    pub coil: String,
    pub sort_key: u64,
    pub start: u64,
    pub end: u64,
    pub count: usize,
}

impl CoilRange {
    pub fn contains(&self, number: u64) -> bool {
        (self.start..=self.end).contains(&number)
    }
}

#[derive(Default)]
struct AllocationTable {
    ranges: AHashMap<String, CoilRange>,
    /// Coil ids in allocation order
    order: Vec<String>,
}

impl AllocationTable {
    fn next_start(&self) -> u64 {
        self.order
            .last()
            .and_then(|coil| self.ranges.get(coil))
            .map(|range| range.end + 1)
            .unwrap_or(1)
    }

    fn append(&mut self, coil: &str, rows: usize) -> CoilRange {
        let start = self.next_start();
        let range = CoilRange {
            coil: coil.to_string(),
            sort_key: numeric_key(coil),
            start,
            end: start + rows as u64 - 1,
            count: rows,
        };
        self.ranges.insert(coil.to_string(), range.clone());
        self.order.push(coil.to_string());
        range
    }
}

/// Session-scoped allocator of coil ranges. All writes go through one mutex.
#[derive(Default)]
pub struct RangeAllocator {
    table: Mutex<AllocationTable>,
}

impl RangeAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate ranges for every coil not seen yet, in the given order.
    ///
    /// `probe` returns the row count of a coil. Coils with zero rows or a
    /// failed probe are skipped. Existing ranges are left alone.
    pub fn compute_ranges<F>(&self, coils: &[String], probe: F) -> Vec<CoilRange>
    where
        F: Fn(&str) -> Result<usize, DataError>,
    {
        let unseen: Vec<&String> = {
            let table = self.table.lock();
            coils.iter().filter(|c| !table.ranges.contains_key(c.as_str())).collect()
        };

        // Probing reads the file; keep it outside the lock.
        let probed: Vec<(&String, usize)> = unseen
            .into_iter()
            .filter_map(|coil| match probe(coil) {
                Ok(0) => {
                    warn!("Coil {} has no rows, no blank info range allocated", coil);
                    None
                }
                Ok(rows) => Some((coil, rows)),
                Err(e) => {
                    warn!("Could not probe coil {}: {}", coil, e);
                    None
                }
            })
            .collect();

        let mut table = self.table.lock();
        let mut created = Vec::with_capacity(probed.len());
        for (coil, rows) in probed {
            if table.ranges.contains_key(coil.as_str()) {
                continue;
            }
            let range = table.append(coil, rows);
            info!("Coil {} blank info range {}..={} ({} rows)", coil, range.start, range.end, rows);
            created.push(range);
        }
        created
    }

    /// Range of a coil, allocating a new block at the end if it has none.
    /// An existing range is returned unchanged whatever `rows` is.
    pub fn allocate_for_unseen(&self, coil: &str, rows: usize) -> Result<CoilRange, DataError> {
        let mut table = self.table.lock();
        if let Some(range) = table.ranges.get(coil) {
            return Ok(range.clone());
        }
        if rows == 0 {
            return Err(DataError::NoDataForCoil { coil: coil.to_string() });
        }
        let range = table.append(coil, rows);
        info!(
            "Allocated blank info range {}..={} for unseen coil {}",
            range.start, range.end, coil
        );
        Ok(range)
    }

    /// Extend the range of `coil` to `rows` numbers if it is the last block.
    ///
    /// Returns the grown range, or `None` when the coil has no range, is not
    /// last, or already holds `rows`.
    pub fn grow_last(&self, coil: &str, rows: usize) -> Option<CoilRange> {
        let mut table = self.table.lock();
        if table.order.last().map(String::as_str) != Some(coil) {
            return None;
        }
        let range = table.ranges.get_mut(coil)?;
        if rows <= range.count {
            return None;
        }
        range.count = rows;
        range.end = range.start + rows as u64 - 1;
        info!("Grew blank info range of {} to {}..={}", coil, range.start, range.end);
        Some(range.clone())
    }

    pub fn range_for(&self, coil: &str) -> Option<CoilRange> {
        self.table.lock().ranges.get(coil).cloned()
    }

    /// All ranges in allocation order
    pub fn ranges(&self) -> Vec<CoilRange> {
        let table = self.table.lock();
        table
            .order
            .iter()
            .filter_map(|coil| table.ranges.get(coil).cloned())
            .collect()
    }

    /// Coil and in-coil row a blank info number belongs to
    pub fn locate(&self, number: u64) -> Option<(String, usize)> {
        let table = self.table.lock();
        table
            .ranges
            .values()
            .find(|range| range.contains(number))
            .map(|range| (range.coil.clone(), (number - range.start) as usize))
    }

    pub fn is_empty(&self) -> bool {
        self.table.lock().order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn coils(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn rows_of(coil: &str) -> Result<usize, DataError> {
        match coil {
            "coil50" => Ok(12),
            "coil51" => Ok(8),
            "coil52" => Ok(0),
            "coil53" => Err(DataError::NotFound(coil.to_string())),
            _ => Ok(3),
        }
    }

    fn assert_contiguous(ranges: &[CoilRange]) {
        for pair in ranges.windows(2) {
            assert_eq!(pair[0].end + 1, pair[1].start);
        }
    }

    #[test]
    fn test_compute_ranges_example() {
        let allocator = RangeAllocator::new();
        allocator.compute_ranges(&coils(&["coil50", "coil51"]), rows_of);

        let first = allocator.range_for("coil50").unwrap();
        let second = allocator.range_for("coil51").unwrap();
        assert_eq!((first.start, first.end, first.count), (1, 12, 12));
        assert_eq!((second.start, second.end, second.count), (13, 20, 8));
        assert_eq!(second.sort_key, 51);
    }

    #[test]
    fn test_compute_ranges_skips_empty_and_failed() {
        let allocator = RangeAllocator::new();
        let created = allocator.compute_ranges(&coils(&["coil50", "coil52", "coil53", "coil54"]), rows_of);

        assert_eq!(created.len(), 2);
        assert!(allocator.range_for("coil52").is_none());
        assert!(allocator.range_for("coil53").is_none());
        assert_eq!(allocator.range_for("coil54").unwrap().start, 13);
    }

    #[test]
    fn test_compute_ranges_only_extends() {
        let allocator = RangeAllocator::new();
        allocator.compute_ranges(&coils(&["coil51"]), rows_of);
        let before = allocator.range_for("coil51").unwrap();

        allocator.compute_ranges(&coils(&["coil50", "coil51"]), |_| Ok(99));
        assert_eq!(allocator.range_for("coil51").unwrap(), before);
        assert_eq!(allocator.range_for("coil50").unwrap().start, 9);
        assert_contiguous(&allocator.ranges());
    }

    #[test]
    fn test_allocate_for_unseen() {
        let allocator = RangeAllocator::new();
        let first = allocator.allocate_for_unseen("coil7", 4).unwrap();
        assert_eq!((first.start, first.end), (1, 4));

        let again = allocator.allocate_for_unseen("coil7", 40).unwrap();
        assert_eq!(again, first);

        let next = allocator.allocate_for_unseen("coil8", 2).unwrap();
        assert_eq!((next.start, next.end), (5, 6));

        assert!(matches!(
            allocator.allocate_for_unseen("coil9", 0),
            Err(DataError::NoDataForCoil { .. })
        ));
    }

    #[test]
    fn test_only_last_range_grows() {
        let allocator = RangeAllocator::new();
        allocator.compute_ranges(&coils(&["coil50", "coil51"]), rows_of);

        assert!(allocator.grow_last("coil50", 15).is_none());
        assert_eq!(allocator.range_for("coil50").unwrap().end, 12);
        assert_eq!(allocator.locate(15), Some(("coil51".to_string(), 2)));

        let grown = allocator.grow_last("coil51", 10).unwrap();
        assert_eq!((grown.start, grown.end, grown.count), (13, 22, 10));
        assert!(allocator.grow_last("coil51", 4).is_none());
        assert_eq!(allocator.locate(22), Some(("coil51".to_string(), 9)));

        let next = allocator.allocate_for_unseen("coil60", 2).unwrap();
        assert_eq!((next.start, next.end), (23, 24));
        assert!(allocator.grow_last("coil99", 5).is_none());
    }

    #[test]
    fn test_locate_reverse_mapping() {
        let allocator = RangeAllocator::new();
        allocator.compute_ranges(&coils(&["coil50", "coil51"]), rows_of);
        assert_eq!(allocator.locate(15), Some(("coil51".to_string(), 2)));
        assert_eq!(allocator.locate(1), Some(("coil50".to_string(), 0)));
        assert_eq!(allocator.locate(21), None);
    }

    #[test]
    fn test_concurrent_allocations_are_disjoint() {
        let allocator = Arc::new(RangeAllocator::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let allocator = allocator.clone();
                std::thread::spawn(move || {
                    for j in 0..25 {
                        allocator.allocate_for_unseen(&format!("coil{}_{}", i, j), 1 + j % 4).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let ranges = allocator.ranges();
        assert_eq!(ranges.len(), 200);
        assert_eq!(ranges[0].start, 1);
        assert_contiguous(&ranges);
    }
}

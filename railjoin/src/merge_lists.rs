// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use std::cmp::Ordering;
use std::vec;

/// One rail's list together with its read cursor.
///
/// Values are moved out as the cursor advances, so the list is consumed in place.
pub(crate) struct RailCursor<T> {
    items: vec::IntoIter<T>,
    cursor: usize,
    len: usize,
}

impl<T> RailCursor<T> {
    pub(crate) fn new(list: Vec<T>) -> Self {
        let len = list.len();
        Self {
            items: list.into_iter(),
            cursor: 0,
            len,
        }
    }

    pub(crate) fn head(&self) -> Option<&T> {
        self.items.as_slice().first()
    }

    pub(crate) fn is_exhausted(&self) -> bool {
        self.cursor == self.len
    }

    fn advance(&mut self) -> Option<T> {
        let value = self.items.next()?;
        self.cursor += 1;
        Some(value)
    }
}

/// The k-way merge over every rail's list.
///
/// Owned by whichever execution holds the coordinator's drain guard.
pub(crate) struct MergeLists<T> {
    rails: Vec<RailCursor<T>>,
}

impl<T> MergeLists<T> {
    pub(crate) fn new(lists: impl IntoIterator<Item = Vec<T>>) -> Self {
        Self {
            rails: lists.into_iter().map(RailCursor::new).collect(),
        }
    }

    /// Index of the rail holding the smallest head, or `None` once every rail is exhausted.
    ///
    /// Rails are scanned in index order and a later head only wins when it compares
    /// strictly smaller, so equal keys come out in rail order.
    pub(crate) fn select_min(&self, compare: &dyn Fn(&T, &T) -> Ordering) -> Option<usize> {
        let mut min: Option<(usize, &T)> = None;

        for (index, rail) in self.rails.iter().enumerate() {
            let Some(head) = rail.head() else {
                continue;
            };

            match min {
                Some((_, current)) if compare(current, head) != Ordering::Greater => {}
                _ => min = Some((index, head)),
            }
        }

        min.map(|(index, _)| index)
    }

    /// Move the head of rail `index` out and advance its cursor.
    pub(crate) fn take(&mut self, index: usize) -> Option<T> {
        self.rails.get_mut(index)?.advance()
    }

    pub(crate) fn is_exhausted(&self) -> bool {
        self.rails.iter().all(RailCursor::is_exhausted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain_all(lists: Vec<Vec<(u32, char)>>) -> Vec<(u32, char)> {
        let mut merge = MergeLists::new(lists);
        let compare = |a: &(u32, char), b: &(u32, char)| a.0.cmp(&b.0);
        let mut out = Vec::new();
        while let Some(index) = merge.select_min(&compare) {
            out.push(merge.take(index).unwrap());
        }
        assert!(merge.is_exhausted());
        out
    }

    #[test]
    fn test_select_min_interleaves_sorted_lists() {
        let out = drain_all(vec![
            vec![(1, 'a'), (3, 'a'), (5, 'a')],
            vec![(2, 'b'), (4, 'b'), (6, 'b')],
        ]);

        let keys: Vec<u32> = out.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_ties_resolve_to_lower_rail_index() {
        let out = drain_all(vec![
            vec![(1, 'a'), (2, 'a')],
            vec![(1, 'b'), (2, 'b')],
            vec![(1, 'c')],
        ]);

        assert_eq!(
            out,
            vec![(1, 'a'), (1, 'b'), (1, 'c'), (2, 'a'), (2, 'b')]
        );
    }

    #[test]
    fn test_empty_rails_are_skipped() {
        let out = drain_all(vec![vec![], vec![(5, 'b')], vec![]]);
        assert_eq!(out, vec![(5, 'b')]);
    }

    #[test]
    fn test_no_rails_is_immediately_exhausted() {
        let merge = MergeLists::<u32>::new(Vec::new());
        assert!(merge.is_exhausted());
        assert_eq!(merge.select_min(&|a: &u32, b: &u32| a.cmp(b)), None);
    }

    #[test]
    fn test_cursor_never_passes_list_length() {
        let mut rail = RailCursor::new(vec![1, 2]);
        assert_eq!(rail.advance(), Some(1));
        assert_eq!(rail.advance(), Some(2));
        assert_eq!(rail.advance(), None);
        assert!(rail.is_exhausted());
        assert_eq!(rail.cursor, rail.len);
    }
}

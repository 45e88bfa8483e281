#![forbid(unsafe_code)]

//! Drawing-region accumulator shared across one refresh pass.
//!
//! A [`RegionGroup`] is created once per refresh and handed by `&mut` to every
//! live provider in turn. Each provider sees what earlier providers reserved
//! and appends its own contribution, so the combined region can be
//! invalidated in one go afterwards.
//!
//! # Invariants
//!
//! 1. Append-only: there is no API to remove or replace a reserved rect.
//! 2. Empty rects are never stored.
//! 3. Iteration order is insertion order.

use crate::geometry::Rect;

/// Append-only composite of reserved rectangles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RegionGroup {
    rects: Vec<Rect>,
}

impl RegionGroup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `rect`. Returns `false` (and stores nothing) for an empty rect.
    pub fn push(&mut self, rect: Rect) -> bool {
        if rect.is_empty() {
            return false;
        }
        self.rects.push(rect);
        true
    }

    /// Number of stored rects.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rects.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    #[must_use]
    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rect> {
        self.rects.iter()
    }

    /// Bounding box of everything reserved so far.
    #[must_use]
    pub fn bounds(&self) -> Option<Rect> {
        self.rects.iter().copied().reduce(|acc, r| acc.union(&r))
    }

    /// Whether `rect` overlaps any reserved rect.
    #[must_use]
    pub fn intersects(&self, rect: &Rect) -> bool {
        self.rects.iter().any(|r| r.intersects(rect))
    }

    /// Whether the cell `(x, y)` is covered by any reserved rect.
    #[must_use]
    pub fn contains(&self, x: u16, y: u16) -> bool {
        self.rects.iter().any(|r| r.contains(x, y))
    }
}

impl Extend<Rect> for RegionGroup {
    fn extend<I: IntoIterator<Item = Rect>>(&mut self, iter: I) {
        for rect in iter {
            self.push(rect);
        }
    }
}

impl<'a> IntoIterator for &'a RegionGroup {
    type Item = &'a Rect;
    type IntoIter = std::slice::Iter<'a, Rect>;

    fn into_iter(self) -> Self::IntoIter {
        self.rects.iter()
    }
}

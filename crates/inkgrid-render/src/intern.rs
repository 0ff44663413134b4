#![forbid(unsafe_code)]

//! Interning tables for pens and text.
//!
//! Cell heads reference pens and source strings through compact integer ids
//! rather than owning them. Both tables are append-only; entries live until
//! the buffer is reset or cleared, so ids never dangle while the grid can
//! still reach them.
//!
//! Pens are deduplicated by structural equality with a linear scan: a frame
//! rarely uses more than a handful of distinct pens, so a scan beats the
//! bookkeeping of a hash map. Text is not deduplicated at all; each drawing
//! call stores its own string.

use crate::cell::{PenId, TextId};
use inkgrid_core::pen::Pen;

/// Append-only store of distinct pens.
#[derive(Debug, Default)]
pub struct PenTable {
    pens: Vec<Pen>,
}

impl PenTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a pen, returning the id of the existing structurally-equal
    /// entry when there is one.
    pub fn intern(&mut self, pen: &Pen) -> PenId {
        if let Some(index) = self.pens.iter().position(|existing| existing == pen) {
            return PenId::new(index);
        }
        self.pens.push(*pen);
        PenId::new(self.pens.len() - 1)
    }

    /// Look up an interned pen.
    ///
    /// # Panics
    ///
    /// Panics on a stale id; reachable ids are live by invariant, so a miss
    /// is a bug in the span engine.
    pub fn get(&self, id: PenId) -> &Pen {
        &self.pens[id.index()]
    }

    /// Number of distinct pens stored.
    pub fn len(&self) -> usize {
        self.pens.len()
    }

    /// Check whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.pens.is_empty()
    }

    /// Drop every entry, invalidating all outstanding ids.
    pub fn clear(&mut self) {
        self.pens.clear();
    }
}

/// Append-only store of source strings.
#[derive(Debug, Default)]
pub struct TextTable {
    texts: Vec<String>,
}

impl TextTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a string and return its id.
    pub fn intern(&mut self, text: &str) -> TextId {
        self.texts.push(text.to_string());
        TextId::new(self.texts.len() - 1)
    }

    /// Look up an interned string.
    ///
    /// # Panics
    ///
    /// Panics on a stale id; reachable ids are live by invariant.
    pub fn get(&self, id: TextId) -> &str {
        &self.texts[id.index()]
    }

    /// Number of strings stored.
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    /// Check whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// Drop every entry, invalidating all outstanding ids.
    pub fn clear(&mut self) {
        self.texts.clear();
    }
}

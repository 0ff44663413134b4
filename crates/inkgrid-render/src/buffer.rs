#![forbid(unsafe_code)]

//! The render buffer: grid storage, span engine, and drawing surface.
//!
//! A [`RenderBuffer`] is a `lines × cols` grid of [`Cell`] spans plus the
//! drawing state that feeds it: a virtual cursor for relative operations, a
//! clipping rectangle in output coordinates, a translation offset applied to
//! every incoming position, an optional stored pen, and a save/restore stack
//! over all of those.
//!
//! Every drawing operation funnels through the same pipeline: translate and
//! clip the requested region ([`RenderBuffer::transform`]), carve a fresh
//! span out of whatever occupied it (`make_span`), then write the head cell.
//! Operations clipped away entirely are successful no-ops.
//!
//! # Layout
//!
//! Cells are stored row-major: `index = line * cols + col`, the dimensions
//! never change after construction.

use std::fmt;

use inkgrid_core::geometry::Rect;
use inkgrid_core::pen::Pen;

use crate::cell::{Cell, PenId, TextId};
use crate::display_width;
use crate::intern::{PenTable, TextTable};

/// Failure of a cursor-relative drawing operation.
///
/// Absolute operations never fail; out-of-range regions clip to no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawError {
    /// A relative operation was called before any [`RenderBuffer::goto`].
    NoCursor,
    /// An explicit pen was passed while a stored pen is active.
    PenConflict,
    /// A length that cannot be transformed meaningfully (negative).
    OutOfRange,
}

impl fmt::Display for DrawError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCursor => write!(f, "relative drawing operation without a cursor"),
            Self::PenConflict => {
                write!(f, "explicit pen passed while a stored pen is active")
            }
            Self::OutOfRange => write!(f, "drawing length out of range"),
        }
    }
}

impl std::error::Error for DrawError {}

/// A drawing region after translation and clipping, in grid coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Transformed {
    pub(crate) line: u16,
    pub(crate) col: u16,
    pub(crate) len: u16,
    /// Columns clipped off the left of the caller's region.
    pub(crate) skipped: u16,
}

/// One saved drawing-state frame.
#[derive(Debug, Clone)]
enum StateFrame {
    /// Snapshot of cursor, clip, translation, and pen.
    Full {
        cursor: Option<(i32, i32)>,
        clip: Option<Rect>,
        translation: (i32, i32),
        pen: Option<Pen>,
    },
    /// Snapshot of the pen only.
    PenOnly { pen: Option<Pen> },
}

impl StateFrame {
    fn pen(&self) -> Option<&Pen> {
        match self {
            StateFrame::Full { pen, .. } | StateFrame::PenOnly { pen } => pen.as_ref(),
        }
    }
}

/// A grid of cell spans accumulating drawing operations until flushed.
#[derive(Debug)]
pub struct RenderBuffer {
    lines: u16,
    cols: u16,
    cells: Vec<Cell>,
    pens: PenTable,
    texts: TextTable,
    /// Virtual cursor in caller coordinates, set by `goto`.
    cursor: Option<(i32, i32)>,
    /// Clip rectangle in output coordinates; `None` means fully invisible.
    clip: Option<Rect>,
    /// Offset added to caller coordinates before clipping.
    translation: (i32, i32),
    /// Stored pen for relative operations.
    pen: Option<Pen>,
    stack: Vec<StateFrame>,
}

impl RenderBuffer {
    /// Create a buffer of the given dimensions, all cells skipped.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is 0.
    pub fn new(lines: u16, cols: u16) -> Self {
        assert!(lines > 0, "render buffer lines must be > 0");
        assert!(cols > 0, "render buffer cols must be > 0");

        let mut cells = Vec::with_capacity(lines as usize * cols as usize);
        for _ in 0..lines {
            cells.push(Cell::Skip { len: cols });
            for _ in 1..cols {
                cells.push(Cell::Cont { start: 0 });
            }
        }

        Self {
            lines,
            cols,
            cells,
            pens: PenTable::new(),
            texts: TextTable::new(),
            cursor: None,
            clip: Some(Rect::from_size(lines, cols)),
            translation: (0, 0),
            pen: None,
            stack: Vec::new(),
        }
    }

    /// Number of lines in the grid.
    #[inline]
    pub const fn lines(&self) -> u16 {
        self.lines
    }

    /// Number of columns in the grid.
    #[inline]
    pub const fn cols(&self) -> u16 {
        self.cols
    }

    /// The cells of one row, for inspection.
    ///
    /// # Panics
    ///
    /// Panics if `line >= lines`.
    pub fn row_cells(&self, line: u16) -> &[Cell] {
        assert!(line < self.lines, "row {line} out of range");
        let start = line as usize * self.cols as usize;
        &self.cells[start..start + self.cols as usize]
    }

    #[inline]
    fn index(&self, line: u16, col: u16) -> usize {
        debug_assert!(line < self.lines && col < self.cols);
        line as usize * self.cols as usize + col as usize
    }

    #[inline]
    pub(crate) fn cell_ref(&self, line: u16, col: u16) -> &Cell {
        let idx = self.index(line, col);
        &self.cells[idx]
    }

    #[inline]
    pub(crate) fn cell_mut(&mut self, line: u16, col: u16) -> &mut Cell {
        let idx = self.index(line, col);
        &mut self.cells[idx]
    }

    #[inline]
    pub(crate) fn intern_pen(&mut self, pen: &Pen) -> PenId {
        self.pens.intern(pen)
    }

    #[inline]
    pub(crate) fn interned_pen(&self, id: PenId) -> &Pen {
        self.pens.get(id)
    }

    #[inline]
    pub(crate) fn interned_text(&self, id: TextId) -> &str {
        self.texts.get(id)
    }

    // ========== Coordinate transform ==========

    /// Translate a caller region into grid space and clip it.
    ///
    /// Returns `None` when the clip is unset, the region has no positive
    /// length, or nothing survives clipping. `skipped` reports how many
    /// columns were cut off the left edge, which becomes the text offset of
    /// a clipped text span.
    pub(crate) fn transform(&self, line: i32, col: i32, len: i32) -> Option<Transformed> {
        if len <= 0 {
            return None;
        }
        let clip = self.clip?;

        let line = line + self.translation.0;
        if line < clip.top || line >= clip.bottom {
            return None;
        }

        let mut col = col + self.translation.1;
        let mut len = len;
        let mut skipped = 0;
        if col < clip.left {
            skipped = clip.left - col;
            len -= skipped;
            col = clip.left;
        }
        if col + len > clip.right {
            len = clip.right - col;
        }
        if len <= 0 {
            return None;
        }

        Some(Transformed {
            line: line as u16,
            col: col as u16,
            len: len as u16,
            skipped: skipped as u16,
        })
    }

    // ========== Span engine ==========

    /// Carve out a fresh span covering `[col, col + len)` on `line`.
    ///
    /// Any span crossing the right boundary is split: its tail gets a new
    /// head at `col + len` (text tails advance their display-column offset
    /// by the distance from the original head). A span running into the left
    /// boundary is shortened. The claimed region is left as a `Skip` head
    /// followed by continuations; the caller overwrites the head.
    ///
    /// # Panics
    ///
    /// Panics when the grid invariants are already broken, e.g. a `Cont`
    /// chain leading to a `Line` or `Cont` head.
    pub(crate) fn make_span(&mut self, line: u16, col: u16, len: u16) {
        debug_assert!(len > 0, "make_span needs a positive length");
        debug_assert!(col as usize + len as usize <= self.cols as usize);
        let end = col + len;

        // Right split.
        if end < self.cols {
            let crossing = *self.cell_ref(line, end);
            if let Cell::Cont { start } = crossing {
                let head = *self.cell_ref(line, start);
                let spanend = start + head.span_len();
                let tail_len = spanend - end;
                let tail_head = match head {
                    Cell::Skip { .. } => Cell::Skip { len: tail_len },
                    Cell::Text {
                        pen, text, offs, ..
                    } => Cell::Text {
                        len: tail_len,
                        pen,
                        text,
                        offs: offs + (end - start),
                    },
                    Cell::Erase { pen, .. } => Cell::Erase { len: tail_len, pen },
                    Cell::Line { .. } | Cell::Cont { .. } => {
                        panic!(
                            "span crossing ({line},{end}) has invalid head {head:?} at column {start}"
                        )
                    }
                };
                *self.cell_mut(line, end) = tail_head;
                for c in end + 1..spanend {
                    *self.cell_mut(line, c) = Cell::Cont { start: end };
                }
            }
        }

        // Left split.
        let left = *self.cell_ref(line, col);
        if let Cell::Cont { start } = left {
            let shortened = col - start;
            self.cell_mut(line, start).set_span_len(shortened);
        }

        // Claim.
        *self.cell_mut(line, col) = Cell::Skip { len };
        for c in col + 1..end {
            *self.cell_mut(line, c) = Cell::Cont { start: col };
        }
    }

    // ========== Absolute drawing operations ==========

    /// Mark `len` columns starting at `(line, col)` as deliberately
    /// untouched output.
    pub fn skip_at(&mut self, line: i32, col: i32, len: i32) {
        let Some(t) = self.transform(line, col, len) else {
            return;
        };
        self.make_span(t.line, t.col, t.len);
        *self.cell_mut(t.line, t.col) = Cell::Skip { len: t.len };
    }

    /// Place text at `(line, col)` with the given pen.
    ///
    /// The text occupies its display width in columns; parts outside the
    /// clip are dropped and the surviving span remembers how many columns
    /// were cut off its left.
    pub fn text_at(&mut self, line: i32, col: i32, text: &str, pen: &Pen) {
        self.text_at_width(line, col, text, display_width(text), pen);
    }

    fn text_at_width(&mut self, line: i32, col: i32, text: &str, width: usize, pen: &Pen) {
        let Some(t) = self.transform(line, col, width as i32) else {
            return;
        };
        let pen = self.pens.intern(pen);
        let text = self.texts.intern(text);
        self.make_span(t.line, t.col, t.len);
        *self.cell_mut(t.line, t.col) = Cell::Text {
            len: t.len,
            pen,
            text,
            offs: t.skipped,
        };
    }

    /// Place a single character at `(line, col)`.
    ///
    /// Equivalent to a one-column text span holding the single-codepoint
    /// string.
    pub fn char_at(&mut self, line: i32, col: i32, ch: char, pen: &Pen) {
        let Some(t) = self.transform(line, col, 1) else {
            return;
        };
        let pen = self.pens.intern(pen);
        let text = self.texts.intern(ch.encode_utf8(&mut [0u8; 4]));
        self.make_span(t.line, t.col, 1);
        *self.cell_mut(t.line, t.col) = Cell::Text {
            len: 1,
            pen,
            text,
            offs: 0,
        };
    }

    /// Fill `len` columns starting at `(line, col)` with the pen's
    /// background.
    pub fn erase_at(&mut self, line: i32, col: i32, len: i32, pen: &Pen) {
        let Some(t) = self.transform(line, col, len) else {
            return;
        };
        let pen = self.pens.intern(pen);
        self.make_span(t.line, t.col, t.len);
        *self.cell_mut(t.line, t.col) = Cell::Erase { len: t.len, pen };
    }

    /// Erase the whole buffer with the given pen.
    ///
    /// Both interning tables are emptied first and every row reset to a
    /// whole-row skip, so no stale id stays reachable even when a clip
    /// region keeps the erase from covering every cell.
    pub fn clear(&mut self, pen: &Pen) {
        self.pens.clear();
        self.texts.clear();
        self.reset_rows();
        let (lines, cols) = (self.lines, self.cols);
        for line in 0..lines {
            self.erase_at(i32::from(line), 0, i32::from(cols), pen);
        }
    }

    // ========== Virtual cursor and relative operations ==========

    /// Set the virtual cursor used by relative operations.
    pub fn goto(&mut self, line: i32, col: i32) {
        self.cursor = Some((line, col));
    }

    /// The virtual cursor position, if set.
    pub fn cursor(&self) -> Option<(i32, i32)> {
        self.cursor
    }

    fn require_cursor(&self) -> Result<(i32, i32), DrawError> {
        self.cursor.ok_or(DrawError::NoCursor)
    }

    /// Resolve the pen for a relative operation: an explicit pen conflicts
    /// with a stored one; with neither, the empty pen applies.
    fn resolve_pen(&self, pen: Option<&Pen>) -> Result<Pen, DrawError> {
        match (pen, self.pen.as_ref()) {
            (Some(_), Some(_)) => Err(DrawError::PenConflict),
            (Some(explicit), None) => Ok(*explicit),
            (None, Some(stored)) => Ok(*stored),
            (None, None) => Ok(Pen::EMPTY),
        }
    }

    /// Place text at the cursor and advance it by the text's width.
    pub fn text(&mut self, text: &str, pen: Option<&Pen>) -> Result<(), DrawError> {
        let (line, col) = self.require_cursor()?;
        let pen = self.resolve_pen(pen)?;
        let width = display_width(text);
        self.text_at_width(line, col, text, width, &pen);
        self.cursor = Some((line, col + width as i32));
        Ok(())
    }

    /// Erase `len` columns at the cursor and advance it.
    pub fn erase(&mut self, len: i32, pen: Option<&Pen>) -> Result<(), DrawError> {
        if len < 0 {
            return Err(DrawError::OutOfRange);
        }
        let (line, col) = self.require_cursor()?;
        let pen = self.resolve_pen(pen)?;
        self.erase_at(line, col, len, &pen);
        self.cursor = Some((line, col + len));
        Ok(())
    }

    /// Skip `len` columns at the cursor and advance it.
    pub fn skip(&mut self, len: i32) -> Result<(), DrawError> {
        if len < 0 {
            return Err(DrawError::OutOfRange);
        }
        let (line, col) = self.require_cursor()?;
        self.skip_at(line, col, len);
        self.cursor = Some((line, col + len));
        Ok(())
    }

    /// Skip from the cursor up to (not including) the target column.
    ///
    /// A target at or behind the cursor only moves the cursor.
    pub fn skip_to(&mut self, col: i32) -> Result<(), DrawError> {
        let (line, cur) = self.require_cursor()?;
        if col > cur {
            self.skip_at(line, cur, col - cur);
        }
        self.cursor = Some((line, col));
        Ok(())
    }

    /// Erase from the cursor up to (not including) the target column.
    ///
    /// A target at or behind the cursor only moves the cursor.
    pub fn erase_to(&mut self, col: i32, pen: Option<&Pen>) -> Result<(), DrawError> {
        let (line, cur) = self.require_cursor()?;
        let pen = self.resolve_pen(pen)?;
        if col > cur {
            self.erase_at(line, cur, col - cur, &pen);
        }
        self.cursor = Some((line, col));
        Ok(())
    }

    // ========== Pen, clip, translation, state stack ==========

    /// Set or clear the stored pen.
    ///
    /// When the top stack frame remembers a pen, the new pen is layered over
    /// that snapshot, so nested `set_pen` calls refine rather than replace
    /// their ancestor's attributes. `None` drops back to the snapshot.
    pub fn set_pen(&mut self, pen: Option<&Pen>) {
        let base = self.stack.last().and_then(StateFrame::pen).copied();
        self.pen = match (base, pen) {
            (Some(base), Some(pen)) => Some(Pen::merge(&base, pen)),
            (None, Some(pen)) => Some(*pen),
            (base, None) => base,
        };
    }

    /// Shrink the clip region to its overlap with `rect`.
    ///
    /// The rectangle is given in caller coordinates; the stored clip lives
    /// in output coordinates. Clip calls only ever narrow the region; the
    /// state stack is the one way back out.
    pub fn clip(&mut self, rect: Rect) {
        let translated = rect.translate(self.translation.0, self.translation.1);
        self.clip = self.clip.and_then(|active| active.intersect(&translated));
    }

    /// Add to the translation offset applied to incoming coordinates.
    pub fn translate(&mut self, dline: i32, dcol: i32) {
        self.translation.0 += dline;
        self.translation.1 += dcol;
    }

    /// Push a full state frame: cursor, clip, translation, and pen.
    pub fn save(&mut self) {
        self.stack.push(StateFrame::Full {
            cursor: self.cursor,
            clip: self.clip,
            translation: self.translation,
            pen: self.pen,
        });
    }

    /// Push a pen-only state frame.
    pub fn save_pen(&mut self) {
        self.stack.push(StateFrame::PenOnly { pen: self.pen });
    }

    /// Pop the top state frame and restore what it captured.
    ///
    /// # Panics
    ///
    /// Panics when no frame is on the stack; an unbalanced restore is a
    /// programming error.
    pub fn restore(&mut self) {
        match self.stack.pop() {
            Some(StateFrame::Full {
                cursor,
                clip,
                translation,
                pen,
            }) => {
                self.cursor = cursor;
                self.clip = clip;
                self.translation = translation;
                self.pen = pen;
            }
            Some(StateFrame::PenOnly { pen }) => {
                self.pen = pen;
            }
            None => panic!("restore without a matching save"),
        }
    }

    // ========== Reset ==========

    fn reset_rows(&mut self) {
        let (lines, cols) = (self.lines, self.cols);
        for line in 0..lines {
            *self.cell_mut(line, 0) = Cell::Skip { len: cols };
            for col in 1..cols {
                *self.cell_mut(line, col) = Cell::Cont { start: 0 };
            }
        }
    }

    /// Return the buffer to its construction-time state.
    ///
    /// Drops all spans, interned pens and texts, the cursor, the stored pen,
    /// the state stack, and restores the full-grid clip and zero
    /// translation. Called implicitly at the end of a flush.
    pub fn reset(&mut self) {
        self.reset_rows();
        self.pens.clear();
        self.texts.clear();
        self.cursor = None;
        self.clip = Some(Rect::from_size(self.lines, self.cols));
        self.translation = (0, 0);
        self.pen = None;
        self.stack.clear();
    }
}

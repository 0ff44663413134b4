#![forbid(unsafe_code)]

//! Flush: ordered, minimal emission of the buffer to a terminal sink.
//!
//! [`RenderBuffer::flush_to`] walks the grid row-major and emits the
//! smallest call sequence that realises it: a `goto` only when the sink's
//! cursor is not already in place, one `print` per text span, one `erasech`
//! per erase span, and one `print` per run of same-pen line cells. Skip
//! spans emit nothing at all, leaving whatever the window already shows.
//!
//! The buffer is authoritative: there is no diffing against previous window
//! contents. After emission the buffer resets, so a second flush with no
//! intervening drawing emits nothing.

use inkgrid_core::pen::Pen;

use crate::buffer::RenderBuffer;
use crate::cell::Cell;
use crate::slice_columns;

/// The terminal window interface the flush emits to.
///
/// `print` and `erasech` report how many columns the sink advanced, matching
/// the position bookkeeping a real terminal wrapper performs. The flush does
/// its own column accounting from span lengths and does not depend on the
/// returned values.
pub trait TermSink {
    /// Move the output cursor to a cell position.
    fn goto(&mut self, line: u16, col: u16);

    /// Print text with a pen, returning the columns advanced.
    fn print(&mut self, text: &str, pen: &Pen) -> u16;

    /// Erase `len` columns with a pen's background, returning the columns
    /// erased. `move_end` is `Some(true)` when the cursor must end up after
    /// the erased region because more output follows on the row.
    fn erasech(&mut self, len: u16, move_end: Option<bool>, pen: &Pen) -> u16;
}

impl RenderBuffer {
    /// Emit the buffer to `sink` and reset it.
    ///
    /// Emission is strictly row-major and left-to-right; a `goto` appears
    /// exactly when the current span does not continue where the previous
    /// call left the cursor.
    ///
    /// # Panics
    ///
    /// Panics when the grid invariants are broken (a continuation cell in
    /// head position), which indicates a bug in the span engine.
    pub fn flush_to<S: TermSink>(&mut self, sink: &mut S) {
        let _span =
            tracing::debug_span!("flush", lines = self.lines(), cols = self.cols()).entered();
        let (lines, cols) = (self.lines(), self.cols());

        for line in 0..lines {
            // The sink's column on this row, when known. Skip spans leave it
            // stale on purpose; erases without move_end discard it.
            let mut phys: Option<u16> = None;
            let mut col: u16 = 0;

            while col < cols {
                let cell = *self.cell_ref(line, col);
                if let Cell::Skip { len } = cell {
                    col += len;
                    continue;
                }

                if phys.is_none_or(|p| p < col) {
                    sink.goto(line, col);
                    phys = Some(col);
                }

                match cell {
                    Cell::Text {
                        len,
                        pen,
                        text,
                        offs,
                    } => {
                        let slice =
                            slice_columns(self.interned_text(text), offs as usize, len as usize);
                        sink.print(slice, self.interned_pen(pen));
                        phys = Some(col + len);
                        col += len;
                    }
                    Cell::Erase { len, pen } => {
                        let next = col + len;
                        let move_end = next < cols && !self.cell_ref(line, next).is_skip();
                        sink.erasech(len, move_end.then_some(true), self.interned_pen(pen));
                        phys = if move_end { Some(next) } else { None };
                        col = next;
                    }
                    Cell::Line { pen: run_pen, .. } => {
                        // Coalesce adjacent line cells sharing a pen into one
                        // print call.
                        let mut glyphs = String::new();
                        let mut run: u16 = 0;
                        while col + run < cols {
                            match *self.cell_ref(line, col + run) {
                                Cell::Line { pen, mask } if pen == run_pen => {
                                    glyphs.push(mask.glyph());
                                    run += 1;
                                }
                                _ => break,
                            }
                        }
                        sink.print(&glyphs, self.interned_pen(run_pen));
                        phys = Some(col + run);
                        col += run;
                    }
                    Cell::Cont { start } => {
                        panic!(
                            "continuation cell in head position at ({line},{col}), \
                             claiming a head at column {start}"
                        )
                    }
                    Cell::Skip { .. } => unreachable!("skip spans are handled above"),
                }
            }
        }

        tracing::trace!("buffer flushed");
        self.reset();
    }
}

#![forbid(unsafe_code)]

//! Headless sink for tests.
//!
//! [`RecordingSink`] implements [`TermSink`](crate::flush::TermSink) by
//! recording every call instead of talking to a terminal, so tests can
//! assert on the exact emission sequence a flush produces.
//!
//! # Example
//!
//! ```
//! use inkgrid_core::pen::Pen;
//! use inkgrid_render::buffer::RenderBuffer;
//! use inkgrid_render::headless::{RecordingSink, SinkCall};
//!
//! let mut rb = RenderBuffer::new(10, 20);
//! rb.text_at(2, 5, "Hello, world!", &Pen::EMPTY);
//!
//! let mut sink = RecordingSink::new();
//! rb.flush_to(&mut sink);
//! assert_eq!(
//!     sink.calls(),
//!     [
//!         SinkCall::goto(2, 5),
//!         SinkCall::print("Hello, world!", &Pen::EMPTY),
//!     ]
//! );
//! ```

use inkgrid_core::pen::Pen;

use crate::display_width;
use crate::flush::TermSink;

/// One recorded sink call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    /// A cursor move.
    Goto {
        /// Target line.
        line: u16,
        /// Target column.
        col: u16,
    },
    /// A text print.
    Print {
        /// The printed text.
        text: String,
        /// The pen it was printed with.
        pen: Pen,
    },
    /// An erase.
    Erase {
        /// Columns erased.
        len: u16,
        /// Whether the cursor was asked to end after the erased region.
        move_end: Option<bool>,
        /// The pen whose background was used.
        pen: Pen,
    },
}

impl SinkCall {
    /// A [`SinkCall::Goto`] value, for building expected sequences.
    pub fn goto(line: u16, col: u16) -> Self {
        Self::Goto { line, col }
    }

    /// A [`SinkCall::Print`] value, for building expected sequences.
    pub fn print(text: &str, pen: &Pen) -> Self {
        Self::Print {
            text: text.to_string(),
            pen: *pen,
        }
    }

    /// A [`SinkCall::Erase`] value, for building expected sequences.
    pub fn erase(len: u16, move_end: Option<bool>, pen: &Pen) -> Self {
        Self::Erase {
            len,
            move_end,
            pen: *pen,
        }
    }
}

/// A sink that records calls instead of emitting terminal output.
#[derive(Debug, Default)]
pub struct RecordingSink {
    calls: Vec<SinkCall>,
}

impl RecordingSink {
    /// Create an empty recording sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// The calls recorded so far, in order.
    pub fn calls(&self) -> &[SinkCall] {
        &self.calls
    }

    /// Drain the recorded calls.
    pub fn take(&mut self) -> Vec<SinkCall> {
        std::mem::take(&mut self.calls)
    }
}

impl TermSink for RecordingSink {
    fn goto(&mut self, line: u16, col: u16) {
        self.calls.push(SinkCall::Goto { line, col });
    }

    fn print(&mut self, text: &str, pen: &Pen) -> u16 {
        let columns = display_width(text) as u16;
        self.calls.push(SinkCall::Print {
            text: text.to_string(),
            pen: *pen,
        });
        columns
    }

    fn erasech(&mut self, len: u16, move_end: Option<bool>, pen: &Pen) -> u16 {
        self.calls.push(SinkCall::Erase {
            len,
            move_end,
            pen: *pen,
        });
        len
    }
}

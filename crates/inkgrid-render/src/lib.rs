#![forbid(unsafe_code)]

//! Render buffer kernel: cells, spans, line art, and minimal flush emission.
//!
//! A [`buffer::RenderBuffer`] accumulates drawing operations into a grid of
//! cell spans and then [`flush::TermSink`]-flushes them as an ordered,
//! minimal sequence of cursor moves, prints, and erases. Nothing here touches
//! a real terminal; the sink trait is the only boundary.

pub mod buffer;
pub mod cell;
pub mod flush;
pub mod headless;
pub mod intern;
pub mod line;

mod text_width {
    use unicode_segmentation::UnicodeSegmentation;

    /// Display width of one grapheme cluster.
    ///
    /// Printable ASCII is the hot path and each byte is one column; anything
    /// else defers to the East-Asian-width tables.
    #[inline]
    pub(crate) fn grapheme_width(grapheme: &str) -> usize {
        if grapheme.is_ascii() {
            grapheme.len()
        } else {
            unicode_display_width::width(grapheme) as usize
        }
    }

    /// Display width of a string in terminal columns.
    #[inline]
    pub(crate) fn display_width(text: &str) -> usize {
        if text.is_ascii() {
            return text.len();
        }
        text.graphemes(true).map(grapheme_width).sum()
    }

    /// The substring covering display columns `[offs, offs + len)`.
    ///
    /// Both boundaries round down to grapheme-column boundaries: a
    /// double-width glyph straddling `offs` is skipped entirely, and one
    /// straddling the end column is excluded. The result may therefore cover
    /// fewer than `len` columns, never more.
    pub(crate) fn slice_columns(text: &str, offs: usize, len: usize) -> &str {
        let target_end = offs.saturating_add(len);
        let mut col = 0usize;
        let mut start = None;
        let mut end = text.len();

        for (idx, grapheme) in text.grapheme_indices(true) {
            if start.is_none() && col >= offs {
                start = Some(idx);
            }
            let width = grapheme_width(grapheme);
            if col + width > target_end {
                end = idx;
                break;
            }
            col += width;
        }

        match start {
            Some(start) if start <= end => &text[start..end],
            _ => "",
        }
    }

}

pub(crate) use text_width::{display_width, slice_columns};

#![forbid(unsafe_code)]

//! Line drawing: direction/weight masks, cap flags, and glyph selection.
//!
//! Each line cell accumulates an 8-bit mask of four 2-bit weight fields, one
//! per compass direction. Weights are `0` (no arm), `1` (single), `2`
//! (double), `3` (thick). Crossing lines OR their masks together, so a
//! horizontal drawn over a vertical becomes the right tee or cross glyph at
//! flush time.
//!
//! Glyph selection goes through a process-wide 256-entry table built once
//! from the embedded `(char, mask)` list below. Masks with no direct entry
//! degrade: first by keeping only the high weight bit of every field
//! (`mask & 0xAA`, which collapses mixed double/single and thick/double
//! combinations onto the pure-double shapes), then by downgrading one
//! double-weight arm to single. The table covers every reachable mask; a gap
//! would be a bug in the list and fails construction.

use std::sync::LazyLock;

use bitflags::bitflags;
use inkgrid_core::pen::Pen;

use crate::buffer::RenderBuffer;
use crate::cell::Cell;

/// Weight of a line arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LineStyle {
    /// Single-weight line.
    Single = 1,
    /// Double line.
    Double = 2,
    /// Thick (heavy) line.
    Thick = 3,
}

impl LineStyle {
    /// The 2-bit weight value stored in a mask field.
    #[inline]
    pub const fn weight(self) -> u8 {
        self as u8
    }
}

bitflags! {
    /// Which ends of a line receive an outward-pointing cap arm.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct CapEnds: u8 {
        /// Extend the first cell's outward arm.
        const START = 0b01;
        /// Extend the last cell's outward arm.
        const END   = 0b10;
        /// Both ends capped.
        const BOTH  = 0b11;
    }
}

/// Accumulated direction/weight mask for one line cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[repr(transparent)]
pub struct LineMask(u8);

impl LineMask {
    /// No arms in any direction.
    pub const EMPTY: Self = Self(0);

    /// Bit shift of the northward weight field.
    pub const NORTH_SHIFT: u8 = 0;
    /// Bit shift of the eastward weight field.
    pub const EAST_SHIFT: u8 = 2;
    /// Bit shift of the southward weight field.
    pub const SOUTH_SHIFT: u8 = 4;
    /// Bit shift of the westward weight field.
    pub const WEST_SHIFT: u8 = 6;

    /// Raw mask bits.
    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub(crate) const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// OR further arm bits into the mask.
    #[inline]
    pub(crate) const fn union_bits(self, bits: u8) -> Self {
        Self(self.0 | bits)
    }

    /// The box-drawing character realising this mask.
    ///
    /// An empty mask renders as a space; every non-empty mask resolves to a
    /// glyph through the table's degradation rules.
    #[inline]
    pub fn glyph(self) -> char {
        if self.0 == 0 { ' ' } else { GLYPHS[self.0 as usize] }
    }
}

// Per-direction field values used by the embedded table. Single/double/thick
// in the north, east, south, and west fields respectively.
const NS: u8 = 0x01;
const ND: u8 = 0x02;
const NT: u8 = 0x03;
const ES: u8 = 0x04;
const ED: u8 = 0x08;
const ET: u8 = 0x0C;
const SS: u8 = 0x10;
const SD: u8 = 0x20;
const ST: u8 = 0x30;
const WS: u8 = 0x40;
const WD: u8 = 0x80;
const WT: u8 = 0xC0;

/// The embedded glyph table: every box-drawing character the buffer can emit,
/// keyed by its exact direction/weight mask.
const GLYPH_SEEDS: &[(char, u8)] = &[
    // Straight runs.
    ('─', ES | WS),
    ('━', ET | WT),
    ('│', NS | SS),
    ('┃', NT | ST),
    // Corners, light/heavy.
    ('┌', SS | ES),
    ('┍', SS | ET),
    ('┎', ST | ES),
    ('┏', ST | ET),
    ('┐', SS | WS),
    ('┑', SS | WT),
    ('┒', ST | WS),
    ('┓', ST | WT),
    ('└', NS | ES),
    ('┕', NS | ET),
    ('┖', NT | ES),
    ('┗', NT | ET),
    ('┘', NS | WS),
    ('┙', NS | WT),
    ('┚', NT | WS),
    ('┛', NT | WT),
    // Right-pointing tees.
    ('├', NS | SS | ES),
    ('┝', NS | SS | ET),
    ('┞', NT | SS | ES),
    ('┟', NS | ST | ES),
    ('┠', NT | ST | ES),
    ('┡', NT | SS | ET),
    ('┢', NS | ST | ET),
    ('┣', NT | ST | ET),
    // Left-pointing tees.
    ('┤', NS | SS | WS),
    ('┥', NS | SS | WT),
    ('┦', NT | SS | WS),
    ('┧', NS | ST | WS),
    ('┨', NT | ST | WS),
    ('┩', NT | SS | WT),
    ('┪', NS | ST | WT),
    ('┫', NT | ST | WT),
    // Down-pointing tees.
    ('┬', ES | WS | SS),
    ('┭', ES | WT | SS),
    ('┮', ET | WS | SS),
    ('┯', ET | WT | SS),
    ('┰', ES | WS | ST),
    ('┱', ES | WT | ST),
    ('┲', ET | WS | ST),
    ('┳', ET | WT | ST),
    // Up-pointing tees.
    ('┴', ES | WS | NS),
    ('┵', ES | WT | NS),
    ('┶', ET | WS | NS),
    ('┷', ET | WT | NS),
    ('┸', ES | WS | NT),
    ('┹', ES | WT | NT),
    ('┺', ET | WS | NT),
    ('┻', ET | WT | NT),
    // Crosses.
    ('┼', NS | ES | SS | WS),
    ('┽', NS | ES | SS | WT),
    ('┾', NS | ET | SS | WS),
    ('┿', NS | ET | SS | WT),
    ('╀', NT | ES | SS | WS),
    ('╁', NS | ES | ST | WS),
    ('╂', NT | ES | ST | WS),
    ('╃', NT | ES | SS | WT),
    ('╄', NT | ET | SS | WS),
    ('╅', NS | ES | ST | WT),
    ('╆', NS | ET | ST | WS),
    ('╇', NT | ET | SS | WT),
    ('╈', NS | ET | ST | WT),
    ('╉', NT | ES | ST | WT),
    ('╊', NT | ET | ST | WS),
    ('╋', NT | ET | ST | WT),
    // Double runs and their single-weight hybrids.
    ('═', ED | WD),
    ('║', ND | SD),
    ('╒', SS | ED),
    ('╓', SD | ES),
    ('╔', SD | ED),
    ('╕', SS | WD),
    ('╖', SD | WS),
    ('╗', SD | WD),
    ('╘', NS | ED),
    ('╙', ND | ES),
    ('╚', ND | ED),
    ('╛', NS | WD),
    ('╜', ND | WS),
    ('╝', ND | WD),
    ('╞', NS | SS | ED),
    ('╟', ND | SD | ES),
    ('╠', ND | SD | ED),
    ('╡', NS | SS | WD),
    ('╢', ND | SD | WS),
    ('╣', ND | SD | WD),
    ('╤', ED | WD | SS),
    ('╥', ES | WS | SD),
    ('╦', ED | WD | SD),
    ('╧', ED | WD | NS),
    ('╨', ES | WS | ND),
    ('╩', ED | WD | ND),
    ('╪', ED | WD | NS | SS),
    ('╫', ES | WS | ND | SD),
    ('╬', ND | ED | SD | WD),
    // Dangling half-lines.
    ('╴', WS),
    ('╵', NS),
    ('╶', ES),
    ('╷', SS),
    ('╸', WT),
    ('╹', NT),
    ('╺', ET),
    ('╻', ST),
    ('╼', WS | ET),
    ('╽', NS | ST),
    ('╾', WT | ES),
    ('╿', NT | SS),
];

static GLYPHS: LazyLock<[char; 256]> = LazyLock::new(build_glyph_table);

fn build_glyph_table() -> [char; 256] {
    let mut table = ['\0'; 256];
    for &(ch, mask) in GLYPH_SEEDS {
        debug_assert_eq!(table[mask as usize], '\0', "duplicate seed for {mask:#04x}");
        table[mask as usize] = ch;
    }

    // Degradations consult the seeded entries only; chaining through an
    // already-degraded entry would pick a worse shape than necessary.
    let seeded = table;

    for mask in 1..256usize {
        if table[mask] != '\0' {
            continue;
        }

        // Keep only the high weight bit of every field: mixed double/single
        // and thick/double combinations collapse onto the pure-double shape.
        let collapsed = mask & 0xAA;
        if seeded[collapsed] != '\0' {
            table[mask] = seeded[collapsed];
            continue;
        }

        // Downgrade one double-weight arm to single, first hit wins.
        let mut glyph = '\0';
        for shift in [
            LineMask::NORTH_SHIFT,
            LineMask::EAST_SHIFT,
            LineMask::SOUTH_SHIFT,
            LineMask::WEST_SHIFT,
        ] {
            if (mask >> shift) & 0b11 == 0b10 {
                let candidate = (mask & !(0b11 << shift)) | (0b01 << shift);
                if seeded[candidate] != '\0' {
                    glyph = seeded[candidate];
                    break;
                }
            }
        }
        assert!(glyph != '\0', "no glyph or fallback for line mask {mask:#04x}");
        table[mask] = glyph;
    }

    table
}

impl RenderBuffer {
    /// OR arm bits into the line cell at the given position.
    ///
    /// A non-line cell at the target is carved into a fresh one-column line
    /// span. A line cell drawn with a different pen logs a diagnostic, drops
    /// the accumulated mask, and adopts the new pen; masks only merge within
    /// one pen.
    pub fn line_cell(&mut self, line: i32, col: i32, bits: u8, pen: &Pen) {
        let Some(t) = self.transform(line, col, 1) else {
            return;
        };
        let pen_id = self.intern_pen(pen);

        let current = *self.cell_ref(t.line, t.col);
        match current {
            Cell::Line { pen: existing, mask } if existing == pen_id => {
                *self.cell_mut(t.line, t.col) = Cell::Line {
                    pen: pen_id,
                    mask: mask.union_bits(bits),
                };
            }
            Cell::Line { .. } => {
                tracing::warn!(
                    line = t.line,
                    col = t.col,
                    "line cell drawn with a different pen; restarting mask"
                );
                *self.cell_mut(t.line, t.col) = Cell::Line {
                    pen: pen_id,
                    mask: LineMask::from_bits(bits),
                };
            }
            _ => {
                self.make_span(t.line, t.col, 1);
                *self.cell_mut(t.line, t.col) = Cell::Line {
                    pen: pen_id,
                    mask: LineMask::from_bits(bits),
                };
            }
        }
    }

    /// Draw a horizontal line across columns `startcol ..= endcol`.
    ///
    /// Interior cells carry both east and west arms. The first cell's west
    /// arm and the last cell's east arm appear only with the matching
    /// [`CapEnds`] flag.
    pub fn hline_at(
        &mut self,
        line: i32,
        startcol: i32,
        endcol: i32,
        style: LineStyle,
        pen: &Pen,
        caps: CapEnds,
    ) {
        let weight = style.weight();
        for col in startcol..=endcol {
            let mut bits = 0u8;
            if col > startcol || caps.contains(CapEnds::START) {
                bits |= weight << LineMask::WEST_SHIFT;
            }
            if col < endcol || caps.contains(CapEnds::END) {
                bits |= weight << LineMask::EAST_SHIFT;
            }
            self.line_cell(line, col, bits, pen);
        }
    }

    /// Draw a vertical line across lines `startline ..= endline`.
    ///
    /// The transpose of [`RenderBuffer::hline_at`]: interior cells carry
    /// north and south arms, the end cells' outward arms follow the caps.
    pub fn vline_at(
        &mut self,
        startline: i32,
        endline: i32,
        col: i32,
        style: LineStyle,
        pen: &Pen,
        caps: CapEnds,
    ) {
        let weight = style.weight();
        for line in startline..=endline {
            let mut bits = 0u8;
            if line > startline || caps.contains(CapEnds::START) {
                bits |= weight << LineMask::NORTH_SHIFT;
            }
            if line < endline || caps.contains(CapEnds::END) {
                bits |= weight << LineMask::SOUTH_SHIFT;
            }
            self.line_cell(line, col, bits, pen);
        }
    }
}

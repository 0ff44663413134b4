//! Property tests over the public drawing surface: grid integrity, emission
//! ordering, and the algebraic laws of clipping and translation.

use inkgrid_core::geometry::Rect;
use inkgrid_core::pen::Pen;
use inkgrid_render::buffer::RenderBuffer;
use inkgrid_render::cell::Cell;
use inkgrid_render::headless::{RecordingSink, SinkCall};
use proptest::prelude::*;

const LINES: u16 = 12;
const COLS: u16 = 24;

#[derive(Debug, Clone)]
enum Op {
    TextAt { line: i32, col: i32, width: usize },
    EraseAt { line: i32, col: i32, len: i32 },
    SkipAt { line: i32, col: i32, len: i32 },
    CharAt { line: i32, col: i32 },
    LineCell { line: i32, col: i32, bits: u8 },
    Goto { line: i32, col: i32 },
    Text { width: usize },
    Erase { len: i32 },
    Skip { len: i32 },
    SkipTo { col: i32 },
    EraseTo { col: i32 },
    SetPen { fg: Option<i32> },
    Clip { rect: (i32, i32, i32, i32) },
    Translate { dline: i32, dcol: i32 },
    Save,
    SavePen,
    Restore,
    Clear,
}

fn arb_draw_op() -> impl Strategy<Value = Op> {
    let coords = (-4i32..LINES as i32 + 4, -8i32..COLS as i32 + 8);
    prop_oneof![
        (coords.clone(), 1usize..14).prop_map(|((line, col), width)| Op::TextAt { line, col, width }),
        (coords.clone(), 1i32..14).prop_map(|((line, col), len)| Op::EraseAt { line, col, len }),
        (coords.clone(), 1i32..14).prop_map(|((line, col), len)| Op::SkipAt { line, col, len }),
        coords.clone().prop_map(|(line, col)| Op::CharAt { line, col }),
        (coords.clone(), 1u8..=255).prop_map(|((line, col), bits)| Op::LineCell { line, col, bits }),
        coords.prop_map(|(line, col)| Op::Goto { line, col }),
        (1usize..10).prop_map(|width| Op::Text { width }),
        (1i32..10).prop_map(|len| Op::Erase { len }),
        (1i32..10).prop_map(|len| Op::Skip { len }),
    ]
}

fn arb_state_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (-4i32..COLS as i32 + 4).prop_map(|col| Op::SkipTo { col }),
        (-4i32..COLS as i32 + 4).prop_map(|col| Op::EraseTo { col }),
        proptest::option::of(0i32..8).prop_map(|fg| Op::SetPen { fg }),
        (0i32..LINES as i32, 0i32..COLS as i32, 1i32..8, 1i32..10).prop_map(
            |(top, left, dl, dc)| Op::Clip {
                rect: (top, left, top + dl, left + dc)
            }
        ),
        (-3i32..4, -3i32..4).prop_map(|(dline, dcol)| Op::Translate { dline, dcol }),
        Just(Op::Save),
        Just(Op::SavePen),
        Just(Op::Restore),
        Just(Op::Clear),
    ]
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => arb_draw_op(),
        1 => arb_state_op(),
    ]
}

/// Apply an op through the public API, keeping save/restore balanced.
fn apply(rb: &mut RenderBuffer, op: &Op, depth: &mut usize) {
    let sample = "quick brown fox!";
    match *op {
        Op::TextAt { line, col, width } => {
            rb.text_at(line, col, &sample[..width.min(sample.len())], &Pen::EMPTY);
        }
        Op::EraseAt { line, col, len } => rb.erase_at(line, col, len, &Pen::new().with_bg(1)),
        Op::SkipAt { line, col, len } => rb.skip_at(line, col, len),
        Op::CharAt { line, col } => rb.char_at(line, col, '#', &Pen::EMPTY),
        Op::LineCell { line, col, bits } => rb.line_cell(line, col, bits, &Pen::EMPTY),
        Op::Goto { line, col } => rb.goto(line, col),
        Op::Text { width } => {
            let _ = rb.text(&sample[..width.min(sample.len())], None);
        }
        Op::Erase { len } => {
            let _ = rb.erase(len, None);
        }
        Op::Skip { len } => {
            let _ = rb.skip(len);
        }
        Op::SkipTo { col } => {
            let _ = rb.skip_to(col);
        }
        Op::EraseTo { col } => {
            let _ = rb.erase_to(col, None);
        }
        Op::SetPen { fg } => rb.set_pen(fg.map(|fg| Pen::new().with_fg(fg)).as_ref()),
        Op::Clip {
            rect: (top, left, bottom, right),
        } => rb.clip(Rect::new(top, left, bottom, right)),
        Op::Translate { dline, dcol } => rb.translate(dline, dcol),
        Op::Save => {
            rb.save();
            *depth += 1;
        }
        Op::SavePen => {
            rb.save_pen();
            *depth += 1;
        }
        Op::Restore => {
            if *depth > 0 {
                rb.restore();
                *depth -= 1;
            }
        }
        Op::Clear => rb.clear(&Pen::new().with_bg(2)),
    }
}

/// Assert the head/continuation invariants of every row.
fn assert_grid_integrity(rb: &RenderBuffer) {
    for line in 0..rb.lines() {
        let row = rb.row_cells(line);
        assert!(
            !row[0].is_cont(),
            "row {line} starts with a continuation cell"
        );
        let mut col = 0usize;
        while col < row.len() {
            let len = row[col].span_len() as usize;
            assert!(
                len > 0,
                "cell {:?} at ({line},{col}) is not a span head",
                row[col]
            );
            if matches!(row[col], Cell::Line { .. }) {
                assert_eq!(len, 1, "line head at ({line},{col}) longer than one");
            }
            for c in col + 1..col + len {
                assert_eq!(
                    row[c],
                    Cell::Cont { start: col as u16 },
                    "continuation at ({line},{c}) does not point at its head"
                );
            }
            col += len;
        }
        assert_eq!(col, row.len(), "spans overrun row {line}");
    }
}

/// Assert the ordering guarantees of an emitted call sequence.
fn assert_emission_order(calls: &[SinkCall]) {
    let mut last_line: Option<u16> = None;
    // Position after the previous operation on the current row, whether or
    // not the sink's cursor was left there.
    let mut logical_col: u32 = 0;
    let mut positioned = false;

    for call in calls {
        match call {
            SinkCall::Goto { line, col } => {
                if let Some(last) = last_line {
                    assert!(
                        *line >= last,
                        "row went backwards: goto({line},{col}) after row {last}"
                    );
                    if *line == last {
                        assert!(
                            u32::from(*col) >= logical_col,
                            "column went backwards within row {line}: goto to {col} after {logical_col}"
                        );
                    }
                }
                last_line = Some(*line);
                logical_col = u32::from(*col);
                positioned = true;
            }
            SinkCall::Print { text, .. } => {
                assert!(positioned, "print before any goto");
                logical_col += text.chars().count() as u32;
            }
            SinkCall::Erase { len, .. } => {
                assert!(positioned, "erase before any goto");
                logical_col += u32::from(*len);
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn grid_integrity_and_emission_order_hold(ops in proptest::collection::vec(arb_op(), 0..80)) {
        let mut rb = RenderBuffer::new(LINES, COLS);
        let mut depth = 0usize;
        for op in &ops {
            apply(&mut rb, op, &mut depth);
            assert_grid_integrity(&rb);
        }

        let mut sink = RecordingSink::new();
        rb.flush_to(&mut sink);
        assert_emission_order(sink.calls());
    }

    #[test]
    fn second_flush_emits_nothing(ops in proptest::collection::vec(arb_op(), 0..40)) {
        let mut rb = RenderBuffer::new(LINES, COLS);
        let mut depth = 0usize;
        for op in &ops {
            apply(&mut rb, op, &mut depth);
        }

        let mut first = RecordingSink::new();
        rb.flush_to(&mut first);

        let mut second = RecordingSink::new();
        rb.flush_to(&mut second);
        prop_assert!(second.calls().is_empty());
    }

    #[test]
    fn clip_is_idempotent(
        ops in proptest::collection::vec(arb_op(), 0..30),
        top in 0i32..8,
        left in 0i32..16,
    ) {
        let rect = Rect::new(top, left, top + 4, left + 6);

        let mut once = RenderBuffer::new(LINES, COLS);
        once.clip(rect);
        let mut twice = RenderBuffer::new(LINES, COLS);
        twice.clip(rect);
        twice.clip(rect);

        let mut depth_a = 0usize;
        let mut depth_b = 0usize;
        for op in &ops {
            apply(&mut once, op, &mut depth_a);
            apply(&mut twice, op, &mut depth_b);
        }

        let mut sink_a = RecordingSink::new();
        once.flush_to(&mut sink_a);
        let mut sink_b = RecordingSink::new();
        twice.flush_to(&mut sink_b);
        prop_assert_eq!(sink_a.calls(), sink_b.calls());
    }

    #[test]
    fn translation_inverse_matches_pretranslated_draws(
        dline in -5i32..6,
        dcol in -5i32..6,
        line in 0i32..LINES as i32,
        col in 0i32..COLS as i32,
    ) {
        let p = Pen::new().with_fg(1);

        let mut translated = RenderBuffer::new(LINES, COLS);
        translated.translate(dline, dcol);
        translated.text_at(line, col, "marker", &p);
        translated.translate(-dline, -dcol);
        translated.text_at(0, 0, "x", &p);

        let mut direct = RenderBuffer::new(LINES, COLS);
        direct.text_at(line + dline, col + dcol, "marker", &p);
        direct.text_at(0, 0, "x", &p);

        let mut sink_a = RecordingSink::new();
        translated.flush_to(&mut sink_a);
        let mut sink_b = RecordingSink::new();
        direct.flush_to(&mut sink_b);
        prop_assert_eq!(sink_a.calls(), sink_b.calls());
    }

    #[test]
    fn covering_overwrite_wins(
        col in 0i32..10,
        len in 1i32..8,
    ) {
        let p = Pen::new().with_fg(1);
        let q = Pen::new().with_bg(2);

        let mut rb = RenderBuffer::new(LINES, COLS);
        rb.text_at(3, col, "old content!", &p);
        // Fully cover the old span and more.
        rb.erase_at(3, col - 1, 12 + len + 2, &q);

        let mut sink = RecordingSink::new();
        rb.flush_to(&mut sink);
        for call in sink.calls() {
            prop_assert!(
                !matches!(call, SinkCall::Print { .. }),
                "covered text still printed: {call:?}"
            );
        }
    }
}

#![forbid(unsafe_code)]

//! Core primitives shared by the inkgrid crates: output-space rectangles
//! and immutable pen attribute bundles.

pub mod geometry;
pub mod pen;

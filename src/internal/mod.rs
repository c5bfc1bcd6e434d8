//! Internal modules ported from external libraries.
//!
//! These modules contain code adapted from:
//! - opencv: color conversion and thresholding primitives

pub mod cv;

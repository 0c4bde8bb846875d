//! Cross-section spectroscopy for laser gain media.
//!
//! Turns raw absorption, reference and fluorescence curves of a doped crystal
//! into calibrated absorption and emission cross sections. See
//! [`modules::pipeline::derive`] for the end-to-end entry point.

pub mod common;
pub mod domain;
pub mod modules;
pub mod numerics;

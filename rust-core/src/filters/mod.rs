//! Offline filtering of simulation signals

pub mod iir;

pub use iir::{shift_sequence, IirFilter};

//! Built-in indicator implementations provided by the crate.

pub mod moving_min;

pub use moving_min::MovingMin;

//! Value types used during evaluation
mod interval;
mod interval_box;
mod round;

pub use interval::{DivisionPolicy, Interval};
pub use interval_box::IntervalBox;

pub(crate) use interval_box::check_dimension;

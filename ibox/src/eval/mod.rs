//! Evaluation of interval functions
//!
//! Anything evaluable implements [`BoxFunction`], which provides both the
//! structured ([`eval_box`](BoxFunction::eval_box)) and flat-buffer
//! ([`eval_raw`](BoxFunction::eval_raw)) calling conventions.  Expressions
//! built as a [`Tree`] are compiled into a [`Tape`]; hand-coded functions are
//! wrapped in an [`FnFunction`].
use crate::{
    Error,
    context::Tree,
    types::{Interval, IntervalBox},
};

mod config;
mod function;
mod tape;

pub use config::{EvalConfig, ThreadPool};
pub use function::{BoxFunction, FnFunction};
pub use tape::{Tape, TapeOp};

/// Evaluates a tree on a box with the default [`EvalConfig`]
///
/// The tree may read any of the box's dimensions; reading past the end of the
/// box is an [`Error::BadInput`].
///
/// ```
/// use ibox::{context::Tree, eval::evaluate, types::{Interval, IntervalBox}};
///
/// let [x, y] = Tree::inputs();
/// let f = x.clone() * (1.0 - x) * (1.0 - y);
/// let b = IntervalBox::from_bounds(&[[0.0, 1.0], [0.0, 1.0]])?;
/// let v = evaluate(&f, &b)?;
/// assert!(v.encloses(Interval::new(0.0, 0.25)?));
/// # Ok::<(), ibox::Error>(())
/// ```
pub fn evaluate(expr: &Tree, b: &IntervalBox) -> Result<Interval, Error> {
    EvalConfig::default().evaluate(expr, b)
}

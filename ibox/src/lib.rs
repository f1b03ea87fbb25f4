//! `ibox` is a library for sound interval evaluation of closed-form functions
//! over axis-aligned boxes.
//!
//! Given a function `f(x, y, ...)` and a **box** (one interval per input),
//! interval evaluation returns a single interval which is guaranteed to contain
//! `f(p)` for every point `p` in the box.  The result may overestimate the true
//! range but never underestimates it: every bound is rounded outward, so the
//! guarantee survives floating-point error.
//!
//! This is the primitive used by branch-and-bound global optimizers, which
//! discard any box whose interval bound cannot beat the best value found so
//! far.
//!
//! # Intervals
//! The basic value type is [`Interval`](crate::types::Interval), which is
//! always valid by construction:
//! ```
//! use ibox::types::Interval;
//!
//! let a = Interval::new(-1.0, 2.0)?;
//! assert_eq!(a.powi(2), Interval::new(0.0, 4.0)?);
//! assert!(Interval::new(2.0, 1.0).is_err());
//! # Ok::<(), ibox::Error>(())
//! ```
//!
//! # Functions
//! Functions are built as expression trees in the
//! [`context`](crate::context) module, using overloaded operators:
//! ```
//! use ibox::{context::Tree, eval::evaluate, types::IntervalBox};
//!
//! let [x, y] = Tree::inputs();
//! let f = x.clone() * (1.0 - x) * (1.0 - y);
//! let b = IntervalBox::from_bounds(&[[0.0, 1.0], [0.0, 1.0]])?;
//! let v = evaluate(&f, &b)?;
//! assert!(v.lower() <= 0.0 && v.upper() >= 0.25);
//! # Ok::<(), ibox::Error>(())
//! ```
//!
//! For repeated evaluation, a tree should be compiled once into a
//! [`Tape`](crate::eval::Tape).  Tapes and hand-coded closures
//! ([`FnFunction`](crate::eval::FnFunction)) both implement
//! [`BoxFunction`](crate::eval::BoxFunction), which offers a structured
//! calling convention (`eval_box`) and a flat-buffer one (`eval_raw`); the two
//! return bit-identical results.
//!
//! Evaluation policy (division by intervals containing zero, thread pool for
//! batch evaluation) is set with an [`EvalConfig`](crate::eval::EvalConfig).
#![warn(missing_docs)]

pub mod context;
pub mod eval;
pub mod types;

mod error;
pub use error::Error;

//! Two-dimensional test functions `F0`..`F4`
//!
//! Each function is written twice: once as a hand-coded closure over interval
//! arithmetic, and once as an expression [`Tree`].  The two forms perform the
//! same operations in the same order, so their results are bit-identical.
#![allow(dead_code)]

use ibox::{
    context::Tree,
    eval::{BoxFunction, FnFunction, Tape},
    types::{Interval, IntervalBox},
};

/// Every fixture reads `x` and `y`
pub const ARITY: usize = 2;

/// A named test function, in both hand-coded and tree form
pub struct Fixture {
    pub name: &'static str,
    pub core: fn(&[Interval]) -> Interval,
    pub tree: fn() -> Tree,
}

impl Fixture {
    /// Hand-coded form, checking its input dimension
    pub fn function(&self) -> impl BoxFunction + use<> {
        let core = self.core;
        FnFunction::new(ARITY, move |v: &[Interval]| Ok(core(v)))
    }

    /// Compiled form
    pub fn tape(&self) -> Tape {
        Tape::new(&(self.tree)(), ARITY).unwrap()
    }
}

pub const FIXTURES: [Fixture; 5] = [
    Fixture {
        name: "F0",
        core: f0,
        tree: f0_tree,
    },
    Fixture {
        name: "F1",
        core: f1,
        tree: f1_tree,
    },
    Fixture {
        name: "F2",
        core: f2,
        tree: f2_tree,
    },
    Fixture {
        name: "F3",
        core: f3,
        tree: f3_tree,
    },
    Fixture {
        name: "F4",
        core: f4,
        tree: f4_tree,
    },
];

/// `-(12x² - 6.3x⁴ + x⁶ + 3xy - 12y² + 12y⁴)`
pub fn f0(v: &[Interval]) -> Interval {
    let (x, y) = (v[0], v[1]);
    -(x.powi(2) * 12.0 - x.powi(4) * 6.3 + x.powi(6) + x * y * 3.0
        - y.powi(2) * 12.0
        + y.powi(4) * 12.0)
}

pub fn f0_tree() -> Tree {
    let [x, y] = Tree::inputs();
    -(x.pow(2) * 12.0 - x.pow(4) * 6.3 + x.pow(6) + x * y.clone() * 3.0
        - y.pow(2) * 12.0
        + y.pow(4) * 12.0)
}

/// `x (1 - x) (1 - y)`
pub fn f1(v: &[Interval]) -> Interval {
    let (x, y) = (v[0], v[1]);
    x * (1.0 - x) * (1.0 - y)
}

pub fn f1_tree() -> Tree {
    let [x, y] = Tree::inputs();
    x.clone() * (1.0 - x) * (1.0 - y)
}

/// `x⁴ + y⁴` followed by `n` alternating `∓3x ∓3y` terms, which cancel
/// in exact arithmetic but not in interval arithmetic
fn alternating(v: &[Interval], n: usize) -> Interval {
    let (x, y) = (v[0], v[1]);
    let mut out = x.powi(4) + y.powi(4);
    for i in 0..n {
        let term = if i % 2 == 0 { x * 3.0 } else { y * 3.0 };
        out = if (i / 2) % 2 == 0 { out - term } else { out + term };
    }
    out
}

fn alternating_tree(n: usize) -> Tree {
    let [x, y] = Tree::inputs();
    let mut out = x.pow(4) + y.pow(4);
    for i in 0..n {
        let term = if i % 2 == 0 {
            x.clone() * 3.0
        } else {
            y.clone() * 3.0
        };
        out = if (i / 2) % 2 == 0 { out - term } else { out + term };
    }
    out
}

pub fn f2(v: &[Interval]) -> Interval {
    alternating(v, 8)
}

pub fn f2_tree() -> Tree {
    alternating_tree(8)
}

pub fn f3(v: &[Interval]) -> Interval {
    alternating(v, 16)
}

pub fn f3_tree() -> Tree {
    alternating_tree(16)
}

pub fn f4(v: &[Interval]) -> Interval {
    alternating(v, 32)
}

pub fn f4_tree() -> Tree {
    alternating_tree(32)
}

/// Representative 2-D boxes, including degenerate and zero-straddling ones
pub fn boxes() -> Vec<IntervalBox> {
    [
        [[0.0, 1.0], [0.0, 1.0]],
        [[-1.0, 1.0], [-1.0, 1.0]],
        [[2.0, 2.0], [-3.0, -3.0]],
        [[-0.5, 0.25], [1.0, 3.0]],
        [[-1e3, 1e-3], [0.0, 0.0]],
        [[-2.0, -1.0], [-0.1, 0.1]],
        [[0.1, 0.7], [-5.5, 2.25]],
    ]
    .iter()
    .map(|b| IntervalBox::from_bounds(b).unwrap())
    .collect()
}

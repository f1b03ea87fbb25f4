//! Flat, deduplicated instruction lists for interval evaluation
use crate::{
    Error,
    context::{BinaryOpcode, Tree, TreeOp, UnaryOpcode},
    eval::{BoxFunction, EvalConfig},
    types::{DivisionPolicy, Interval, check_dimension},
};
use ordered_float::OrderedFloat;
use std::collections::HashMap;

/// Immediate value stored in a [`TapeOp`]
type Imm = OrderedFloat<f64>;

/// A single instruction in a [`Tape`]
///
/// Each instruction writes to its own slot (its index in the tape); operands
/// name earlier slots.  Constants are folded into the instructions that use
/// them as immediates.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum TapeOp {
    /// Reads an interval from the input box
    Input(u32),
    /// Copies an immediate into a slot
    CopyImm(Imm),
    /// Applies a unary operation to a slot
    Unary(UnaryOpcode, u32),
    /// Raises a slot to an integer power
    Pow(u32, u32),
    /// Combines two slots
    RegReg(BinaryOpcode, u32, u32),
    /// Combines a slot (left) and an immediate (right)
    RegImm(BinaryOpcode, u32, Imm),
    /// Combines an immediate (left) and a slot (right)
    ImmReg(BinaryOpcode, Imm, u32),
}

/// Where a tree node's value lives during tape construction
#[derive(Copy, Clone, Debug)]
enum Location {
    Slot(u32),
    Immediate(f64),
}

struct Builder {
    ops: Vec<TapeOp>,
    dedup: HashMap<TapeOp, u32>,
    seen: HashMap<*const TreeOp, Location>,
    arity: usize,
}

impl Builder {
    fn new(arity: usize) -> Self {
        Self {
            ops: vec![],
            dedup: HashMap::new(),
            seen: HashMap::new(),
            arity,
        }
    }

    /// Finds or inserts the given operation, returning its slot
    fn push(&mut self, op: TapeOp) -> u32 {
        let ops = &mut self.ops;
        *self.dedup.entry(op).or_insert_with(|| {
            ops.push(op);
            (ops.len() - 1) as u32
        })
    }

    /// Returns the location of an already-visited node
    fn location(&self, t: &Tree) -> Location {
        self.seen[&t.as_ptr()]
    }

    /// Forces a location into a slot
    fn slot(&mut self, loc: Location) -> u32 {
        match loc {
            Location::Slot(s) => s,
            Location::Immediate(v) => self.push(TapeOp::CopyImm(v.into())),
        }
    }

    /// Compiles the tree, returning the slot of the root
    ///
    /// Nodes are visited in post-order with an explicit stack, so deep trees
    /// don't exhaust the call stack.  Shared subtrees are visited once.
    fn build(&mut self, root: &Tree) -> Result<u32, Error> {
        let mut todo = vec![(root, false)];
        while let Some((t, ready)) = todo.pop() {
            if self.seen.contains_key(&t.as_ptr()) {
                continue;
            }
            if ready {
                let loc = self.step(t)?;
                self.seen.insert(t.as_ptr(), loc);
            } else {
                todo.push((t, true));
                let children: Vec<_> = t.children().collect();
                todo.extend(children.into_iter().rev().map(|c| (c, false)));
            }
        }
        let loc = self.location(root);
        Ok(self.slot(loc))
    }

    /// Compiles a single node whose children have already been compiled
    fn step(&mut self, t: &Tree) -> Result<Location, Error> {
        let out = match &**t {
            TreeOp::Input(i) => {
                if *i >= self.arity {
                    return Err(Error::BadInput {
                        index: *i,
                        arity: self.arity,
                    });
                }
                Location::Slot(self.push(TapeOp::Input(*i as u32)))
            }
            TreeOp::Const(c) => {
                if !c.is_finite() {
                    return Err(Error::InvalidInterval(*c, *c));
                }
                Location::Immediate(*c)
            }
            TreeOp::Unary(op, a) => {
                let a = self.location(a);
                let a = self.slot(a);
                Location::Slot(self.push(TapeOp::Unary(*op, a)))
            }
            TreeOp::Pow(a, n) => {
                let a = self.location(a);
                let a = self.slot(a);
                Location::Slot(self.push(TapeOp::Pow(a, *n)))
            }
            TreeOp::Binary(op, a, b) => {
                let op = *op;
                let a = self.location(a);
                let b = self.location(b);
                let t = match (a, b) {
                    (Location::Slot(a), Location::Slot(b)) => {
                        if op.is_commutative() {
                            TapeOp::RegReg(op, a.min(b), a.max(b))
                        } else {
                            TapeOp::RegReg(op, a, b)
                        }
                    }
                    (Location::Slot(a), Location::Immediate(b)) => {
                        TapeOp::RegImm(op, a, b.into())
                    }
                    (Location::Immediate(a), Location::Slot(b)) => {
                        if op.is_commutative() {
                            TapeOp::RegImm(op, b, a.into())
                        } else {
                            TapeOp::ImmReg(op, a.into(), b)
                        }
                    }
                    (Location::Immediate(a), Location::Immediate(b)) => {
                        let a = self.slot(Location::Immediate(a));
                        TapeOp::RegImm(op, a, b.into())
                    }
                };
                Location::Slot(self.push(t))
            }
        };
        Ok(out)
    }
}

/// A compiled expression, ready for repeated interval evaluation
///
/// Evaluation walks the tape once, front to back; every slot is computed from
/// earlier slots, so this is a single bottom-up pass over the expression.
///
/// ```
/// use ibox::{
///     context::Tree,
///     eval::{BoxFunction, Tape},
///     types::{Interval, IntervalBox},
/// };
///
/// let [x, y] = Tree::inputs();
/// let tape = Tape::new(&(x.square() + y), 2)?;
/// let b = IntervalBox::from_bounds(&[[-1.0, 2.0], [0.0, 1.0]])?;
/// assert_eq!(tape.eval_box(&b)?, Interval::new(0.0, 5.0)?);
/// # Ok::<(), ibox::Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct Tape {
    ops: Vec<TapeOp>,
    root: u32,
    arity: usize,
    division: DivisionPolicy,
}

impl Tape {
    /// Compiles a tree into a tape which reads `arity` inputs
    ///
    /// Returns [`Error::BadInput`] if the tree reads an input at or beyond
    /// `arity`, or [`Error::InvalidInterval`] if it contains a non-finite
    /// constant.
    pub fn new(tree: &Tree, arity: usize) -> Result<Self, Error> {
        let mut builder = Builder::new(arity);
        let root = builder.build(tree)?;
        let tape = Self {
            ops: builder.ops,
            root,
            arity,
            division: DivisionPolicy::default(),
        };
        log::debug!(
            "compiled tape with {} ops (arity {})",
            tape.len(),
            tape.arity
        );
        log::trace!("{tape}");
        Ok(tape)
    }

    /// Sets the policy for division by intervals containing zero
    pub fn with_division(mut self, division: DivisionPolicy) -> Self {
        self.division = division;
        self
    }

    /// Returns the division policy for this tape
    pub fn division(&self) -> DivisionPolicy {
        self.division
    }

    /// Returns the number of instructions in the tape
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Checks whether the tape is empty (which is never the case for a
    /// successfully compiled tape)
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Iterates over instructions in evaluation order
    pub fn iter(&self) -> impl Iterator<Item = &TapeOp> {
        self.ops.iter()
    }

    /// Evaluates the tape with the division policy from `cfg`, overriding
    /// the tape's own policy
    pub fn eval_with(
        &self,
        x: &[Interval],
        cfg: &EvalConfig,
    ) -> Result<Interval, Error> {
        check_dimension(x, self.arity)?;
        self.eval_ops(x, cfg.division)
    }

    fn eval_ops(
        &self,
        x: &[Interval],
        division: DivisionPolicy,
    ) -> Result<Interval, Error> {
        let mut slots: Vec<Interval> = Vec::with_capacity(self.ops.len());
        for op in &self.ops {
            let v = match *op {
                TapeOp::Input(i) => {
                    *x.get(i as usize).ok_or(Error::DimensionMismatch {
                        expected: self.arity,
                        actual: x.len(),
                    })?
                }
                TapeOp::CopyImm(c) => Interval::point(c.0)?,
                TapeOp::Unary(op, a) => unary(op, slots[a as usize], division)?,
                TapeOp::Pow(a, n) => slots[a as usize].powi(n),
                TapeOp::RegReg(op, a, b) => {
                    binary(op, slots[a as usize], slots[b as usize], division)?
                }
                TapeOp::RegImm(BinaryOpcode::Mul, a, k) => {
                    slots[a as usize].scalar_mul(k.0)
                }
                TapeOp::RegImm(op, a, k) => {
                    let k = Interval::point(k.0)?;
                    binary(op, slots[a as usize], k, division)?
                }
                TapeOp::ImmReg(op, k, b) => {
                    let k = Interval::point(k.0)?;
                    binary(op, k, slots[b as usize], division)?
                }
            };
            slots.push(v);
        }
        Ok(slots[self.root as usize])
    }
}

fn unary(
    op: UnaryOpcode,
    a: Interval,
    division: DivisionPolicy,
) -> Result<Interval, Error> {
    let out = match op {
        UnaryOpcode::Neg => -a,
        UnaryOpcode::Abs => a.abs(),
        UnaryOpcode::Recip => Interval::ONE.div_with(a, division)?,
        UnaryOpcode::Sqrt => a.sqrt()?,
        UnaryOpcode::Square => a.square(),
        UnaryOpcode::Exp => a.exp(),
        UnaryOpcode::Ln => a.ln()?,
        UnaryOpcode::Sin => a.sin(),
        UnaryOpcode::Cos => a.cos(),
    };
    Ok(out)
}

fn binary(
    op: BinaryOpcode,
    a: Interval,
    b: Interval,
    division: DivisionPolicy,
) -> Result<Interval, Error> {
    let out = match op {
        BinaryOpcode::Add => a + b,
        BinaryOpcode::Sub => a - b,
        BinaryOpcode::Mul => a * b,
        BinaryOpcode::Div => a.div_with(b, division)?,
        BinaryOpcode::Min => a.min(b),
        BinaryOpcode::Max => a.max(b),
    };
    Ok(out)
}

impl BoxFunction for Tape {
    fn arity(&self) -> usize {
        self.arity
    }

    fn eval_unchecked(&self, x: &[Interval]) -> Result<Interval, Error> {
        self.eval_ops(x, self.division)
    }
}

impl std::fmt::Display for Tape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, op) in self.ops.iter().enumerate() {
            write!(f, "${i} = ")?;
            match op {
                TapeOp::Input(j) => write!(f, "input {j}")?,
                TapeOp::CopyImm(c) => write!(f, "const {c}")?,
                TapeOp::Unary(op, a) => write!(f, "{op} ${a}")?,
                TapeOp::Pow(a, n) => write!(f, "pow ${a} {n}")?,
                TapeOp::RegReg(op, a, b) => write!(f, "{op} ${a} ${b}")?,
                TapeOp::RegImm(op, a, k) => write!(f, "{op} ${a} {k}")?,
                TapeOp::ImmReg(op, k, b) => write!(f, "{op} {k} ${b}")?,
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::IntervalBox;
    use strum::IntoEnumIterator;

    fn iv(lower: f64, upper: f64) -> Interval {
        Interval::new(lower, upper).unwrap()
    }

    #[test]
    fn test_dedup() {
        let [x, y] = Tree::inputs();
        let a = x.clone() * 3.0;
        let b = x.clone() * 3.0;
        let t = Tape::new(&(a + b), 2).unwrap();
        // input, mul-imm, add
        assert_eq!(t.len(), 3);

        // Commutative operands are sorted
        let t = Tape::new(&((x.clone() + y.clone()) * (y + x)), 2).unwrap();
        assert_eq!(t.len(), 4);
    }

    #[test]
    fn test_shared_subtree() {
        let x = Tree::input(0);
        let mut s = x.clone();
        for _ in 0..1000 {
            s = s.clone() + s;
        }
        // Without sharing, this tree would have 2^1000 leaves
        let t = Tape::new(&s, 1).unwrap();
        assert_eq!(t.len(), 1001);
    }

    #[test]
    fn test_deep_tree() {
        let x = Tree::input(0);
        let mut s = x.clone();
        let mut sum = 0.0;
        for i in 0..100_000 {
            s = s + (i % 7) as f64;
            sum += (i % 7) as f64;
        }
        let t = Tape::new(&s, 1).unwrap();
        let v = t.eval_slice(&[iv(0.0, 1.0)]).unwrap();
        assert_eq!(v, iv(sum, sum + 1.0));
    }

    #[test]
    fn test_constants() {
        let t = Tape::new(&Tree::constant(2.5), 0).unwrap();
        assert_eq!(t.len(), 1);
        assert_eq!(t.eval_slice(&[]), Ok(iv(2.5, 2.5)));

        let c = Tree::constant(2.0) * 3.0;
        let t = Tape::new(&c, 0).unwrap();
        assert_eq!(t.eval_slice(&[]), Ok(iv(6.0, 6.0)));

        let bad = Tree::input(0) + f64::NAN;
        assert!(matches!(
            Tape::new(&bad, 1),
            Err(Error::InvalidInterval(..))
        ));
        let bad = Tree::input(0) * f64::INFINITY;
        assert!(Tape::new(&bad, 1).is_err());
    }

    #[test]
    fn test_bad_input() {
        let [x, y, z] = Tree::inputs();
        let t = Tape::new(&(x + y + z), 2);
        assert_eq!(t.err(), Some(Error::BadInput { index: 2, arity: 2 }));
    }

    #[test]
    fn test_imm_reg() {
        let x = Tree::input(0);
        let t = Tape::new(&(1.0 - x.clone()), 1).unwrap();
        assert!(matches!(t.iter().last(), Some(TapeOp::ImmReg(..))));
        assert_eq!(t.eval_slice(&[iv(0.0, 0.25)]), Ok(iv(0.75, 1.0)));

        let t = Tape::new(&(2.0 * x.clone()), 1).unwrap();
        assert!(matches!(t.iter().last(), Some(TapeOp::RegImm(..))));
        assert_eq!(t.eval_slice(&[iv(-1.0, 0.5)]), Ok(iv(-2.0, 1.0)));

        let t = Tape::new(&(4.0 / x), 1).unwrap();
        assert_eq!(t.eval_slice(&[iv(1.0, 2.0)]), Ok(iv(2.0, 4.0)));
        assert_eq!(
            t.eval_slice(&[iv(-1.0, 2.0)]),
            Err(Error::DivisionByZeroInterval)
        );
    }

    #[test]
    fn test_division_policy() {
        let [x, y] = Tree::inputs();
        let t = Tape::new(&(x / y.clone()), 2).unwrap();
        let b = IntervalBox::new(vec![iv(1.0, 2.0), iv(-1.0, 1.0)]);
        assert_eq!(t.eval_box(&b), Err(Error::DivisionByZeroInterval));

        let t = t.with_division(DivisionPolicy::Entire);
        assert_eq!(t.eval_box(&b), Ok(Interval::ENTIRE));

        let t = Tape::new(&y.recip(), 2)
            .unwrap()
            .with_division(DivisionPolicy::Entire);
        assert_eq!(t.eval_box(&b), Ok(Interval::ENTIRE));
    }

    #[test]
    fn test_unary_ops() {
        let x = Tree::input(0);
        let a = iv(0.25, 4.0);
        for op in UnaryOpcode::iter() {
            let tree = match op {
                UnaryOpcode::Neg => x.neg(),
                UnaryOpcode::Abs => x.abs(),
                UnaryOpcode::Recip => x.recip(),
                UnaryOpcode::Sqrt => x.sqrt(),
                UnaryOpcode::Square => x.square(),
                UnaryOpcode::Exp => x.exp(),
                UnaryOpcode::Ln => x.ln(),
                UnaryOpcode::Sin => x.sin(),
                UnaryOpcode::Cos => x.cos(),
            };
            let t = Tape::new(&tree, 1).unwrap();
            let v = t.eval_slice(&[a]).unwrap();
            let direct = unary(op, a, t.division()).unwrap();
            assert_eq!(v, direct, "mismatch for {op}");
        }
    }

    #[test]
    fn test_binary_ops() {
        let [x, y] = Tree::inputs();
        let b = [iv(1.0, 2.0), iv(3.0, 5.0)];
        let cases = [
            (x.clone() + y.clone(), iv(4.0, 7.0)),
            (x.clone() - y.clone(), iv(-4.0, -1.0)),
            (x.clone() * y.clone(), iv(3.0, 10.0)),
            (x.clone() / iv_tree(4.0), iv(0.25, 0.5)),
            (x.min(y.clone()), iv(1.0, 2.0)),
            (x.max(y.clone()), iv(3.0, 5.0)),
            (x.pow(3), iv(1.0, 8.0)),
            (-y, iv(-5.0, -3.0)),
        ];
        for (tree, expected) in cases {
            let t = Tape::new(&tree, 2).unwrap();
            assert_eq!(t.eval_slice(&b), Ok(expected));
        }
    }

    fn iv_tree(v: f64) -> Tree {
        Tree::constant(v)
    }

    #[test]
    fn test_display() {
        let x = Tree::input(0);
        let t = Tape::new(&(x.square() * 3.0 - 1.5), 1).unwrap();
        assert_eq!(
            t.to_string(),
            "$0 = input 0\n$1 = square $0\n$2 = mul $1 3\n$3 = sub $2 1.5\n"
        );
    }
}

//! Context-free math trees
use super::op::{BinaryOpcode, UnaryOpcode};
use std::sync::Arc;

/// Opcode type for trees
#[derive(Debug)]
#[allow(missing_docs)]
pub enum TreeOp {
    /// Reads the interval at the given position of the input box
    Input(usize),
    Const(f64),
    Binary(BinaryOpcode, Tree, Tree),
    Unary(UnaryOpcode, Tree),
    /// Raises the child to a non-negative integer power
    Pow(Tree, u32),
}

impl Drop for TreeOp {
    fn drop(&mut self) {
        // Leaf children don't recurse, so the default drop is fine
        if self
            .iter_children()
            .all(|c| matches!(c, TreeOp::Const(..) | TreeOp::Input(..)))
        {
            return;
        }

        let mut todo = vec![std::mem::replace(self, TreeOp::Const(0.0))];
        let empty = Arc::new(TreeOp::Const(0.0));
        while let Some(mut t) = todo.pop() {
            for c in t.iter_children_mut() {
                let arg = std::mem::replace(&mut c.0, empty.clone());
                todo.extend(Arc::into_inner(arg));
            }
            drop(t);
        }
    }
}

impl TreeOp {
    fn iter_children(&self) -> impl Iterator<Item = &TreeOp> {
        let out = match self {
            TreeOp::Binary(_, a, b) => [Some(a), Some(b)],
            TreeOp::Unary(_, a) | TreeOp::Pow(a, _) => [Some(a), None],
            TreeOp::Input(..) | TreeOp::Const(..) => [None, None],
        };
        out.into_iter().flatten().map(|t| &**t)
    }

    fn iter_children_mut(&mut self) -> impl Iterator<Item = &mut Tree> {
        let out = match self {
            TreeOp::Binary(_, a, b) => [Some(a), Some(b)],
            TreeOp::Unary(_, a) | TreeOp::Pow(a, _) => [Some(a), None],
            TreeOp::Input(..) | TreeOp::Const(..) => [None, None],
        };
        out.into_iter().flatten()
    }
}

impl From<f64> for Tree {
    fn from(v: f64) -> Tree {
        Tree::constant(v)
    }
}

impl From<f32> for Tree {
    fn from(v: f32) -> Tree {
        Tree::constant(v as f64)
    }
}

/// Owned handle for a standalone math tree
///
/// Trees are immutable and cheap to clone; shared subtrees are stored once
/// and compiled once by [`Tape::new`](crate::eval::Tape::new).
///
/// ```
/// # use ibox::context::Tree;
/// let x = Tree::input(0);
/// let y = Tree::input(1);
/// let f = x.clone() * (1.0 - x) * (1.0 - y);
/// ```
#[derive(Clone, Debug)]
pub struct Tree(Arc<TreeOp>);

impl std::ops::Deref for Tree {
    type Target = TreeOp;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl PartialEq for Tree {
    /// Shallow (pointer) comparison
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.as_ptr(), other.as_ptr())
    }
}
impl Eq for Tree {}

/// See [`Interval`](crate::types::Interval) for the semantics of each
/// operation
#[allow(missing_docs)]
impl Tree {
    /// Returns a tree reading dimension `i` of the input box
    pub fn input(i: usize) -> Self {
        Tree(Arc::new(TreeOp::Input(i)))
    }
    /// Returns the first `N` inputs, e.g. `let [x, y] = Tree::inputs();`
    pub fn inputs<const N: usize>() -> [Self; N] {
        std::array::from_fn(Self::input)
    }
    pub fn constant(f: f64) -> Self {
        Tree(Arc::new(TreeOp::Const(f)))
    }
    fn op_unary(a: Tree, op: UnaryOpcode) -> Self {
        Tree(Arc::new(TreeOp::Unary(op, a)))
    }
    fn op_binary(a: Tree, b: Tree, op: BinaryOpcode) -> Self {
        Tree(Arc::new(TreeOp::Binary(op, a, b)))
    }
    pub fn pow(&self, n: u32) -> Self {
        Tree(Arc::new(TreeOp::Pow(self.clone(), n)))
    }
    pub fn square(&self) -> Self {
        Self::op_unary(self.clone(), UnaryOpcode::Square)
    }
    pub fn sqrt(&self) -> Self {
        Self::op_unary(self.clone(), UnaryOpcode::Sqrt)
    }
    pub fn abs(&self) -> Self {
        Self::op_unary(self.clone(), UnaryOpcode::Abs)
    }
    pub fn recip(&self) -> Self {
        Self::op_unary(self.clone(), UnaryOpcode::Recip)
    }
    pub fn max<T: Into<Tree>>(&self, other: T) -> Self {
        Self::op_binary(self.clone(), other.into(), BinaryOpcode::Max)
    }
    pub fn min<T: Into<Tree>>(&self, other: T) -> Self {
        Self::op_binary(self.clone(), other.into(), BinaryOpcode::Min)
    }
    pub fn neg(&self) -> Self {
        Self::op_unary(self.clone(), UnaryOpcode::Neg)
    }
    pub fn sin(&self) -> Self {
        Self::op_unary(self.clone(), UnaryOpcode::Sin)
    }
    pub fn cos(&self) -> Self {
        Self::op_unary(self.clone(), UnaryOpcode::Cos)
    }
    pub fn exp(&self) -> Self {
        Self::op_unary(self.clone(), UnaryOpcode::Exp)
    }
    pub fn ln(&self) -> Self {
        Self::op_unary(self.clone(), UnaryOpcode::Ln)
    }

    /// Returns a pointer to the inner [`TreeOp`]
    ///
    /// This can be used as a strong (but not unique) identity.
    pub fn as_ptr(&self) -> *const TreeOp {
        Arc::as_ptr(&self.0)
    }

    /// Returns the children of this node, in operand order
    pub(crate) fn children(&self) -> impl Iterator<Item = &Tree> {
        let out = match &*self.0 {
            TreeOp::Binary(_, a, b) => [Some(a), Some(b)],
            TreeOp::Unary(_, a) | TreeOp::Pow(a, _) => [Some(a), None],
            TreeOp::Input(..) | TreeOp::Const(..) => [None, None],
        };
        out.into_iter().flatten()
    }
}

impl std::ops::Neg for Tree {
    type Output = Tree;
    fn neg(self) -> Tree {
        Tree::op_unary(self, UnaryOpcode::Neg)
    }
}

macro_rules! impl_binary {
    ($op:ident, $op_assign:ident, $base_fn:ident, $assign_fn:ident) => {
        impl<A: Into<Tree>> std::ops::$op<A> for Tree {
            type Output = Self;

            fn $base_fn(self, other: A) -> Self {
                Self::op_binary(self, other.into(), BinaryOpcode::$op)
            }
        }
        impl<A: Into<Tree>> std::ops::$op_assign<A> for Tree {
            fn $assign_fn(&mut self, other: A) {
                use std::ops::$op;
                self.0 = self.clone().$base_fn(other.into()).0
            }
        }
        impl std::ops::$op<Tree> for f32 {
            type Output = Tree;
            fn $base_fn(self, other: Tree) -> Tree {
                Tree::op_binary(self.into(), other, BinaryOpcode::$op)
            }
        }
        impl std::ops::$op<Tree> for f64 {
            type Output = Tree;
            fn $base_fn(self, other: Tree) -> Tree {
                Tree::op_binary(self.into(), other, BinaryOpcode::$op)
            }
        }
    };
}

impl_binary!(Add, AddAssign, add, add_assign);
impl_binary!(Sub, SubAssign, sub, sub_assign);
impl_binary!(Mul, MulAssign, mul, mul_assign);
impl_binary!(Div, DivAssign, div, div_assign);

//! Infrastructure for representing math expressions as trees
mod op;
mod tree;

pub use op::{BinaryOpcode, UnaryOpcode};
pub use tree::{Tree, TreeOp};

use crate::{
    Error,
    context::Tree,
    eval::{BoxFunction, Tape},
    types::{DivisionPolicy, Interval, IntervalBox},
};
use rayon::prelude::*;

/// Thread pool to use for batch evaluation
pub enum ThreadPool {
    /// User-provided pool
    Custom(rayon::ThreadPool),
    /// Global Rayon pool
    Global,
}

impl ThreadPool {
    /// Runs a function across the thread pool
    pub fn run<F: FnOnce() -> V + Send, V: Send>(&self, f: F) -> V {
        match self {
            ThreadPool::Custom(p) => p.install(f),
            ThreadPool::Global => f(),
        }
    }

    /// Returns the number of threads in the pool
    pub fn thread_count(&self) -> usize {
        match self {
            ThreadPool::Custom(p) => p.current_num_threads(),
            ThreadPool::Global => rayon::current_num_threads(),
        }
    }
}

/// Settings for evaluation
///
/// ```
/// use ibox::{
///     context::Tree,
///     eval::EvalConfig,
///     types::{DivisionPolicy, Interval, IntervalBox},
/// };
///
/// let [x, y] = Tree::inputs();
/// let cfg = EvalConfig {
///     division: DivisionPolicy::Entire,
///     ..Default::default()
/// };
/// let b = IntervalBox::from_bounds(&[[1.0, 2.0], [-1.0, 1.0]])?;
/// assert_eq!(cfg.evaluate(&(x / y), &b)?, Interval::ENTIRE);
/// # Ok::<(), ibox::Error>(())
/// ```
pub struct EvalConfig {
    /// Behavior when dividing by an interval which contains zero
    pub division: DivisionPolicy,

    /// Thread pool for batch evaluation
    ///
    /// If this is `None`, then batches are evaluated on the calling thread.
    pub threads: Option<ThreadPool>,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            division: DivisionPolicy::default(),
            threads: Some(ThreadPool::Global),
        }
    }
}

impl EvalConfig {
    /// Compiles a tree into a tape which uses this config's division policy
    pub fn tape(&self, tree: &Tree, arity: usize) -> Result<Tape, Error> {
        Ok(Tape::new(tree, arity)?.with_division(self.division))
    }

    /// Compiles and evaluates a tree on a single box
    ///
    /// The tree is compiled with an arity equal to the box's dimension, so it
    /// may read any subset of the box's intervals.
    ///
    /// Because the box sets the arity, a tree which reads past the end of the
    /// box fails with [`Error::BadInput`] (naming the offending input) rather
    /// than [`Error::DimensionMismatch`].  The latter is returned when a box
    /// is passed to a [`BoxFunction`] with a fixed arity, e.g. a [`Tape`].
    pub fn evaluate(
        &self,
        tree: &Tree,
        b: &IntervalBox,
    ) -> Result<Interval, Error> {
        self.tape(tree, b.len())?.eval_with(b, self)
    }

    /// Evaluates a function on many boxes, returning one result per box
    ///
    /// Results are in input order and do not depend on the thread count.  The
    /// function's own division policy applies; use [`EvalConfig::tape`] to
    /// build a tape which honors this config.
    pub fn eval_boxes<F: BoxFunction + ?Sized>(
        &self,
        f: &F,
        boxes: &[IntervalBox],
    ) -> Vec<Result<Interval, Error>> {
        match &self.threads {
            Some(pool) => {
                log::trace!(
                    "evaluating {} boxes on {} threads",
                    boxes.len(),
                    pool.thread_count()
                );
                pool.run(|| boxes.par_iter().map(|b| f.eval_box(b)).collect())
            }
            None => {
                log::trace!("evaluating {} boxes", boxes.len());
                boxes.iter().map(|b| f.eval_box(b)).collect()
            }
        }
    }
}

use crate::{
    Error,
    types::{Interval, IntervalBox, check_dimension},
};

/// A function which can be evaluated on an [`IntervalBox`]
///
/// Implementors only provide [`arity`](BoxFunction::arity) and
/// [`eval_unchecked`](BoxFunction::eval_unchecked); the calling conventions
/// check the input dimension and then delegate to that single core, so every
/// form returns bit-identical results for the same input.
pub trait BoxFunction: Send + Sync {
    /// Number of dimensions expected in the input box
    fn arity(&self) -> usize;

    /// Evaluates the function without checking the input dimension
    ///
    /// Callers should prefer [`eval_box`](BoxFunction::eval_box) or
    /// [`eval_slice`](BoxFunction::eval_slice).
    fn eval_unchecked(&self, x: &[Interval]) -> Result<Interval, Error>;

    /// Evaluates the function on a slice of intervals
    ///
    /// Returns [`Error::DimensionMismatch`] if the slice length doesn't match
    /// the function's arity.
    fn eval_slice(&self, x: &[Interval]) -> Result<Interval, Error> {
        check_dimension(x, self.arity())?;
        self.eval_unchecked(x)
    }

    /// Evaluates the function on a box
    fn eval_box(&self, x: &IntervalBox) -> Result<Interval, Error> {
        self.eval_slice(x.as_slice())
    }

    /// Evaluates the function on a flat buffer of `len` intervals
    ///
    /// Returns [`Error::NullPointer`] if `ptr` is null and `len` is non-zero.
    ///
    /// # Safety
    /// If `len` is non-zero, `ptr` must point to `len` initialized intervals
    /// which remain valid and unmodified for the duration of the call.
    unsafe fn eval_raw(
        &self,
        ptr: *const Interval,
        len: usize,
    ) -> Result<Interval, Error> {
        if len == 0 {
            return self.eval_slice(&[]);
        }
        if ptr.is_null() {
            return Err(Error::NullPointer(len));
        }
        // SAFETY: upheld by the caller
        let x = unsafe { std::slice::from_raw_parts(ptr, len) };
        self.eval_slice(x)
    }
}

impl<T: BoxFunction + ?Sized> BoxFunction for &T {
    fn arity(&self) -> usize {
        (**self).arity()
    }
    fn eval_unchecked(&self, x: &[Interval]) -> Result<Interval, Error> {
        (**self).eval_unchecked(x)
    }
}

/// Hand-coded [`BoxFunction`] built from a closure
///
/// ```
/// use ibox::{
///     eval::{BoxFunction, FnFunction},
///     types::{Interval, IntervalBox},
/// };
///
/// // f(x, y) = x * (1 - x) * (1 - y)
/// let f = FnFunction::new(2, |v: &[Interval]| {
///     Ok(v[0] * (1.0 - v[0]) * (1.0 - v[1]))
/// });
/// let b = IntervalBox::from_bounds(&[[0.0, 1.0], [0.0, 1.0]])?;
/// assert_eq!(f.eval_box(&b)?, Interval::new(0.0, 1.0)?);
///
/// let short = IntervalBox::from_bounds(&[[0.0, 1.0]])?;
/// assert!(f.eval_box(&short).is_err());
/// # Ok::<(), ibox::Error>(())
/// ```
pub struct FnFunction<F> {
    arity: usize,
    f: F,
}

impl<F> FnFunction<F>
where
    F: Fn(&[Interval]) -> Result<Interval, Error> + Send + Sync,
{
    /// Wraps a closure which reads exactly `arity` intervals
    pub fn new(arity: usize, f: F) -> Self {
        Self { arity, f }
    }
}

impl<F> BoxFunction for FnFunction<F>
where
    F: Fn(&[Interval]) -> Result<Interval, Error> + Send + Sync,
{
    fn arity(&self) -> usize {
        self.arity
    }
    fn eval_unchecked(&self, x: &[Interval]) -> Result<Interval, Error> {
        (self.f)(x)
    }
}

use super::round;
use crate::Error;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2 as PI_2, PI, TAU};

/// A closed range `[lower, upper]` of real values
///
/// Every operation rounds its bounds outward, so the result always contains
/// the exact real result of the operation applied to any values drawn from
/// the operands.  Results may be wider than the exact range, but never
/// narrower.
///
/// Bounds are never NaN, `lower <= upper` always holds, and the bounds may be
/// infinite (though `lower` is never `+inf` and `upper` is never `-inf`).
#[derive(Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 2]", into = "[f64; 2]")]
#[repr(C)]
pub struct Interval {
    lower: f64,
    upper: f64,
}

static_assertions::assert_eq_size!(Interval, [f64; 2]);

impl std::fmt::Debug for Interval {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> Result<(), std::fmt::Error> {
        f.debug_tuple("")
            .field(&self.lower)
            .field(&self.upper)
            .finish()
    }
}

/// Controls what happens when dividing by an interval that contains zero
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DivisionPolicy {
    /// Return [`Error::DivisionByZeroInterval`]
    #[default]
    Error,
    /// Return the entire real line, `[-inf, +inf]`
    Entire,
}

impl Interval {
    /// The entire real line
    pub const ENTIRE: Self = Self {
        lower: f64::NEG_INFINITY,
        upper: f64::INFINITY,
    };

    /// The point interval `[0, 0]`
    pub const ZERO: Self = Self {
        lower: 0.0,
        upper: 0.0,
    };

    /// The point interval `[1, 1]`
    pub const ONE: Self = Self {
        lower: 1.0,
        upper: 1.0,
    };

    /// Builds a new interval
    ///
    /// Returns [`Error::InvalidInterval`] if `lower > upper`, if either bound
    /// is NaN, or if the interval would sit entirely at an infinity.
    ///
    /// ```
    /// # use ibox::types::Interval;
    /// assert!(Interval::new(0.0, 1.0).is_ok());
    /// assert!(Interval::new(1.0, 0.0).is_err());
    /// assert!(Interval::new(f64::NAN, 0.0).is_err());
    /// ```
    pub fn new(lower: f64, upper: f64) -> Result<Self, Error> {
        if lower <= upper
            && lower != f64::INFINITY
            && upper != f64::NEG_INFINITY
        {
            Ok(Self { lower, upper })
        } else {
            Err(Error::InvalidInterval(lower, upper))
        }
    }

    /// Builds a degenerate interval `[v, v]`
    pub fn point(v: f64) -> Result<Self, Error> {
        Self::new(v, v)
    }

    /// Builds an interval from bounds which are known to be valid
    #[inline]
    fn from_bounds(lower: f64, upper: f64) -> Self {
        debug_assert!(
            Self::new(lower, upper).is_ok(),
            "invalid interval [{lower}, {upper}]"
        );
        Self { lower, upper }
    }

    /// Converts a finite scalar into a point interval
    ///
    /// # Panics
    /// Panics if the scalar is NaN or infinite
    #[inline]
    fn scalar(k: f64) -> Self {
        assert!(k.is_finite(), "scalar operand must be finite, got {k}");
        Self::from_bounds(k, k)
    }

    /// Returns the lower bound of the interval
    #[inline]
    pub fn lower(&self) -> f64 {
        self.lower
    }

    /// Returns the upper bound of the interval
    #[inline]
    pub fn upper(&self) -> f64 {
        self.upper
    }

    /// Checks whether the given value is contained in the interval
    ///
    /// NaN is never contained.
    #[inline]
    pub fn contains(&self, v: f64) -> bool {
        v >= self.lower && v <= self.upper
    }

    /// Checks whether this interval contains every value of `other`
    pub fn encloses(&self, other: Self) -> bool {
        self.lower <= other.lower && other.upper <= self.upper
    }

    /// Checks whether the interval contains zero
    #[inline]
    pub fn contains_zero(&self) -> bool {
        self.contains(0.0)
    }

    /// Checks whether the interval is a single point
    pub fn is_point(&self) -> bool {
        self.lower == self.upper
    }

    /// Checks whether both bounds are finite
    pub fn is_bounded(&self) -> bool {
        self.lower.is_finite() && self.upper.is_finite()
    }

    /// Calculates the width of the interval, rounded up
    ///
    /// ```
    /// # use ibox::types::Interval;
    /// let a = Interval::new(2.0, 5.0)?;
    /// assert_eq!(a.width(), 3.0);
    /// # Ok::<(), ibox::Error>(())
    /// ```
    pub fn width(self) -> f64 {
        round::sub_up(self.upper, self.lower)
    }

    /// Returns a point inside the interval, close to its center
    ///
    /// Half-unbounded intervals return the finite extreme of `f64` on their
    /// open side, and [`ENTIRE`](Self::ENTIRE) returns zero.
    pub fn midpoint(self) -> f64 {
        match (self.lower.is_finite(), self.upper.is_finite()) {
            (true, true) => {
                let m = self.lower * 0.5 + self.upper * 0.5;
                m.clamp(self.lower, self.upper)
            }
            (false, false) => 0.0,
            (false, true) => f64::MIN.min(self.upper),
            (true, false) => f64::MAX.max(self.lower),
        }
    }

    /// Splits the interval at its midpoint
    ///
    /// ```
    /// # use ibox::types::Interval;
    /// let a = Interval::new(0.0, 1.0)?;
    /// let (lo, hi) = a.split();
    /// assert_eq!(lo, Interval::new(0.0, 0.5)?);
    /// assert_eq!(hi, Interval::new(0.5, 1.0)?);
    /// # Ok::<(), ibox::Error>(())
    /// ```
    pub fn split(self) -> (Self, Self) {
        let mid = self.midpoint();
        (
            Self::from_bounds(self.lower, mid),
            Self::from_bounds(mid, self.upper),
        )
    }

    /// Returns the smallest interval containing both inputs
    pub fn hull(self, rhs: Self) -> Self {
        Self::from_bounds(self.lower.min(rhs.lower), self.upper.max(rhs.upper))
    }

    /// Returns the overlap of two intervals, or `None` if they are disjoint
    pub fn intersection(self, rhs: Self) -> Option<Self> {
        let lower = self.lower.max(rhs.lower);
        let upper = self.upper.min(rhs.upper);
        (lower <= upper).then(|| Self::from_bounds(lower, upper))
    }

    /// Multiplies the interval by a constant scalar
    ///
    /// This is equivalent to multiplying by the point interval `[k, k]`, but
    /// only needs two products.
    ///
    /// # Panics
    /// Panics if `k` is NaN or infinite
    pub fn scalar_mul(self, k: f64) -> Self {
        assert!(k.is_finite(), "scalar operand must be finite, got {k}");
        if k > 0.0 {
            Self::from_bounds(
                round::mul_down(self.lower, k),
                round::mul_up(self.upper, k),
            )
        } else if k < 0.0 {
            Self::from_bounds(
                round::mul_down(self.upper, k),
                round::mul_up(self.lower, k),
            )
        } else {
            Self::ZERO
        }
    }

    /// Raises the interval to a non-negative integer power
    ///
    /// Even powers are computed by case analysis rather than by repeated
    /// multiplication, so `x^2` is never negative:
    /// ```
    /// # use ibox::types::Interval;
    /// let a = Interval::new(-1.0, 2.0)?;
    /// assert_eq!(a.powi(2), Interval::new(0.0, 4.0)?);
    /// assert_eq!(a * a, Interval::new(-2.0, 4.0)?);
    /// # Ok::<(), ibox::Error>(())
    /// ```
    pub fn powi(self, n: u32) -> Self {
        if n == 0 {
            Self::ONE
        } else if n % 2 == 1 {
            let lower = if self.lower >= 0.0 {
                round::pow_down(self.lower, n)
            } else {
                -round::pow_up(-self.lower, n)
            };
            let upper = if self.upper >= 0.0 {
                round::pow_up(self.upper, n)
            } else {
                -round::pow_down(-self.upper, n)
            };
            Self::from_bounds(lower, upper)
        } else if self.lower >= 0.0 {
            Self::from_bounds(
                round::pow_down(self.lower, n),
                round::pow_up(self.upper, n),
            )
        } else if self.upper <= 0.0 {
            Self::from_bounds(
                round::pow_down(-self.upper, n),
                round::pow_up(-self.lower, n),
            )
        } else {
            let m = self.upper.max(-self.lower);
            Self::from_bounds(0.0, round::pow_up(m, n))
        }
    }

    /// Squares the interval
    ///
    /// This has tighter bounds than `self * self`, because we know that both
    /// sides of the multiplication are the same value.
    pub fn square(self) -> Self {
        self.powi(2)
    }

    /// Calculates the absolute value of the interval
    pub fn abs(self) -> Self {
        if self.lower >= 0.0 {
            self
        } else if self.upper <= 0.0 {
            -self
        } else {
            Self::from_bounds(0.0, self.upper.max(-self.lower))
        }
    }

    /// Divides two intervals
    ///
    /// Returns [`Error::DivisionByZeroInterval`] if `rhs` contains zero.
    pub fn checked_div(self, rhs: Self) -> Result<Self, Error> {
        if rhs.contains_zero() {
            return Err(Error::DivisionByZeroInterval);
        }
        let corners = [
            (self.lower, rhs.lower),
            (self.lower, rhs.upper),
            (self.upper, rhs.lower),
            (self.upper, rhs.upper),
        ];
        let mut lower = f64::INFINITY;
        let mut upper = f64::NEG_INFINITY;
        for (a, b) in corners {
            lower = lower.min(round::div_down(a, b));
            upper = upper.max(round::div_up(a, b));
        }
        Ok(Self::from_bounds(lower, upper))
    }

    /// Divides two intervals, applying the given policy if `rhs` contains
    /// zero
    pub fn div_with(
        self,
        rhs: Self,
        policy: DivisionPolicy,
    ) -> Result<Self, Error> {
        match (self.checked_div(rhs), policy) {
            (Err(Error::DivisionByZeroInterval), DivisionPolicy::Entire) => {
                log::debug!("widening {self} / {rhs} to the entire real line");
                Ok(Self::ENTIRE)
            }
            (out, _) => out,
        }
    }

    /// Calculates the reciprocal of the interval
    ///
    /// Returns [`Error::DivisionByZeroInterval`] if the interval contains
    /// zero.
    pub fn recip(self) -> Result<Self, Error> {
        Self::ONE.checked_div(self)
    }

    /// Calculates the square root of the interval
    ///
    /// The negative part of the input is ignored; if the interval is entirely
    /// negative, returns [`Error::Domain`].
    pub fn sqrt(self) -> Result<Self, Error> {
        if self.upper < 0.0 {
            Err(Error::Domain("sqrt"))
        } else {
            Ok(Self::from_bounds(
                round::sqrt_down(self.lower.max(0.0)),
                round::sqrt_up(self.upper),
            ))
        }
    }

    /// Computes the exponent function applied to the interval
    pub fn exp(self) -> Self {
        Self::from_bounds(
            round::exp_down(self.lower),
            round::exp_up(self.upper),
        )
    }

    /// Computes the natural log of the input interval
    ///
    /// Values at or below zero are ignored (giving a lower bound of `-inf`
    /// if the input reaches zero); if the interval has no positive values,
    /// returns [`Error::Domain`].
    pub fn ln(self) -> Result<Self, Error> {
        if self.upper <= 0.0 {
            Err(Error::Domain("ln"))
        } else {
            Ok(Self::from_bounds(
                round::ln_down(self.lower.max(0.0)),
                round::ln_up(self.upper),
            ))
        }
    }

    /// Computes the sine of the interval
    pub fn sin(self) -> Self {
        self.periodic(round::sin_down, round::sin_up, PI_2, -PI_2)
    }

    /// Computes the cosine of the interval
    pub fn cos(self) -> Self {
        self.periodic(round::cos_down, round::cos_up, 0.0, PI)
    }

    /// Shared implementation for `sin` and `cos`
    ///
    /// `peak` and `trough` are the phases at which the function reaches `1`
    /// and `-1` respectively.
    fn periodic(
        self,
        down: fn(f64) -> f64,
        up: fn(f64) -> f64,
        peak: f64,
        trough: f64,
    ) -> Self {
        // Beyond this magnitude, the spacing of `f64` values makes the phase
        // search meaningless
        const MAX_PHASE: f64 = 1e8;
        let full = Self::from_bounds(-1.0, 1.0);
        if !self.is_bounded()
            || self.lower.abs().max(self.upper.abs()) > MAX_PHASE
            || self.width() >= TAU
        {
            return full;
        }
        let mut lower = down(self.lower).min(down(self.upper));
        let mut upper = up(self.lower).max(up(self.upper));
        if hits_phase(self, peak) {
            upper = 1.0;
        }
        if hits_phase(self, trough) {
            lower = -1.0;
        }
        Self::from_bounds(lower, upper)
    }

    /// Calculates the minimum of two intervals
    pub fn min(self, rhs: Self) -> Self {
        Self::from_bounds(self.lower.min(rhs.lower), self.upper.min(rhs.upper))
    }

    /// Calculates the maximum of two intervals
    pub fn max(self, rhs: Self) -> Self {
        Self::from_bounds(self.lower.max(rhs.lower), self.upper.max(rhs.upper))
    }

    /// Checks that the two values are roughly equal, panicking otherwise
    #[cfg(test)]
    pub(crate) fn compare_eq(&self, other: Self) {
        let d = (self.lower - other.lower)
            .abs()
            .max((self.upper - other.upper).abs());
        if d >= 1e-12 {
            panic!("lhs != rhs ({self:?} != {other:?})");
        }
    }
}

/// Checks whether `phase + 2πk` falls inside the interval for some integer
/// `k`
///
/// The test is widened slightly, since `π` itself is rounded; a false
/// positive only loosens the result.
fn hits_phase(i: Interval, phase: f64) -> bool {
    const SLACK: f64 = 1e-9;
    let k = ((i.lower - phase) / TAU - SLACK).ceil();
    let x = phase + k * TAU;
    x <= i.upper + SLACK * (1.0 + i.upper.abs())
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.lower, self.upper)
    }
}

impl TryFrom<[f64; 2]> for Interval {
    type Error = Error;
    fn try_from(i: [f64; 2]) -> Result<Self, Error> {
        Interval::new(i[0], i[1])
    }
}

impl From<Interval> for [f64; 2] {
    fn from(i: Interval) -> Self {
        [i.lower, i.upper]
    }
}

impl std::ops::Add<Interval> for Interval {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Interval::from_bounds(
            round::add_down(self.lower, rhs.lower),
            round::add_up(self.upper, rhs.upper),
        )
    }
}

impl std::ops::Sub<Interval> for Interval {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Interval::from_bounds(
            round::sub_down(self.lower, rhs.upper),
            round::sub_up(self.upper, rhs.lower),
        )
    }
}

impl std::ops::Mul<Interval> for Interval {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        let corners = [
            (self.lower, rhs.lower),
            (self.lower, rhs.upper),
            (self.upper, rhs.lower),
            (self.upper, rhs.upper),
        ];
        let mut lower = f64::INFINITY;
        let mut upper = f64::NEG_INFINITY;
        for (a, b) in corners {
            lower = lower.min(round::mul_down(a, b));
            upper = upper.max(round::mul_up(a, b));
        }
        Interval::from_bounds(lower, upper)
    }
}

impl std::ops::Neg for Interval {
    type Output = Self;
    fn neg(self) -> Self {
        Interval::from_bounds(-self.upper, -self.lower)
    }
}

// Scalar operands are treated as exact point intervals.  They panic on NaN or
// infinite scalars, which can only come from a bug in the caller.

impl std::ops::Add<f64> for Interval {
    type Output = Self;
    fn add(self, rhs: f64) -> Self {
        self + Interval::scalar(rhs)
    }
}

impl std::ops::Sub<f64> for Interval {
    type Output = Self;
    fn sub(self, rhs: f64) -> Self {
        self - Interval::scalar(rhs)
    }
}

impl std::ops::Mul<f64> for Interval {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        self.scalar_mul(rhs)
    }
}

impl std::ops::Add<Interval> for f64 {
    type Output = Interval;
    fn add(self, rhs: Interval) -> Interval {
        Interval::scalar(self) + rhs
    }
}

impl std::ops::Sub<Interval> for f64 {
    type Output = Interval;
    fn sub(self, rhs: Interval) -> Interval {
        Interval::scalar(self) - rhs
    }
}

impl std::ops::Mul<Interval> for f64 {
    type Output = Interval;
    fn mul(self, rhs: Interval) -> Interval {
        rhs.scalar_mul(self)
    }
}

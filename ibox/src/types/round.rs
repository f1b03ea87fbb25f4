//! Directed rounding for `f64` operations
//!
//! The FPU rounding mode is not reachable from safe Rust, so every operation
//! is performed in round-to-nearest and then nudged by one ulp when an
//! error-free transformation shows that the rounded value landed on the wrong
//! side of the exact result.  Exact results are never nudged.
//!
//! Callers must not pass NaN.

/// Returns `(s, e)` such that `a + b == s + e` exactly (Knuth's TwoSum)
#[inline]
fn two_sum(a: f64, b: f64) -> (f64, f64) {
    let s = a + b;
    let bb = s - a;
    let e = (a - (s - bb)) + (b - bb);
    (s, e)
}

/// Smallest magnitude at which FMA residuals are exact
///
/// A residual such as `a * b - p` is only representable when its lowest bit
/// lies above the subnormal spacing `2^-1074`.  Products of two 53-bit
/// significands span 106 bits, so results must be at least `2^-966`; below
/// that, the residual may round to zero and hide an inexact result.
const FMA_EXACT_MIN: f64 = f64::MIN_POSITIVE / f64::EPSILON * 16.0;

/// Lower bound for a result that overflowed in round-to-nearest
///
/// A computation on finite operands that rounds to `+inf` has an exact value
/// of at least `f64::MAX`, which is the tightest representable lower bound.
#[inline]
fn clamp_overflow_down(v: f64, finite_args: bool) -> f64 {
    if v == f64::INFINITY && finite_args {
        f64::MAX
    } else {
        v
    }
}

#[inline]
fn clamp_overflow_up(v: f64, finite_args: bool) -> f64 {
    if v == f64::NEG_INFINITY && finite_args {
        f64::MIN
    } else {
        v
    }
}

#[inline]
pub(crate) fn add_down(a: f64, b: f64) -> f64 {
    let (s, e) = two_sum(a, b);
    if s.is_infinite() {
        clamp_overflow_down(s, a.is_finite() && b.is_finite())
    } else if e < 0.0 {
        s.next_down()
    } else {
        s
    }
}

#[inline]
pub(crate) fn add_up(a: f64, b: f64) -> f64 {
    let (s, e) = two_sum(a, b);
    if s.is_infinite() {
        clamp_overflow_up(s, a.is_finite() && b.is_finite())
    } else if e > 0.0 {
        s.next_up()
    } else {
        s
    }
}

#[inline]
pub(crate) fn sub_down(a: f64, b: f64) -> f64 {
    add_down(a, -b)
}

#[inline]
pub(crate) fn sub_up(a: f64, b: f64) -> f64 {
    add_up(a, -b)
}

/// Multiplication rounded toward `-inf`
///
/// A zero factor yields zero even when the other factor is infinite: an
/// infinite bound stands for "arbitrarily large", and any finite value times
/// zero is zero.
#[inline]
pub(crate) fn mul_down(a: f64, b: f64) -> f64 {
    if a == 0.0 || b == 0.0 {
        return 0.0;
    }
    let p = a * b;
    if p.is_infinite() {
        clamp_overflow_down(p, a.is_finite() && b.is_finite())
    } else if p.abs() < FMA_EXACT_MIN {
        p.next_down()
    } else if a.mul_add(b, -p) < 0.0 {
        p.next_down()
    } else {
        p
    }
}

/// Multiplication rounded toward `+inf`, with the same zero convention as
/// [`mul_down`]
#[inline]
pub(crate) fn mul_up(a: f64, b: f64) -> f64 {
    if a == 0.0 || b == 0.0 {
        return 0.0;
    }
    let p = a * b;
    if p.is_infinite() {
        clamp_overflow_up(p, a.is_finite() && b.is_finite())
    } else if p.abs() < FMA_EXACT_MIN {
        p.next_up()
    } else if a.mul_add(b, -p) > 0.0 {
        p.next_up()
    } else {
        p
    }
}

/// Where the exact quotient lies relative to the rounded one
#[derive(Copy, Clone, Debug, PartialEq)]
enum Residual {
    Exact,
    Above,
    Below,
    Unknown,
}

/// Computes `a / b` (with `b != 0`) and classifies the rounding error
///
/// Infinite operands are resolved as limits: `finite / inf` is zero, and
/// `inf / inf` is handled by the callers since its limit is not a single
/// value.
#[inline]
fn div_residual(a: f64, b: f64) -> (f64, Residual) {
    if a == 0.0 || (a.is_finite() && b.is_infinite()) {
        return (0.0, Residual::Exact);
    }
    let q = a / b;
    if q.is_infinite() {
        (q, Residual::Exact)
    } else if q.abs() < f64::MIN_POSITIVE || a.abs() < FMA_EXACT_MIN {
        (q, Residual::Unknown)
    } else {
        // r = a - q * b, exactly
        let r = (-q).mul_add(b, a);
        let side = if r == 0.0 {
            Residual::Exact
        } else if (r > 0.0) == (b > 0.0) {
            Residual::Above
        } else {
            Residual::Below
        };
        (q, side)
    }
}

/// Division rounded toward `-inf`; `b` must be non-zero
#[inline]
pub(crate) fn div_down(a: f64, b: f64) -> f64 {
    if a.is_infinite() && b.is_infinite() {
        return if (a > 0.0) == (b > 0.0) {
            0.0
        } else {
            f64::NEG_INFINITY
        };
    }
    let (q, side) = div_residual(a, b);
    if q.is_infinite() {
        return clamp_overflow_down(q, a.is_finite());
    }
    match side {
        Residual::Below | Residual::Unknown => q.next_down(),
        Residual::Exact | Residual::Above => q,
    }
}

/// Division rounded toward `+inf`; `b` must be non-zero
#[inline]
pub(crate) fn div_up(a: f64, b: f64) -> f64 {
    if a.is_infinite() && b.is_infinite() {
        return if (a > 0.0) == (b > 0.0) {
            f64::INFINITY
        } else {
            0.0
        };
    }
    let (q, side) = div_residual(a, b);
    if q.is_infinite() {
        return clamp_overflow_up(q, a.is_finite());
    }
    match side {
        Residual::Above | Residual::Unknown => q.next_up(),
        Residual::Exact | Residual::Below => q,
    }
}

/// Square root rounded toward `-inf`; `a` must be non-negative
#[inline]
pub(crate) fn sqrt_down(a: f64) -> f64 {
    let s = a.sqrt();
    if s == 0.0 || s.is_infinite() {
        s
    } else if a < FMA_EXACT_MIN {
        s.next_down()
    } else if (-s).mul_add(s, a) < 0.0 {
        s.next_down()
    } else {
        s
    }
}

/// Square root rounded toward `+inf`; `a` must be non-negative
#[inline]
pub(crate) fn sqrt_up(a: f64) -> f64 {
    let s = a.sqrt();
    if s == 0.0 || s.is_infinite() {
        s
    } else if a < FMA_EXACT_MIN {
        s.next_up()
    } else if (-s).mul_add(s, a) > 0.0 {
        s.next_up()
    } else {
        s
    }
}

/// `a^n` rounded toward `-inf`, for `a >= 0`
///
/// Each partial product is a lower bound, and multiplication of non-negative
/// lower bounds stays a lower bound.
pub(crate) fn pow_down(a: f64, n: u32) -> f64 {
    let mut out = 1.0;
    for _ in 0..n {
        out = mul_down(out, a);
    }
    out
}

/// `a^n` rounded toward `+inf`, for `a >= 0`
pub(crate) fn pow_up(a: f64, n: u32) -> f64 {
    let mut out = 1.0;
    for _ in 0..n {
        out = mul_up(out, a);
    }
    out
}

// libm results are not correctly rounded, so transcendental bounds are
// widened by one ulp and clamped to the function's range.

pub(crate) fn exp_down(a: f64) -> f64 {
    if a == 0.0 { 1.0 } else { a.exp().next_down().max(0.0) }
}

pub(crate) fn exp_up(a: f64) -> f64 {
    if a == 0.0 { 1.0 } else { a.exp().next_up() }
}

/// Natural log rounded toward `-inf`; `a` must be non-negative
pub(crate) fn ln_down(a: f64) -> f64 {
    if a == 1.0 { 0.0 } else { a.ln().next_down() }
}

/// Natural log rounded toward `+inf`; `a` must be non-negative
pub(crate) fn ln_up(a: f64) -> f64 {
    if a == 1.0 {
        0.0
    } else if a == 0.0 {
        f64::NEG_INFINITY
    } else {
        a.ln().next_up()
    }
}

pub(crate) fn sin_down(a: f64) -> f64 {
    if a == 0.0 { 0.0 } else { a.sin().next_down().max(-1.0) }
}

pub(crate) fn sin_up(a: f64) -> f64 {
    if a == 0.0 { 0.0 } else { a.sin().next_up().min(1.0) }
}

pub(crate) fn cos_down(a: f64) -> f64 {
    if a == 0.0 { 1.0 } else { a.cos().next_down().max(-1.0) }
}

pub(crate) fn cos_up(a: f64) -> f64 {
    if a == 0.0 { 1.0 } else { a.cos().next_up().min(1.0) }
}

use super::Interval;
use crate::Error;
use serde::{Deserialize, Serialize};

/// An ordered sequence of intervals, one per dimension of a function's domain
///
/// Boxes are built by the caller for each evaluation and are only read by the
/// evaluated function.  The box dereferences to a slice, so `x[0]` reads the
/// first dimension.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntervalBox(Vec<Interval>);

impl IntervalBox {
    /// Builds a box from a list of intervals
    pub fn new(intervals: Vec<Interval>) -> Self {
        Self(intervals)
    }

    /// Builds a box from `[lower, upper]` pairs, validating each one
    ///
    /// ```
    /// # use ibox::types::IntervalBox;
    /// let b = IntervalBox::from_bounds(&[[0.0, 1.0], [-1.0, 1.0]])?;
    /// assert_eq!(b.len(), 2);
    /// assert!(IntervalBox::from_bounds(&[[1.0, 0.0]]).is_err());
    /// # Ok::<(), ibox::Error>(())
    /// ```
    pub fn from_bounds(bounds: &[[f64; 2]]) -> Result<Self, Error> {
        bounds
            .iter()
            .map(|&b| Interval::try_from(b))
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    /// Returns the intervals as a slice
    pub fn as_slice(&self) -> &[Interval] {
        &self.0
    }

    /// Returns a pointer to the first interval
    ///
    /// Together with `len()`, this is the flat-buffer form accepted by
    /// [`eval_raw`](crate::eval::BoxFunction::eval_raw).
    pub fn as_ptr(&self) -> *const Interval {
        self.0.as_ptr()
    }

    /// Checks that the box has exactly `expected` dimensions
    pub fn check_dimension(&self, expected: usize) -> Result<(), Error> {
        check_dimension(&self.0, expected)
    }

    /// Returns the index of the widest dimension
    ///
    /// Ties go to the lowest index; returns `None` for an empty box.
    pub fn widest_dimension(&self) -> Option<usize> {
        self.0
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f64)>, (i, v)| {
                let w = v.width();
                match best {
                    Some((_, bw)) if bw >= w => best,
                    _ => Some((i, w)),
                }
            })
            .map(|(i, _)| i)
    }

    /// Splits the box in two along its widest dimension
    ///
    /// Returns `None` if the box is empty, or if the widest dimension is too
    /// narrow to split (a point, or two adjacent `f64` values).  Otherwise,
    /// both halves are strictly smaller than the original box, so repeated
    /// bisection always terminates.
    ///
    /// ```
    /// # use ibox::types::IntervalBox;
    /// let b = IntervalBox::from_bounds(&[[0.0, 1.0], [0.0, 4.0]])?;
    /// let (lo, hi) = b.bisect().unwrap();
    /// assert_eq!(lo, IntervalBox::from_bounds(&[[0.0, 1.0], [0.0, 2.0]])?);
    /// assert_eq!(hi, IntervalBox::from_bounds(&[[0.0, 1.0], [2.0, 4.0]])?);
    /// # Ok::<(), ibox::Error>(())
    /// ```
    pub fn bisect(&self) -> Option<(Self, Self)> {
        let i = self.widest_dimension()?;
        let v = self.0[i];
        let (a, b) = v.split();
        if a == v || b == v {
            return None;
        }
        let mut lo = self.clone();
        let mut hi = self.clone();
        lo.0[i] = a;
        hi.0[i] = b;
        Some((lo, hi))
    }

    /// Returns the midpoint of every dimension
    pub fn midpoint(&self) -> Vec<f64> {
        self.0.iter().map(|v| v.midpoint()).collect()
    }

    /// Checks whether the given point lies within the box
    ///
    /// Returns `false` if the point has the wrong number of dimensions.
    pub fn contains_point(&self, p: &[f64]) -> bool {
        p.len() == self.0.len()
            && self.0.iter().zip(p).all(|(v, &p)| v.contains(p))
    }
}

/// Checks that a slice of intervals has exactly `expected` elements
pub(crate) fn check_dimension(
    x: &[Interval],
    expected: usize,
) -> Result<(), Error> {
    if x.len() == expected {
        Ok(())
    } else {
        Err(Error::DimensionMismatch {
            expected,
            actual: x.len(),
        })
    }
}

impl std::ops::Deref for IntervalBox {
    type Target = [Interval];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<Interval>> for IntervalBox {
    fn from(v: Vec<Interval>) -> Self {
        Self(v)
    }
}

impl FromIterator<Interval> for IntervalBox {
    fn from_iter<I: IntoIterator<Item = Interval>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl std::fmt::Display for IntervalBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{v}")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_dimension() {
        let b = IntervalBox::from_bounds(&[[0.0, 1.0], [2.0, 3.0]]).unwrap();
        assert!(b.check_dimension(2).is_ok());
        assert_eq!(
            b.check_dimension(3),
            Err(Error::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        );
        assert_eq!(b[1].lower(), 2.0);
    }

    #[test]
    fn test_widest() {
        let b = IntervalBox::from_bounds(&[[0.0, 1.0], [0.0, 3.0], [0.0, 3.0]])
            .unwrap();
        assert_eq!(b.widest_dimension(), Some(1));
        assert_eq!(IntervalBox::default().widest_dimension(), None);
    }

    #[test]
    fn test_bisect_points() {
        let b = IntervalBox::from_bounds(&[[1.0, 1.0], [2.0, 2.0]]).unwrap();
        assert!(b.bisect().is_none());
        assert!(IntervalBox::default().bisect().is_none());
    }

    #[test]
    fn test_bisect_adjacent() {
        let b = IntervalBox::from_bounds(&[[1.0, 1f64.next_up()], [0.0, 0.0]])
            .unwrap();
        assert!(b.bisect().is_none());

        // Repeated bisection bottoms out
        let mut todo =
            vec![IntervalBox::from_bounds(&[[1.0, 1.0 + 1e-13]]).unwrap()];
        let mut leaves = 0;
        while let Some(b) = todo.pop() {
            match b.bisect() {
                Some((lo, hi)) => {
                    assert!(lo[0].width() < b[0].width());
                    assert!(hi[0].width() < b[0].width());
                    todo.push(lo);
                    todo.push(hi);
                }
                None => leaves += 1,
            }
        }
        assert!(leaves > 0 && leaves <= 1024);
    }

    #[test]
    fn test_contains_point() {
        let b = IntervalBox::from_bounds(&[[0.0, 1.0], [2.0, 3.0]]).unwrap();
        assert!(b.contains_point(&[0.5, 2.5]));
        assert!(!b.contains_point(&[0.5, 3.5]));
        assert!(!b.contains_point(&[0.5]));
        assert_eq!(b.midpoint(), vec![0.5, 2.5]);
    }

    #[test]
    fn test_display() {
        let b = IntervalBox::from_bounds(&[[0.0, 1.0], [2.0, 3.0]]).unwrap();
        assert_eq!(b.to_string(), "{[0, 1], [2, 3]}");
    }
}

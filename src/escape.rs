//! The escape-time test.
//!
//! A point `c` is first compared against the threshold disk; anything
//! already outside it is unbounded without further work.  Everything
//! else is iterated under `z -> z² + c`, starting from `z = c`, and is
//! declared unbounded only if the change in magnitude between two
//! steps stops being a finite number.  After the first comparison the
//! threshold plays no part: a point whose orbit leaves the disk but
//! has not overflowed by the end of the budget is still bounded.
//! Replacing this with a per-step threshold check renders a visibly
//! different picture.

use num::Complex;

use crate::complex::ComplexOps;

/// The two knobs of the test, fixed for the duration of a pass.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Params {
    /// Magnitude cutoff for the fast path.
    pub threshold: f64,
    /// Iteration budget.  The orbit is advanced `max_iterations - 1`
    /// times.
    pub max_iterations: usize,
}

impl Params {
    /// Bundle a threshold and an iteration budget.
    pub fn new(threshold: f64, max_iterations: usize) -> Self {
        Params {
            threshold,
            max_iterations,
        }
    }
}

impl Default for Params {
    fn default() -> Self {
        Params::new(2.0, 100)
    }
}

/// Binary outcome per cell.  No iteration count is carried.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Classification {
    /// The orbit survived the whole budget.
    Bounded,
    /// The point started outside the threshold or its orbit overflowed.
    Unbounded,
}

/// A classification together with the number of iteration steps it
/// took to reach it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Escape {
    /// The verdict.
    pub classification: Classification,
    /// Steps of `z -> z² + c` performed; zero on the fast path.
    pub iterations: usize,
}

/// Run the test and report how far the orbit got.
pub fn escape(c: Complex<f64>, params: &Params) -> Escape {
    if c.magnitude() > params.threshold {
        return Escape {
            classification: Classification::Unbounded,
            iterations: 0,
        };
    }

    let mut previous = c;
    for step in 1..params.max_iterations {
        let z = previous.square() + c;
        let diff = z.magnitude() - previous.magnitude();
        if !diff.is_finite() {
            return Escape {
                classification: Classification::Unbounded,
                iterations: step,
            };
        }
        previous = z;
    }

    Escape {
        classification: Classification::Bounded,
        iterations: params.max_iterations.saturating_sub(1),
    }
}

/// Classify the point `c`.
#[inline]
pub fn classify(c: Complex<f64>, params: &Params) -> Classification {
    escape(c, params).classification
}

//! The algebra the classifier needs on top of `num::Complex`.  Values
//! are `Copy` and every operation hands back a fresh number, so an
//! orbit can keep its previous step around without aliasing.

use num::Complex;

/// Squaring and magnitude, spelled out so the floating point
/// behaviour near overflow is exactly the textbook one.
pub trait ComplexOps {
    /// `(re² − im², 2·re·im)`.
    fn square(self) -> Self;

    /// Euclidean norm, `sqrt(re² + im²)`.  Unlike `Complex::norm`
    /// this does not use `hypot`, so it overflows to infinity as soon
    /// as the squares do.  Infinities and NaNs pass straight through.
    fn magnitude(self) -> f64;
}

impl ComplexOps for Complex<f64> {
    #[inline]
    fn square(self) -> Self {
        Complex::new(
            self.re * self.re - self.im * self.im,
            2.0 * self.re * self.im,
        )
    }

    #[inline]
    fn magnitude(self) -> f64 {
        (self.re * self.re + self.im * self.im).sqrt()
    }
}

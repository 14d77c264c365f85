use num::complex::Complex;

pub type C<T> = Complex<T>;

pub fn c(re: f64, im: f64) -> C<f64> {
    Complex::new(re, im)
}

/// Componentwise absolute value, the fold applied by the Burning Ship map.
pub fn fold_abs(z: C<f64>) -> C<f64> {
    c(z.re.abs(), z.im.abs())
}

/// Squared modulus with the bailout compared against it.
pub fn escaped(z: &C<f64>) -> bool {
    z.norm_sqr() > 4.0
}

use fmtastic::Superscript;
use smallvec::SmallVec;

use crate::UnicoolError;

// Coefficient storage shared across the crate. Inline up to degree 7,
// heap beyond that.
pub(crate) type CoeffVec = SmallVec<[f64; 8]>;

/// A univariate polynomial in the power basis.
///
/// Coefficients are stored low-to-high degree, so `coeffs[i]` multiplies
/// `x^i` and `p(x) = a0 + a1*x + ... + an*x^n`. Immutable after
/// construction.
#[derive(Clone, Debug, PartialEq)]
pub struct Polynomial {
    coeffs: CoeffVec,
}

impl Polynomial {
    pub fn new(coeffs: &[f64]) -> Result<Self, UnicoolError> {
        if coeffs.is_empty() {
            return Err(UnicoolError::EmptyPolynomial);
        }
        Ok(Self {
            coeffs: CoeffVec::from_slice(coeffs),
        })
    }

    pub(crate) fn from_coeff_vec(coeffs: CoeffVec) -> Self {
        debug_assert!(!coeffs.is_empty());
        Self { coeffs }
    }

    pub fn degree(&self) -> usize {
        self.coeffs.len() - 1
    }

    pub fn coeffs(&self) -> &[f64] {
        &self.coeffs
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.iter().all(|&c| c == 0.0)
    }

    /// Horner evaluation.
    pub fn eval(&self, x: f64) -> f64 {
        self.coeffs.iter().rev().fold(0.0, |acc, &c| acc * x + c)
    }

    /// The derivative polynomial. A constant differentiates to the zero
    /// polynomial of degree 0.
    pub fn derivative(&self) -> Polynomial {
        if self.degree() == 0 {
            return Polynomial {
                coeffs: smallvec::smallvec![0.0],
            };
        }
        let coeffs = self
            .coeffs
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, &c)| i as f64 * c)
            .collect();
        Polynomial { coeffs }
    }
}

impl core::fmt::Display for Polynomial {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut wrote_term = false;
        for (i, &c) in self.coeffs.iter().enumerate().rev() {
            if c == 0.0 && !(i == 0 && !wrote_term) {
                continue;
            }
            if wrote_term {
                write!(f, " {} ", if c < 0.0 { '-' } else { '+' })?;
            } else if c < 0.0 {
                write!(f, "-")?;
            }
            let mag = c.abs();
            match i {
                0 => write!(f, "{}", mag)?,
                _ => {
                    if mag != 1.0 {
                        write!(f, "{}", mag)?;
                    }
                    if i == 1 {
                        write!(f, "x")?;
                    } else {
                        write!(f, "x{}", Superscript(i))?;
                    }
                }
            }
            wrote_term = true;
        }
        Ok(())
    }
}

#[cfg(test)]
impl approx::AbsDiffEq for Polynomial {
    type Epsilon = f64;

    fn default_epsilon() -> Self::Epsilon {
        1e-10
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.coeffs.len() == other.coeffs.len()
            && std::iter::zip(&self.coeffs, &other.coeffs)
                .all(|(a, b)| (a - b).abs() <= epsilon)
    }
}

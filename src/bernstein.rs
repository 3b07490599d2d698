use crate::binomial::{binomial_coefficient, binomial_ratio};
use crate::polynomial::CoeffVec;
use crate::{Interval, Polynomial, UnicoolError};

/// A polynomial of degree `n` expressed in the Bernstein basis of an
/// interval `[a, b]`:
///
/// `p(x) = sum_i c_i * B_i^n(t)` with `t = (x - a) / (b - a)`.
///
/// The control points `c_0..c_n` carry the geometry: `c_0 = p(a)`,
/// `c_n = p(b)`, and the whole graph of `p` over `[a, b]` lies inside
/// `[min(c_i), max(c_i)]` (convex-hull property). Values are never
/// mutated after construction; [`derivative`](Self::derivative) and
/// [`subdivide`](Self::subdivide) produce new instances.
#[derive(Clone, Debug)]
#[cfg_attr(test, derive(PartialEq))]
pub struct BernsteinPoly {
    coeffs: CoeffVec,
    interval: Interval,
}

impl BernsteinPoly {
    /// Re-express a power-basis polynomial on `[a, b]`.
    ///
    /// Two O(n²) passes: shift the power coefficients onto the unit
    /// interval by expanding `(a + t*h)^j`, then apply the
    /// power-to-Bernstein change of basis
    /// `c_i = sum_{j<=i} q_j * C(i,j) / C(n,j)`.
    ///
    /// # Errors
    /// [`UnicoolError::DegenerateInterval`] when `a >= b`; the affine
    /// transform divides by the width.
    pub fn from_power_basis(
        poly: &Polynomial,
        interval: impl Into<Interval>,
    ) -> Result<Self, UnicoolError> {
        let interval = interval.into();
        if !interval.is_valid() {
            return Err(UnicoolError::DegenerateInterval {
                a: interval.a,
                b: interval.b,
            });
        }

        let unit = shift_to_unit(poly.coeffs(), interval);

        let n = unit.len() - 1;
        let mut coeffs: CoeffVec = smallvec::smallvec![0.0; n + 1];
        for i in 0..=n {
            for j in 0..=i {
                coeffs[i] += unit[j] * binomial_ratio(i, j, n, j);
            }
        }

        Ok(Self { coeffs, interval })
    }

    pub fn degree(&self) -> usize {
        self.coeffs.len() - 1
    }

    pub fn coeffs(&self) -> &[f64] {
        &self.coeffs
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    /// Evaluate at `x` with the de Casteljau recurrence.
    ///
    /// O(n²), but every intermediate value is a convex combination of
    /// control points, so no ill-conditioned powers of `x` are formed.
    pub fn eval(&self, x: f64) -> f64 {
        let t = self.interval.normalize(x);
        let mut coeffs = self.coeffs.clone();
        de_casteljau_right(&mut coeffs, t);
        coeffs[0]
    }

    /// The derivative in Bernstein form on the same interval, one degree
    /// lower. A degree-0 input yields the single coefficient 0.
    pub fn derivative(&self) -> BernsteinPoly {
        let n = self.degree();
        if n == 0 {
            return Self {
                coeffs: smallvec::smallvec![0.0],
                interval: self.interval,
            };
        }
        let scale = n as f64 / self.interval.width();
        let coeffs = self
            .coeffs
            .windows(2)
            .map(|w| scale * (w[1] - w[0]))
            .collect();
        Self {
            coeffs,
            interval: self.interval,
        }
    }

    /// Split at normalized parameter `t` into the restrictions to
    /// `[a, a + t*h]` and `[a + t*h, b]`.
    ///
    /// Runs the de Casteljau triangle to completion; the left child keeps
    /// the first column of the scheme, the right child the trailing
    /// diagonal. Both children reproduce the parent exactly on their
    /// sub-interval.
    pub fn subdivide(&self, t: f64) -> (BernsteinPoly, BernsteinPoly) {
        assert!(t > 0.0 && t < 1.0, "split parameter must lie in (0, 1)");

        let split = self.interval.denormalize(t);
        let mut left = self.coeffs.clone();
        let mut right = self.coeffs.clone();
        de_casteljau_left(&mut left, t);
        de_casteljau_right(&mut right, t);

        (
            Self {
                coeffs: left,
                interval: Interval::new(self.interval.a, split),
            },
            Self {
                coeffs: right,
                interval: Interval::new(split, self.interval.b),
            },
        )
    }

    /// Control-point bounds `(min, max)`.
    ///
    /// By the convex-hull property these enclose every value of the
    /// polynomial on the interval. The enclosure is sound but not tight,
    /// which is exactly what the solver's exclusion test needs.
    pub fn bounds(&self) -> (f64, f64) {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &c in &self.coeffs {
            min = min.min(c);
            max = max.max(c);
        }
        (min, max)
    }

    /// Number of sign changes in the control-point sequence, exact zeros
    /// discarded. Bounds the number of roots in the interval (counted
    /// with multiplicity) and matches its parity.
    pub fn sign_changes(&self) -> usize {
        let mut changes = 0;
        let mut prev = 0.0f64;
        for &c in &self.coeffs {
            if c == 0.0 {
                continue;
            }
            if prev != 0.0 && prev.is_sign_positive() != c.is_sign_positive() {
                changes += 1;
            }
            prev = c;
        }
        changes
    }

    /// Recover the power-basis coefficients on the original variable.
    ///
    /// Inverse of [`from_power_basis`](Self::from_power_basis): the
    /// Bernstein-to-power transform on the unit interval followed by the
    /// rescale `t = (x - a) / h`. Round-tripping reproduces the input up
    /// to floating-point error.
    pub fn to_power_basis(&self) -> Polynomial {
        let n = self.degree();

        // q_j = sum_{i<=j} (-1)^(j-i) C(n,j) C(j,i) c_i
        let mut unit: CoeffVec = smallvec::smallvec![0.0; n + 1];
        for j in 0..=n {
            let binom_n_j = binomial_coefficient(n, j) as f64;
            for i in 0..=j {
                let sign = if (j - i) % 2 == 0 { 1.0 } else { -1.0 };
                unit[j] +=
                    sign * binom_n_j * binomial_coefficient(j, i) as f64 * self.coeffs[i];
            }
        }

        // Substitute t = (x - a)/h: expand q_i * (x - a)^i / h^i.
        let a = self.interval.a;
        let h = self.interval.width();
        let mut power: CoeffVec = smallvec::smallvec![0.0; n + 1];
        for i in 0..=n {
            let scale = unit[i] / h.powi(i as i32);
            for j in 0..=i {
                power[j] += scale
                    * binomial_coefficient(i, j) as f64
                    * (-a).powi((i - j) as i32);
            }
        }

        Polynomial::from_coeff_vec(power)
    }
}

/// Express `p(a + t*h)` in powers of `t` via the binomial expansion of
/// `(a + t*h)^j`.
fn shift_to_unit(coeffs: &[f64], interval: Interval) -> CoeffVec {
    let n = coeffs.len() - 1;
    let a = interval.a;
    let h = interval.width();

    let mut unit: CoeffVec = smallvec::smallvec![0.0; n + 1];
    for i in 0..=n {
        let h_pow = h.powi(i as i32);
        for j in i..=n {
            unit[i] +=
                coeffs[j] * binomial_coefficient(j, i) as f64 * a.powi((j - i) as i32) * h_pow;
        }
    }
    unit
}

// In-place de Casteljau passes. `left` leaves the control points of the
// [0, t] restriction in the slice, `right` those of [t, 1].
fn de_casteljau_left(coeffs: &mut [f64], t: f64) {
    let s = 1.0 - t;
    let n = coeffs.len();
    for round in 1..n {
        for i in (round..n).rev() {
            coeffs[i] = s * coeffs[i - 1] + t * coeffs[i];
        }
    }
}

fn de_casteljau_right(coeffs: &mut [f64], t: f64) {
    let s = 1.0 - t;
    let n = coeffs.len();
    for round in 1..n {
        for i in 0..(n - round) {
            coeffs[i] = s * coeffs[i] + t * coeffs[i + 1];
        }
    }
}

#[cfg(test)]
impl approx::AbsDiffEq for BernsteinPoly {
    type Epsilon = f64;

    fn default_epsilon() -> Self::Epsilon {
        1e-10
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.coeffs.len() == other.coeffs.len()
            && self.interval.abs_diff_eq(&other.interval, epsilon)
            && std::iter::zip(&self.coeffs, &other.coeffs)
                .all(|(a, b)| (a - b).abs() <= epsilon)
    }
}

#[cfg(test)]
mod tests {
    use assertables::{assert_lt, assert_ok};
    use itertools::Itertools as _;

    use crate::test_utils::linspace;

    use super::*;

    fn cubic() -> Polynomial {
        // (x - 1)(x - 2)(x - 3)
        Polynomial::new(&[-6.0, 11.0, -6.0, 1.0]).unwrap()
    }

    #[test]
    fn rejects_degenerate_interval() {
        let p = cubic();
        for iv in [(1.0, 1.0), (2.0, -2.0)] {
            assert!(matches!(
                BernsteinPoly::from_power_basis(&p, iv),
                Err(UnicoolError::DegenerateInterval { .. })
            ));
        }
    }

    #[test]
    fn endpoint_control_points_are_endpoint_values() {
        let p = cubic();
        let bern = assert_ok!(BernsteinPoly::from_power_basis(&p, (0.5, 3.5)));
        assert_lt!((bern.coeffs()[0] - p.eval(0.5)).abs(), 1e-12);
        assert_lt!((bern.coeffs()[3] - p.eval(3.5)).abs(), 1e-12);
    }

    #[test]
    fn eval_matches_power_basis() {
        let p = cubic();
        let bern = assert_ok!(BernsteinPoly::from_power_basis(&p, (-2.0, 4.5)));
        for x in linspace(-2.0, 4.5, 40) {
            assert_lt!((bern.eval(x) - p.eval(x)).abs(), 1e-9);
        }
    }

    #[test]
    fn convex_hull_contains_sampled_values() {
        let polys = [
            Polynomial::new(&[-6.0, 11.0, -6.0, 1.0]).unwrap(),
            Polynomial::new(&[1.0, 0.0, 1.0]).unwrap(),
            Polynomial::new(&[0.25, -1.0, 1.0]).unwrap(),
            Polynomial::new(&[2.0, -3.0, 0.0, 0.5, -0.125, 1.0]).unwrap(),
        ];
        let intervals = [(-5.0, 5.0), (-1.0, 0.25), (0.0, 4.0)];

        for (p, iv) in polys.iter().cartesian_product(intervals) {
            let bern = assert_ok!(BernsteinPoly::from_power_basis(p, iv));
            let (min, max) = bern.bounds();
            for x in linspace(iv.0, iv.1, 57) {
                let value = bern.eval(x);
                assert_lt!(min - 1e-9, value);
                assert_lt!(value, max + 1e-9);
            }
        }
    }

    #[test]
    fn derivative_matches_analytic() {
        let p = cubic();
        let dp = p.derivative();
        let bern = assert_ok!(BernsteinPoly::from_power_basis(&p, (0.0, 4.0)));
        let dbern = bern.derivative();
        assert_eq!(dbern.degree(), 2);
        for x in linspace(0.0, 4.0, 25) {
            assert_lt!((dbern.eval(x) - dp.eval(x)).abs(), 1e-9);
        }
    }

    #[test]
    fn derivative_of_constant() {
        let p = Polynomial::new(&[3.0]).unwrap();
        let bern = assert_ok!(BernsteinPoly::from_power_basis(&p, (0.0, 1.0)));
        let dbern = bern.derivative();
        assert_eq!(dbern.coeffs(), &[0.0]);
    }

    #[test]
    fn subdivision_children_reproduce_parent() {
        let p = cubic();
        let bern = assert_ok!(BernsteinPoly::from_power_basis(&p, (-1.0, 4.0)));

        for t in [0.3, 0.5, 0.85] {
            let (left, right) = bern.subdivide(t);
            let split = bern.interval().denormalize(t);
            assert_lt!((left.interval().b - split).abs(), 1e-12);
            assert_lt!((right.interval().a - split).abs(), 1e-12);

            for x in linspace(-1.0, split, 20) {
                assert_lt!((left.eval(x) - bern.eval(x)).abs(), 1e-9);
            }
            for x in linspace(split, 4.0, 20) {
                assert_lt!((right.eval(x) - bern.eval(x)).abs(), 1e-9);
            }
        }
    }

    #[test]
    fn sign_change_counting() {
        let cases: [(&[f64], usize); 5] = [
            (&[1.0, 2.0, 3.0], 0),
            (&[1.0, -1.0, 1.0], 2),
            (&[-6.0, 1.0, 0.0, 6.0], 1),
            (&[0.0, 0.0, 2.0], 0),
            (&[2.0], 0),
        ];
        for (coeffs, expected) in cases {
            let bern = BernsteinPoly {
                coeffs: CoeffVec::from_slice(coeffs),
                interval: Interval::new(0.0, 1.0),
            };
            assert_eq!(bern.sign_changes(), expected, "coeffs {:?}", coeffs);
        }
    }

    #[test]
    fn sign_changes_bound_roots() {
        // Three simple roots inside the interval: at least three changes.
        let p = cubic();
        let bern = assert_ok!(BernsteinPoly::from_power_basis(&p, (0.0, 4.0)));
        assert_eq!(bern.sign_changes(), 3);

        // No roots: no changes.
        let q = Polynomial::new(&[1.0, 0.0, 1.0]).unwrap();
        let bern = assert_ok!(BernsteinPoly::from_power_basis(&q, (1.0, 2.0)));
        assert_eq!(bern.sign_changes(), 0);
    }

    #[test]
    fn round_trip_unit_interval() {
        let p = cubic();
        let bern = assert_ok!(BernsteinPoly::from_power_basis(&p, (0.0, 1.0)));
        approx::assert_abs_diff_eq!(bern.to_power_basis(), p, epsilon = 1e-10);
    }

    #[test]
    fn round_trip_up_to_degree_20() {
        for degree in 0..=20usize {
            let coeffs = (0..=degree)
                .map(|i| {
                    let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
                    sign * (0.3 + 0.7 * i as f64)
                })
                .collect_vec();
            let p = Polynomial::new(&coeffs).unwrap();
            let bern = assert_ok!(BernsteinPoly::from_power_basis(&p, (0.25, 1.25)));
            let back = bern.to_power_basis();

            for (orig, rec) in std::iter::zip(p.coeffs(), back.coeffs()) {
                let scale = orig.abs().max(1.0);
                assert_lt!(
                    (orig - rec).abs() / scale,
                    1e-6,
                    "degree {}: {} vs {}",
                    degree,
                    orig,
                    rec
                );
            }
        }
    }

    #[test]
    fn round_trip_shifted_interval() {
        // Interval away from the origin exercises the a^(j-i) terms.
        let p = Polynomial::new(&[4.0, -4.0, 1.0]).unwrap();
        let bern = assert_ok!(BernsteinPoly::from_power_basis(&p, (-3.0, 7.0)));
        approx::assert_abs_diff_eq!(bern.to_power_basis(), p, epsilon = 1e-9);
    }
}

//! Real-root isolation for univariate polynomials via the Bernstein basis.
//!
//! A polynomial given in the power basis is re-expressed in Bernstein form
//! on each candidate interval; the convex hull of the Bernstein control
//! points bounds the polynomial there, which lets whole intervals be
//! excluded without a single evaluation. Intervals that survive are handed
//! to a Newton-Raphson shortcut or bisected further.

mod bernstein;
mod binomial;
mod interval;
mod newton;
mod polynomial;
mod solver;

#[cfg(test)]
mod test_utils;

pub use bernstein::BernsteinPoly;
pub use binomial::binomial_coefficient;
pub use interval::Interval;
pub use newton::{newton_raphson, newton_step};
pub use polynomial::Polynomial;
pub use solver::{find_roots, merge_close_roots, RootSearch, RootSolver, SolverStats};

use snafu::prelude::*;

#[derive(Debug, Snafu)]
pub enum UnicoolError {
    #[snafu(display("Degenerate interval [{}, {}]: lower bound must be below upper", a, b))]
    DegenerateInterval { a: f64, b: f64 },

    #[snafu(display("Polynomial needs at least one coefficient"))]
    EmptyPolynomial,

    #[snafu(display(
        "Derivative {:e} at x = {} is too small for a reliable Newton step",
        dfx,
        x
    ))]
    NearSingularDerivative { x: f64, dfx: f64 },
}

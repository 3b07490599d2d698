use crate::newton::newton_raphson;
use crate::{BernsteinPoly, Interval, Polynomial, UnicoolError};

// Iteration budget for one Newton attempt inside the subdivision loop.
const NEWTON_MAX_ITER: usize = 50;

/// Counters describing one [`RootSolver::find_roots`] run.
///
/// Returned by value inside [`RootSearch`] so a shared solver can serve
/// concurrent searches without interior mutability.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SolverStats {
    pub num_subdivisions: usize,
    pub num_newton_steps: usize,
    pub num_exclusions: usize,
    pub polynomial_degree: usize,
}

/// Result of a root search: the merged, strictly ascending root list and
/// the statistics of the run that produced it.
#[derive(Clone, Debug)]
pub struct RootSearch {
    pub roots: Vec<f64>,
    pub stats: SolverStats,
}

/// Isolates the real roots of a polynomial inside a bounded interval.
///
/// Each candidate interval is re-expressed in the Bernstein basis; if all
/// control points share a sign the interval is excluded outright
/// (convex-hull property). When the control points show at most one sign
/// change the interval holds at most one root and a Newton-Raphson run
/// from the midpoint may finish it off. Everything else is bisected.
pub struct RootSolver {
    poly: Polynomial,
    deriv: Polynomial,
    tolerance: f64,
    max_subdivisions: usize,
}

impl RootSolver {
    /// Solver with the default tolerance `1e-10` and subdivision depth
    /// limit `100`.
    pub fn new(poly: Polynomial) -> Self {
        let deriv = poly.derivative();
        Self {
            poly,
            deriv,
            tolerance: 1e-10,
            max_subdivisions: 100,
        }
    }

    /// Residual threshold for accepting a root and width threshold for
    /// collapsing an interval.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Recursion depth limit; the only brake on degenerate inputs.
    pub fn with_max_subdivisions(mut self, max_subdivisions: usize) -> Self {
        self.max_subdivisions = max_subdivisions;
        self
    }

    pub fn polynomial(&self) -> &Polynomial {
        &self.poly
    }

    /// Find all real roots inside `interval`, sorted ascending with
    /// near-duplicates merged.
    ///
    /// Runs a depth-first work list instead of call-stack recursion, so
    /// the depth limit bounds memory rather than the thread stack. Every
    /// numerical failure inside the search (non-convergence, near-singular
    /// derivative, overflow) demotes the candidate to further bisection;
    /// the only surfaced error is a degenerate input interval.
    pub fn find_roots(&self, interval: impl Into<Interval>) -> Result<RootSearch, UnicoolError> {
        let interval = interval.into();
        if !interval.is_valid() {
            return Err(UnicoolError::DegenerateInterval {
                a: interval.a,
                b: interval.b,
            });
        }

        let mut stats = SolverStats {
            polynomial_degree: self.poly.degree(),
            ..SolverStats::default()
        };
        let mut roots = Vec::new();

        if self.poly.is_zero() {
            // Identically zero: every point is a root, which subdivision
            // would chase forever. Report nothing rather than hang.
            log::warn!("zero polynomial passed to find_roots, returning no roots");
            return Ok(RootSearch { roots, stats });
        }

        let mut queue = vec![(interval, 0usize)];
        while let Some((iv, depth)) = queue.pop() {
            if depth > self.max_subdivisions {
                // Out of budget; salvage the midpoint of an already tiny
                // interval, drop anything wider.
                if iv.width() < self.tolerance {
                    self.push_if_root(iv.midpoint(), &mut roots);
                }
                continue;
            }

            let bern = BernsteinPoly::from_power_basis(&self.poly, iv)?;

            let (min, max) = bern.bounds();
            if min > 0.0 || max < 0.0 {
                log::debug!("[{}, {}] excluded, bounds ({min}, {max})", iv.a, iv.b);
                stats.num_exclusions += 1;
                continue;
            }

            if iv.width() < self.tolerance {
                self.push_if_root(iv.midpoint(), &mut roots);
                continue;
            }

            let mid = iv.midpoint();

            // The control polygon crosses zero at most once here, so the
            // interval holds at most one root and a converged Newton run
            // settles it without further subdivision.
            if bern.sign_changes() <= 1 {
                stats.num_newton_steps += 1;
                let (root, converged) = newton_raphson(
                    |x| self.poly.eval(x),
                    |x| self.deriv.eval(x),
                    mid,
                    self.tolerance,
                    NEWTON_MAX_ITER,
                );
                if converged
                    && iv.contains(root, self.tolerance)
                    && self.poly.eval(root).abs() < self.tolerance
                {
                    log::debug!("[{}, {}] newton root {root}", iv.a, iv.b);
                    roots.push(root);
                    continue;
                }
            }

            stats.num_subdivisions += 1;
            log::debug!("[{}, {}] split at {mid}, depth {depth}", iv.a, iv.b);

            // A root sitting exactly on the split point evaluates to an
            // exact zero and would otherwise be invisible: it only ever
            // appears as a discarded zero endpoint coefficient of the two
            // children. Anything short of an exact zero is left to the
            // children, whose endpoint sign carries the information.
            if self.poly.eval(mid) == 0.0 {
                roots.push(mid);
            }

            let (left, right) = iv.split();
            queue.push((left, depth + 1));
            queue.push((right, depth + 1));
        }

        roots.sort_by(f64::total_cmp);
        merge_close_roots(&mut roots, self.tolerance);

        Ok(RootSearch { roots, stats })
    }

    /// Residuals `|p(root)|` for a candidate list.
    pub fn verify_roots(&self, roots: &[f64]) -> Vec<(f64, f64)> {
        roots
            .iter()
            .map(|&root| (root, self.poly.eval(root).abs()))
            .collect()
    }

    fn push_if_root(&self, x: f64, roots: &mut Vec<f64>) {
        if self.poly.eval(x).abs() < self.tolerance {
            roots.push(x);
        }
    }
}

/// Collapse runs of nearly identical values in a sorted list, keeping the
/// first occurrence of each run. Idempotent: after one pass all survivors
/// are more than `tolerance` apart.
pub fn merge_close_roots(roots: &mut Vec<f64>, tolerance: f64) {
    let mut kept: Option<f64> = None;
    roots.retain(|&root| match kept {
        Some(prev) if (root - prev).abs() <= tolerance => false,
        _ => {
            kept = Some(root);
            true
        }
    });
}

/// One-shot convenience: find the roots of `p(x) = sum coeffs[i] * x^i`
/// on `interval`.
pub fn find_roots(
    coeffs: &[f64],
    interval: (f64, f64),
    tolerance: f64,
) -> Result<Vec<f64>, UnicoolError> {
    let solver = RootSolver::new(Polynomial::new(coeffs)?).with_tolerance(tolerance);
    Ok(solver.find_roots(interval)?.roots)
}

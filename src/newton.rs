use crate::UnicoolError;

// Below this derivative magnitude a Newton step is meaningless; the
// iterate would jump far outside any bracket. Usually a multiple root.
const DERIVATIVE_FLOOR: f64 = 1e-14;

/// One Newton-Raphson update `x - f(x) / f'(x)`.
///
/// # Errors
/// [`UnicoolError::NearSingularDerivative`] when `|f'(x)|` is below
/// `1e-14`. Callers inside the solver treat this as "no step available"
/// and fall back to bisection.
pub fn newton_step<F, G>(f: F, df: G, x: f64) -> Result<f64, UnicoolError>
where
    F: Fn(f64) -> f64,
    G: Fn(f64) -> f64,
{
    let fx = f(x);
    let dfx = df(x);

    if dfx.abs() < DERIVATIVE_FLOOR {
        return Err(UnicoolError::NearSingularDerivative { x, dfx });
    }

    Ok(x - fx / dfx)
}

/// Full Newton-Raphson iteration from `x0`.
///
/// Stops when `|f(x)| < tol`, when the step shrinks below `tol`, or after
/// `max_iter` updates. Returns the best estimate together with a
/// convergence flag; a near-singular derivative, a non-finite value or an
/// exhausted iteration budget report `false` instead of an error.
pub fn newton_raphson<F, G>(f: F, df: G, x0: f64, tol: f64, max_iter: usize) -> (f64, bool)
where
    F: Fn(f64) -> f64,
    G: Fn(f64) -> f64,
{
    let mut x = x0;

    for _ in 0..max_iter {
        let fx = f(x);
        if !fx.is_finite() {
            return (x, false);
        }
        if fx.abs() < tol {
            return (x, true);
        }

        let x_next = match newton_step(&f, &df, x) {
            Ok(v) if v.is_finite() => v,
            _ => return (x, false),
        };

        if (x_next - x).abs() < tol {
            let residual = f(x_next);
            return (x_next, residual.is_finite() && residual.abs() < tol);
        }

        x = x_next;
    }

    let residual = f(x);
    (x, residual.is_finite() && residual.abs() < tol)
}

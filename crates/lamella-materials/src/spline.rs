//! Natural cubic spline interpolation for tabulated optical constants.
//!
//! Handbook data gives $n(\lambda)$ and $k(\lambda)$ at discrete wavelengths.
//! A natural cubic spline provides a smooth curve through the table, with
//! continuous first and second derivatives, so that fine spectral sweeps do
//! not pick up kinks at the data points.

/// A natural cubic spline through $(x_i, y_i)$ knots.
///
/// The second derivative is zero at both ends (natural boundary condition).
/// Evaluation inside the knot range interpolates; evaluation outside uses
/// the boundary polynomial of the nearest interval, so callers that must
/// not extrapolate should range-check first.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    knots_x: Vec<f64>,
    knots_y: Vec<f64>,
    /// Second derivative of the spline at each knot.
    curvature: Vec<f64>,
}

impl CubicSpline {
    /// Fit a natural cubic spline through the given knots.
    ///
    /// # Panics
    /// Panics if the slices differ in length, contain fewer than 2 points,
    /// or if `xs` is not strictly increasing. Tabulated material data is
    /// validated at construction, so these are programming errors.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Self {
        assert_eq!(xs.len(), ys.len(), "knot coordinate slices must match");
        assert!(xs.len() >= 2, "spline needs at least 2 knots");
        assert!(
            xs.windows(2).all(|w| w[0] < w[1]),
            "spline knots must be strictly increasing"
        );

        let n = xs.len();
        let mut curvature = vec![0.0; n];
        let mut scratch = vec![0.0; n];

        // Tridiagonal solve for the interior second derivatives; the
        // natural condition pins curvature[0] and curvature[n-1] at zero.
        for i in 1..n - 1 {
            let h_lo = xs[i] - xs[i - 1];
            let h_hi = xs[i + 1] - xs[i];
            let sig = h_lo / (h_lo + h_hi);
            let p = sig * curvature[i - 1] + 2.0;
            curvature[i] = (sig - 1.0) / p;
            let slope_hi = (ys[i + 1] - ys[i]) / h_hi;
            let slope_lo = (ys[i] - ys[i - 1]) / h_lo;
            scratch[i] =
                (6.0 * (slope_hi - slope_lo) / (h_lo + h_hi) - sig * scratch[i - 1]) / p;
        }
        for i in (1..n - 1).rev() {
            curvature[i] = curvature[i] * curvature[i + 1] + scratch[i];
        }

        Self {
            knots_x: xs,
            knots_y: ys,
            curvature,
        }
    }

    /// Evaluate the spline at `x`.
    pub fn evaluate(&self, x: f64) -> f64 {
        // Index of the interval [x_lo, x_hi] containing x (clamped to the
        // boundary intervals for out-of-range arguments).
        let hi = self
            .knots_x
            .partition_point(|&knot| knot < x)
            .clamp(1, self.knots_x.len() - 1);
        let lo = hi - 1;

        let h = self.knots_x[hi] - self.knots_x[lo];
        let a = (self.knots_x[hi] - x) / h;
        let b = (x - self.knots_x[lo]) / h;

        a * self.knots_y[lo]
            + b * self.knots_y[hi]
            + ((a.powi(3) - a) * self.curvature[lo] + (b.powi(3) - b) * self.curvature[hi])
                * h
                * h
                / 6.0
    }
}

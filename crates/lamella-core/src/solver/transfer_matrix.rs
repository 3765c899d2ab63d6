//! Abelès characteristic-matrix solver.
//!
//! Each layer contributes a 2×2 complex matrix built from its phase
//! thickness and optical admittance; the stack matrix is the ordered
//! product, and the amplitude coefficients follow from boundary matching
//! against the admittances of the two semi-infinite media.
//!
//! # Reference
//! Macleod, *Thin-Film Optical Filters*, 4th ed., ch. 2.

use std::f64::consts::PI;

use num_complex::Complex64;

use super::{Amplitudes, Polarization, ResolvedStack, SolverError, StackSolver};

/// 2×2 complex characteristic matrix.
#[derive(Debug, Clone, Copy)]
struct CharMatrix {
    m00: Complex64,
    m01: Complex64,
    m10: Complex64,
    m11: Complex64,
}

impl CharMatrix {
    fn identity() -> Self {
        Self {
            m00: Complex64::new(1.0, 0.0),
            m01: Complex64::new(0.0, 0.0),
            m10: Complex64::new(0.0, 0.0),
            m11: Complex64::new(1.0, 0.0),
        }
    }

    /// Characteristic matrix of one homogeneous layer:
    /// $\begin{pmatrix} \cos\delta & i\sin\delta/\tilde\eta \\
    /// i\tilde\eta\sin\delta & \cos\delta \end{pmatrix}$
    /// with phase thickness $\delta$ and admittance $\tilde\eta$.
    fn layer(delta: Complex64, admittance: Complex64) -> Self {
        let i = Complex64::i();
        let cos = delta.cos();
        let sin = delta.sin();
        Self {
            m00: cos,
            m01: i * sin / admittance,
            m10: i * admittance * sin,
            m11: cos,
        }
    }

    fn mul(self, rhs: Self) -> Self {
        Self {
            m00: self.m00 * rhs.m00 + self.m01 * rhs.m10,
            m01: self.m00 * rhs.m01 + self.m01 * rhs.m11,
            m10: self.m10 * rhs.m00 + self.m11 * rhs.m10,
            m11: self.m10 * rhs.m01 + self.m11 * rhs.m11,
        }
    }

    fn is_finite(&self) -> bool {
        self.m00.is_finite() && self.m01.is_finite() && self.m10.is_finite() && self.m11.is_finite()
    }
}

/// Transverse wavevector factor $\hat{n}\cos\theta = \sqrt{\hat{n}^2 - \alpha^2}$
/// for a medium of index `n` given the conserved Snell invariant
/// $\alpha = \hat{n}_0 \sin\theta_0$.
///
/// The principal branch of the complex square root makes
/// $\mathrm{Im}(\hat{n}\cos\theta) \geq 0$ in lossless evanescent regions,
/// so fields decay rather than grow past the critical angle.
fn transverse(n: Complex64, alpha: Complex64) -> Complex64 {
    (n * n - alpha * alpha).sqrt()
}

/// Polarization-dependent optical admittance (in free-space units):
/// $\eta_s = \hat{n}\cos\theta$, $\eta_p = \hat{n}^2 / (\hat{n}\cos\theta)$.
fn admittance(n: Complex64, n_cos_theta: Complex64, pol: Polarization) -> Complex64 {
    match pol {
        Polarization::S => n_cos_theta,
        Polarization::P => n * n / n_cos_theta,
    }
}

/// Characteristic-matrix solver for stratified stacks.
///
/// Stateless; one instance serves any number of concurrent evaluations.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransferMatrixSolver;

impl StackSolver for TransferMatrixSolver {
    fn amplitudes(
        &self,
        stack: &ResolvedStack,
        wavelength_nm: f64,
        angle_deg: f64,
        pol: Polarization,
    ) -> Result<Amplitudes, SolverError> {
        if !wavelength_nm.is_finite() || wavelength_nm <= 0.0 {
            return Err(SolverError::InvalidWavelength(wavelength_nm));
        }
        if !angle_deg.is_finite() || !(0.0..90.0).contains(&angle_deg) {
            return Err(SolverError::InvalidAngle(angle_deg));
        }

        let non_finite = |context: &'static str| SolverError::NonFinite {
            wavelength_nm,
            angle_deg,
            context,
        };

        // Conserved horizontal component of the wavevector (complex Snell).
        let alpha = stack.incident * angle_deg.to_radians().sin();

        let eta_in = admittance(stack.incident, transverse(stack.incident, alpha), pol);
        let eta_out = admittance(stack.exit, transverse(stack.exit, alpha), pol);
        if !eta_in.is_finite() || !eta_out.is_finite() {
            return Err(non_finite("medium admittance"));
        }

        // Stack matrix M = M_1 · M_2 · … · M_N, incident side first.
        let mut m = CharMatrix::identity();
        for &(n, thickness_nm) in &stack.layers {
            let n_cos_theta = transverse(n, alpha);
            let eta = admittance(n, n_cos_theta, pol);
            let delta = 2.0 * PI * thickness_nm / wavelength_nm * n_cos_theta;
            let layer = CharMatrix::layer(delta, eta);
            if !layer.is_finite() {
                return Err(non_finite("layer characteristic matrix"));
            }
            m = m.mul(layer);
        }
        if !m.is_finite() {
            return Err(non_finite("stack matrix product"));
        }

        // Boundary matching: (B, C)ᵀ = M · (1, η_exit)ᵀ.
        let b = m.m00 + m.m01 * eta_out;
        let c = m.m10 + m.m11 * eta_out;
        let denominator = eta_in * b + c;
        if !denominator.is_finite() || denominator.norm_sqr() == 0.0 {
            return Err(non_finite("boundary-matching denominator"));
        }

        let r = (eta_in * b - c) / denominator;
        let t = 2.0 * eta_in / denominator;
        if !r.is_finite() || !t.is_finite() {
            return Err(non_finite("amplitude coefficients"));
        }

        Ok(Amplitudes {
            r,
            t,
            eta_in,
            eta_out,
        })
    }

    fn method_name(&self) -> &str {
        "Abelès characteristic matrix"
    }
}

//! Stack solver abstraction and the transfer-matrix implementation.
//!
//! The [`StackSolver`] trait defines the single-point contract: one
//! (wavelength, angle, polarization) triple in, complex amplitude
//! coefficients out. The sweep engine and any front end operate against the
//! trait; the implementation is the Abelès characteristic-matrix method in
//! [`transfer_matrix`].

pub mod transfer_matrix;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use lamella_materials::MaterialRegistry;

use crate::types::{ConfigError, Stack};

pub use transfer_matrix::TransferMatrixSolver;

/// Errors from a single solver evaluation.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("Invalid wavelength {0} nm (must be finite and > 0)")]
    InvalidWavelength(f64),

    #[error("Invalid angle of incidence {0}° (must lie in [0°, 90°))")]
    InvalidAngle(f64),

    #[error("Non-finite result at λ={wavelength_nm} nm, θ={angle_deg}°: {context}")]
    NonFinite {
        wavelength_nm: f64,
        angle_deg: f64,
        context: &'static str,
    },
}

/// Linear polarization of the incident field relative to the plane of
/// incidence: `S` perpendicular, `P` parallel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarization {
    S,
    P,
}

/// A stack with all material references resolved at one wavelength.
///
/// Pure numeric input to the solver: complex indices in the
/// $\hat{n} = n - ik$ convention plus physical thicknesses. Resolution is
/// the only part that touches the registry; the solver itself is a pure
/// function.
#[derive(Debug, Clone)]
pub struct ResolvedStack {
    /// Index of the semi-infinite incident medium.
    pub incident: Complex64,
    /// (index, thickness in nm) per layer, first layer nearest the
    /// incident medium.
    pub layers: Vec<(Complex64, f64)>,
    /// Index of the semi-infinite exit medium.
    pub exit: Complex64,
}

impl ResolvedStack {
    /// Resolve a [`Stack`] against a registry at one wavelength.
    ///
    /// Configuration errors (unknown material, bad thickness, passivity
    /// violation, tabulated data out of range) surface here, before any
    /// matrix arithmetic runs.
    pub fn resolve(
        stack: &Stack,
        registry: &MaterialRegistry,
        wavelength_nm: f64,
    ) -> Result<Self, ConfigError> {
        if !wavelength_nm.is_finite() || wavelength_nm <= 0.0 {
            return Err(ConfigError::InvalidWavelength(wavelength_nm));
        }
        let incident = registry.index_of(&stack.incident, wavelength_nm)?;
        let exit = registry.index_of(&stack.exit, wavelength_nm)?;
        let mut layers = Vec::with_capacity(stack.layers.len());
        for (index, layer) in stack.layers.iter().enumerate() {
            if !layer.thickness_nm.is_finite() || layer.thickness_nm <= 0.0 {
                return Err(ConfigError::InvalidThickness {
                    index,
                    material: layer.material.clone(),
                    thickness_nm: layer.thickness_nm,
                });
            }
            let n = registry.index_of(&layer.material, wavelength_nm)?;
            layers.push((n, layer.thickness_nm));
        }
        Ok(Self {
            incident,
            layers,
            exit,
        })
    }
}

/// Complex amplitude coefficients for one (λ, θ, polarization) triple,
/// together with the admittances of the two semi-infinite media.
#[derive(Debug, Clone, Copy)]
pub struct Amplitudes {
    /// Amplitude reflection coefficient.
    pub r: Complex64,
    /// Amplitude transmission coefficient.
    pub t: Complex64,
    /// Optical admittance of the incident medium (polarization-dependent).
    pub eta_in: Complex64,
    /// Optical admittance of the exit medium (polarization-dependent).
    pub eta_out: Complex64,
}

impl Amplitudes {
    /// Reflected power fraction $R = |r|^2$.
    pub fn reflectance(&self) -> f64 {
        self.r.norm_sqr()
    }

    /// Transmitted power fraction
    /// $T = \frac{\mathrm{Re}\,\eta_{out}}{\mathrm{Re}\,\eta_{in}} |t|^2$.
    ///
    /// The admittance ratio is required for energy conservation away from
    /// normal incidence and in absorbing exit media; beyond the critical
    /// angle the exit admittance is purely imaginary and $T = 0$.
    pub fn transmittance(&self) -> f64 {
        if self.eta_in.re == 0.0 {
            return 0.0;
        }
        (self.eta_out.re / self.eta_in.re) * self.t.norm_sqr()
    }
}

/// The single-point solver contract.
///
/// Implementations must be pure functions of their arguments so that the
/// sweep engine can evaluate samples in parallel without synchronization.
pub trait StackSolver: Send + Sync {
    /// Amplitude coefficients for one (wavelength, angle, polarization)
    /// triple. The angle is measured from the normal, in the incident
    /// medium, in degrees.
    fn amplitudes(
        &self,
        stack: &ResolvedStack,
        wavelength_nm: f64,
        angle_deg: f64,
        pol: Polarization,
    ) -> Result<Amplitudes, SolverError>;

    /// Human-readable name of the solver method.
    fn method_name(&self) -> &str;
}

//! Material property provider trait.
//!
//! All dispersion models implement [`MaterialProvider`], which returns the
//! wavelength-dependent complex refractive index of an optically homogeneous
//! medium in the $\hat{n} = n - ik$ convention ($n$ phase index, $k \geq 0$
//! extinction coefficient).

use num_complex::Complex64;
use thiserror::Error;

/// Errors from material providers and registry lookups.
#[derive(Debug, Error)]
pub enum MaterialError {
    #[error("Wavelength {wavelength_nm} nm is outside the data range [{min}, {max}] nm")]
    OutOfRange {
        wavelength_nm: f64,
        min: f64,
        max: f64,
    },

    #[error("Material not found: {0}")]
    NotFound(String),

    #[error(
        "Material '{name}' is not passive at {wavelength_nm} nm (n={n}, k={k}); \
         require n > 0 and k >= 0"
    )]
    NotPassive {
        name: String,
        wavelength_nm: f64,
        n: f64,
        k: f64,
    },
}

/// Provides the wavelength-dependent complex refractive index of a medium.
///
/// Implementations include fixed-index design materials
/// ([`ConstantIndex`](crate::dispersion::ConstantIndex)) and tabulated
/// handbook data ([`TabulatedIndex`](crate::dispersion::TabulatedIndex)).
pub trait MaterialProvider: Send + Sync {
    /// Human-readable name of this material.
    fn name(&self) -> &str;

    /// Wavelength range over which data is available (nm).
    fn wavelength_range(&self) -> (f64, f64);

    /// Complex refractive index $\hat{n} = n - ik$ at a given wavelength.
    ///
    /// The imaginary part is non-positive in this convention; the extinction
    /// coefficient itself is `-index.im`.
    fn refractive_index(&self, wavelength_nm: f64) -> Result<Complex64, MaterialError>;
}

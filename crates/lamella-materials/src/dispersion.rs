//! Dispersion models: constant indices and spline-interpolated tables.
//!
//! Coating design work often uses a fixed $(n, k)$ pair per material;
//! [`ConstantIndex`] covers that case. [`TabulatedIndex`] carries handbook
//! optical-constant tables and interpolates them with natural cubic splines.
//! A few common coating materials are embedded at compile time.

use num_complex::Complex64;

use crate::provider::{MaterialError, MaterialProvider};
use crate::spline::CubicSpline;

/// Wavelength-independent complex index $\hat{n} = n - ik$.
///
/// Valid at every positive wavelength. The dominant model for design
/// studies, where the question is "what does a stack of these two indices
/// do", not "what does this exact deposited film do".
#[derive(Debug, Clone)]
pub struct ConstantIndex {
    name: String,
    n: f64,
    k: f64,
}

impl ConstantIndex {
    /// Create a constant-index material.
    ///
    /// `n` is the real index, `k` the extinction coefficient ($k \geq 0$ for
    /// a passive medium). Passivity is not enforced here; the registry
    /// rejects non-passive lookups so that a bad configuration surfaces as a
    /// [`MaterialError::NotPassive`] instead of a silent clamp.
    pub fn new(name: impl Into<String>, n: f64, k: f64) -> Self {
        Self {
            name: name.into(),
            n,
            k,
        }
    }

    /// Vacuum / air ambient (n = 1).
    pub fn air() -> Self {
        Self::new("Air", 1.0, 0.0)
    }

    /// Generic crown-glass substrate (n = 1.52).
    pub fn bk7() -> Self {
        Self::new("Glass_BK7", 1.52, 0.0)
    }
}

impl MaterialProvider for ConstantIndex {
    fn name(&self) -> &str {
        &self.name
    }

    fn wavelength_range(&self) -> (f64, f64) {
        (f64::MIN_POSITIVE, f64::INFINITY)
    }

    fn refractive_index(&self, _wavelength_nm: f64) -> Result<Complex64, MaterialError> {
        Ok(Complex64::new(self.n, -self.k))
    }
}

/// Tabulated $(n, k)$ data interpolated with natural cubic splines.
///
/// Lookups outside the tabulated range are [`MaterialError::OutOfRange`];
/// optical-constant tables must never be extrapolated.
pub struct TabulatedIndex {
    name: String,
    min_nm: f64,
    max_nm: f64,
    spline_n: CubicSpline,
    spline_k: CubicSpline,
}

impl TabulatedIndex {
    /// Construct from tabulated data.
    ///
    /// # Arguments
    /// * `name` - Material name (e.g. "SiO2").
    /// * `wavelengths_nm` - Strictly increasing wavelengths in nm.
    /// * `n` - Real index at each wavelength.
    /// * `k` - Extinction coefficient at each wavelength.
    ///
    /// # Panics
    /// Panics if the columns differ in length, hold fewer than 2 entries,
    /// or if `wavelengths_nm` is not strictly increasing. Tables are
    /// compiled in or validated at load, so these are programming errors.
    pub fn new(
        name: impl Into<String>,
        wavelengths_nm: Vec<f64>,
        n: Vec<f64>,
        k: Vec<f64>,
    ) -> Self {
        assert!(
            wavelengths_nm.len() >= 2,
            "tabulated material needs at least 2 entries"
        );
        assert!(
            wavelengths_nm.len() == n.len() && wavelengths_nm.len() == k.len(),
            "table columns must match in length"
        );
        let min_nm = wavelengths_nm[0];
        let max_nm = *wavelengths_nm.last().expect("non-empty table");
        let spline_n = CubicSpline::new(wavelengths_nm.clone(), n);
        let spline_k = CubicSpline::new(wavelengths_nm, k);
        Self {
            name: name.into(),
            min_nm,
            max_nm,
            spline_n,
            spline_k,
        }
    }

    /// Fused silica (SiO₂), 300–1000 nm. Malitson-style handbook values.
    pub fn sio2() -> Self {
        Self::new(
            "SiO2",
            vec![300.0, 400.0, 500.0, 600.0, 700.0, 800.0, 1000.0],
            vec![1.4878, 1.4701, 1.4623, 1.4580, 1.4553, 1.4533, 1.4504],
            vec![0.0; 7],
        )
    }

    /// Titania (TiO₂) thin film, 350–1000 nm. Weakly absorbing at the
    /// blue edge of the table.
    pub fn tio2() -> Self {
        Self::new(
            "TiO2",
            vec![350.0, 400.0, 450.0, 500.0, 550.0, 600.0, 700.0, 800.0, 1000.0],
            vec![2.72, 2.55, 2.47, 2.42, 2.39, 2.36, 2.33, 2.31, 2.29],
            vec![0.005, 0.001, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        )
    }

    /// Magnesium fluoride (MgF₂), 300–1000 nm.
    pub fn mgf2() -> Self {
        Self::new(
            "MgF2",
            vec![300.0, 400.0, 500.0, 600.0, 700.0, 800.0, 1000.0],
            vec![1.3930, 1.3840, 1.3795, 1.3770, 1.3753, 1.3741, 1.3726],
            vec![0.0; 7],
        )
    }
}

impl MaterialProvider for TabulatedIndex {
    fn name(&self) -> &str {
        &self.name
    }

    fn wavelength_range(&self) -> (f64, f64) {
        (self.min_nm, self.max_nm)
    }

    fn refractive_index(&self, wavelength_nm: f64) -> Result<Complex64, MaterialError> {
        if wavelength_nm < self.min_nm || wavelength_nm > self.max_nm {
            return Err(MaterialError::OutOfRange {
                wavelength_nm,
                min: self.min_nm,
                max: self.max_nm,
            });
        }
        let n = self.spline_n.evaluate(wavelength_nm);
        let k = self.spline_k.evaluate(wavelength_nm);
        Ok(Complex64::new(n, -k))
    }
}

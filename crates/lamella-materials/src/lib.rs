//! # Lamella Materials
//!
//! Material property providers for the Lamella thin-film framework. All
//! materials implement the [`MaterialProvider`](provider::MaterialProvider)
//! trait, which returns the complex refractive index $\hat{n} = n - ik$
//! as a function of wavelength.
//!
//! ## Dispersion models
//!
//! | Model | Module | Use case |
//! |-------|--------|----------|
//! | Constant (n, k) | [`dispersion::ConstantIndex`] | Design studies at a fixed index |
//! | Tabulated + spline | [`dispersion::TabulatedIndex`] | Handbook optical-constant data |
//!
//! ## Interpolation
//!
//! Tabulated data is interpolated with natural cubic splines
//! ([`spline::CubicSpline`]) so that $\hat{n}(\lambda)$ is smooth between
//! data points. Lookups outside the tabulated range are an error, never an
//! extrapolation.
//!
//! ## Registry
//!
//! Stacks refer to materials by name. A [`registry::MaterialRegistry`] maps
//! names to providers; it is built up front by the caller and treated as
//! read-only for the duration of a computation.

pub mod dispersion;
pub mod provider;
pub mod registry;
pub mod spline;

pub use dispersion::{ConstantIndex, TabulatedIndex};
pub use provider::{MaterialError, MaterialProvider};
pub use registry::MaterialRegistry;

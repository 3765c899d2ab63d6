//! Name → provider registry.
//!
//! Stacks reference materials by identifier. The registry is an explicit
//! value owned by the caller: built once at configuration time, passed by
//! shared reference into stack resolution, and never mutated while a sweep
//! is in flight (single-writer, stable-during-read; enforced by the
//! borrow checker for in-process callers).

use std::collections::BTreeMap;
use std::sync::Arc;

use num_complex::Complex64;

use crate::dispersion::{ConstantIndex, TabulatedIndex};
use crate::provider::{MaterialError, MaterialProvider};

/// Immutable-during-use lookup table of material providers.
#[derive(Default)]
pub struct MaterialRegistry {
    providers: BTreeMap<String, Arc<dyn MaterialProvider>>,
}

impl MaterialRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the built-in datasets:
    /// `Air`, `Glass_BK7`, `SiO2`, `TiO2`, `MgF2`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.insert(Arc::new(ConstantIndex::air()));
        registry.insert(Arc::new(ConstantIndex::bk7()));
        registry.insert(Arc::new(TabulatedIndex::sio2()));
        registry.insert(Arc::new(TabulatedIndex::tio2()));
        registry.insert(Arc::new(TabulatedIndex::mgf2()));
        registry
    }

    /// Register a provider under its own name, replacing any existing
    /// entry with the same name. Must not be called while a sweep reads
    /// the registry.
    pub fn insert(&mut self, provider: Arc<dyn MaterialProvider>) {
        self.providers.insert(provider.name().to_string(), provider);
    }

    /// Look up a provider by name.
    pub fn lookup(&self, name: &str) -> Result<&Arc<dyn MaterialProvider>, MaterialError> {
        self.providers
            .get(name)
            .ok_or_else(|| MaterialError::NotFound(name.to_string()))
    }

    /// Complex refractive index of a named material at a wavelength, with
    /// the passivity check ($n > 0$, $k \geq 0$) applied. A non-passive
    /// result is a configuration error, never silently clamped.
    pub fn index_of(&self, name: &str, wavelength_nm: f64) -> Result<Complex64, MaterialError> {
        let index = self.lookup(name)?.refractive_index(wavelength_nm)?;
        let (n, k) = (index.re, -index.im);
        if !(n > 0.0) || k < 0.0 || !n.is_finite() || !k.is_finite() {
            return Err(MaterialError::NotPassive {
                name: name.to_string(),
                wavelength_nm,
                n,
                k,
            });
        }
        Ok(index)
    }

    /// Registered material names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }
}

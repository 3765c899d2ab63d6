//! Stack model and shared configuration types.
//!
//! A [`Stack`] is an ordered sequence of [`Layer`]s between two
//! semi-infinite media, all referring to materials by name. These types are
//! plain values: they are cheap to clone into history snapshots and carry
//! no registry state of their own.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use lamella_materials::{MaterialError, MaterialRegistry};

/// Configuration errors. Surfaced synchronously before any sweep work
/// starts; a sweep is never partially executed on a bad configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Layer {index} ('{material}'): invalid thickness {thickness_nm} nm (must be finite and > 0)")]
    InvalidThickness {
        index: usize,
        material: String,
        thickness_nm: f64,
    },

    #[error("Malformed range: {0}")]
    MalformedRange(String),

    #[error("Invalid wavelength {0} nm (must be finite and > 0)")]
    InvalidWavelength(f64),

    #[error("Invalid angle of incidence {0}° (must lie in [0°, 90°))")]
    InvalidAngle(f64),

    #[error("QWOT stack: {0}")]
    Qwot(String),

    #[error(transparent)]
    Material(#[from] MaterialError),
}

/// One homogeneous film: a material reference plus a physical thickness.
///
/// The layer does not own its material: it names an entry in the caller's
/// [`MaterialRegistry`]. Thickness zero is not a layer; semi-infinite media
/// are represented by the stack's `incident`/`exit` fields instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    /// Material identifier, resolved against the registry at compute time.
    pub material: String,
    /// Physical thickness in nanometres (finite, > 0).
    pub thickness_nm: f64,
}

impl Layer {
    pub fn new(material: impl Into<String>, thickness_nm: f64) -> Self {
        Self {
            material: material.into(),
            thickness_nm,
        }
    }
}

/// A stratified stack: incident medium, ordered layers, exit medium.
///
/// Insertion order is physical order is propagation order: `layers[0]` is
/// adjacent to the incident medium. An empty layer list is a valid
/// degenerate stack (a bare interface between the two media).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stack {
    /// Semi-infinite incident medium (material name).
    pub incident: String,
    /// Film sequence, first layer nearest the incident medium.
    pub layers: Vec<Layer>,
    /// Semi-infinite exit medium (material name).
    pub exit: String,
}

impl Stack {
    /// Bare interface between two media.
    pub fn bare(incident: impl Into<String>, exit: impl Into<String>) -> Self {
        Self {
            incident: incident.into(),
            layers: Vec::new(),
            exit: exit.into(),
        }
    }

    pub fn with_layers(
        incident: impl Into<String>,
        layers: Vec<Layer>,
        exit: impl Into<String>,
    ) -> Self {
        Self {
            incident: incident.into(),
            layers,
            exit: exit.into(),
        }
    }

    /// Total physical thickness of the film sequence (nm).
    pub fn total_thickness_nm(&self) -> f64 {
        self.layers.iter().map(|l| l.thickness_nm).sum()
    }

    /// Fail-fast configuration check: every material registered and passive
    /// at the probe wavelength, every thickness finite and positive.
    ///
    /// A tabulated material whose data range excludes the probe wavelength
    /// is not fatal here; the affected samples are flagged individually
    /// during the sweep instead.
    pub fn validate(
        &self,
        registry: &MaterialRegistry,
        probe_wavelength_nm: f64,
    ) -> Result<(), ConfigError> {
        let probe = |name: &str| -> Result<(), ConfigError> {
            match registry.index_of(name, probe_wavelength_nm) {
                Ok(_) | Err(MaterialError::OutOfRange { .. }) => Ok(()),
                Err(e) => Err(e.into()),
            }
        };

        probe(&self.incident)?;
        probe(&self.exit)?;
        for (index, layer) in self.layers.iter().enumerate() {
            if !layer.thickness_nm.is_finite() || layer.thickness_nm <= 0.0 {
                return Err(ConfigError::InvalidThickness {
                    index,
                    material: layer.material.clone(),
                    thickness_nm: layer.thickness_nm,
                });
            }
            probe(&layer.material)?;
        }
        Ok(())
    }
}

/// A sampling range for the sweep engine: either a fixed number of points
/// or a fixed step, both inclusive of `start` and `stop`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RangeSpec {
    Count { start: f64, stop: f64, points: usize },
    Step { start: f64, stop: f64, step: f64 },
}

impl RangeSpec {
    pub fn start(&self) -> f64 {
        match self {
            RangeSpec::Count { start, .. } | RangeSpec::Step { start, .. } => *start,
        }
    }

    pub fn stop(&self) -> f64 {
        match self {
            RangeSpec::Count { stop, .. } | RangeSpec::Step { stop, .. } => *stop,
        }
    }

    /// Materialize the sample grid.
    ///
    /// Invariants: `stop >= start`, `points >= 1`, `step > 0`. A degenerate
    /// range (`start == stop` or `points == 1`) yields exactly `[start]`.
    pub fn grid(&self) -> Result<Vec<f64>, ConfigError> {
        let (start, stop) = (self.start(), self.stop());
        if !start.is_finite() || !stop.is_finite() || stop < start {
            return Err(ConfigError::MalformedRange(format!(
                "start={start}, stop={stop}: require finite values with stop >= start"
            )));
        }
        match *self {
            RangeSpec::Count { points, .. } => {
                if points == 0 {
                    return Err(ConfigError::MalformedRange(
                        "points must be >= 1".to_string(),
                    ));
                }
                if points == 1 || stop == start {
                    return Ok(vec![start]);
                }
                let span = stop - start;
                Ok((0..points)
                    .map(|i| start + span * i as f64 / (points - 1) as f64)
                    .collect())
            }
            RangeSpec::Step { step, .. } => {
                if !(step > 0.0) || !step.is_finite() {
                    return Err(ConfigError::MalformedRange(format!(
                        "step={step}: require a finite step > 0"
                    )));
                }
                // Inclusive of stop when it falls on the grid (within one
                // part in 1e9 of a step), never overshooting it.
                let count = ((stop - start) / step + 1e-9).floor() as usize + 1;
                Ok((0..count).map(|i| start + step * i as f64).collect())
            }
        }
    }
}

/// Which quantities the rendering/export collaborators should include.
///
/// Independent booleans; each toggles one curve/column with no interaction
/// between options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayOptions {
    #[serde(default = "default_true")]
    pub show_rs: bool,
    #[serde(default = "default_true")]
    pub show_rp: bool,
    #[serde(default = "default_true")]
    pub show_ts: bool,
    #[serde(default = "default_true")]
    pub show_tp: bool,
    #[serde(default)]
    pub show_average: bool,
}

fn default_true() -> bool {
    true
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            show_rs: true,
            show_rp: true,
            show_ts: true,
            show_tp: true,
            show_average: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_grid_endpoints_and_single_point() {
        let range = RangeSpec::Count {
            start: 400.0,
            stop: 700.0,
            points: 4,
        };
        assert_eq!(range.grid().unwrap(), vec![400.0, 500.0, 600.0, 700.0]);

        let single = RangeSpec::Count {
            start: 550.0,
            stop: 550.0,
            points: 1,
        };
        assert_eq!(single.grid().unwrap(), vec![550.0]);
    }

    #[test]
    fn step_grid_is_inclusive_without_overshoot() {
        let aligned = RangeSpec::Step {
            start: 0.0,
            stop: 10.0,
            step: 2.5,
        };
        assert_eq!(aligned.grid().unwrap(), vec![0.0, 2.5, 5.0, 7.5, 10.0]);

        let ragged = RangeSpec::Step {
            start: 0.0,
            stop: 10.0,
            step: 3.0,
        };
        // 12 would overshoot the stop; the grid ends at 9.
        assert_eq!(ragged.grid().unwrap(), vec![0.0, 3.0, 6.0, 9.0]);
    }

    #[test]
    fn malformed_ranges_are_rejected() {
        let backwards = RangeSpec::Count {
            start: 700.0,
            stop: 400.0,
            points: 10,
        };
        assert!(matches!(
            backwards.grid(),
            Err(ConfigError::MalformedRange(_))
        ));

        let zero_step = RangeSpec::Step {
            start: 0.0,
            stop: 10.0,
            step: 0.0,
        };
        assert!(matches!(
            zero_step.grid(),
            Err(ConfigError::MalformedRange(_))
        ));

        let no_points = RangeSpec::Count {
            start: 0.0,
            stop: 1.0,
            points: 0,
        };
        assert!(matches!(
            no_points.grid(),
            Err(ConfigError::MalformedRange(_))
        ));
    }

    #[test]
    fn stack_validation_catches_bad_thickness_and_unknown_material() {
        let registry = MaterialRegistry::with_builtins();

        let bad = Stack::with_layers("Air", vec![Layer::new("SiO2", -5.0)], "Glass_BK7");
        assert!(matches!(
            bad.validate(&registry, 550.0),
            Err(ConfigError::InvalidThickness { index: 0, .. })
        ));

        let unknown = Stack::bare("Air", "Adamantium");
        assert!(matches!(
            unknown.validate(&registry, 550.0),
            Err(ConfigError::Material(MaterialError::NotFound(_)))
        ));

        let fine = Stack::with_layers("Air", vec![Layer::new("MgF2", 100.0)], "Glass_BK7");
        assert!(fine.validate(&registry, 550.0).is_ok());
    }
}

//! TOML configuration deserialisation for sweep jobs.

use serde::Deserialize;

use lamella_core::types::{DisplayOptions, RangeSpec};

/// Top-level job configuration.
#[derive(Debug, Deserialize)]
pub struct JobConfig {
    pub stack: StackConfig,
    pub sweep: SweepConfig,
    /// Custom constant-index materials, added on top of the built-ins.
    #[serde(default)]
    pub material: Vec<MaterialConfig>,
    #[serde(default)]
    pub options: OptionsConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Stack definition: either explicit layers or a QWOT design, not both.
#[derive(Debug, Deserialize)]
pub struct StackConfig {
    /// Incident (ambient) medium material name.
    pub incident: String,
    /// Exit (substrate) medium material name.
    pub exit: String,
    /// Explicit layer list, first layer nearest the incident medium.
    #[serde(default)]
    pub layers: Vec<LayerConfig>,
    /// Quarter-wave design, alternative to `layers`.
    pub qwot: Option<QwotConfig>,
}

#[derive(Debug, Deserialize)]
pub struct LayerConfig {
    pub material: String,
    pub thickness_nm: f64,
}

/// Quarter-wave stack notation, e.g. `sequence = "1,2,1"`.
#[derive(Debug, Deserialize)]
pub struct QwotConfig {
    /// Comma-separated QWOT factors, alternating high/low starting high.
    pub sequence: String,
    /// High-index material name.
    pub high: String,
    /// Low-index material name.
    pub low: String,
    /// Reference (design) wavelength in nm.
    pub reference_wavelength_nm: f64,
    /// Design angle of incidence in degrees (default 0).
    #[serde(default)]
    pub design_angle_deg: f64,
}

/// A custom constant-index material.
#[derive(Debug, Deserialize)]
pub struct MaterialConfig {
    pub name: String,
    pub n: f64,
    #[serde(default)]
    pub k: f64,
}

/// Which sweeps to run. At least one must be present.
#[derive(Debug, Deserialize)]
pub struct SweepConfig {
    pub spectral: Option<SpectralConfig>,
    pub angular: Option<AngularConfig>,
}

/// Wavelength sweep at a fixed angle.
#[derive(Debug, Deserialize)]
pub struct SpectralConfig {
    /// Wavelength range (nm): `{ start, stop, points }` or
    /// `{ start, stop, step }`.
    pub range: RangeSpec,
    /// Fixed angle of incidence in degrees (default 0).
    #[serde(default)]
    pub angle_deg: f64,
}

/// Angle sweep at a fixed wavelength.
#[derive(Debug, Deserialize)]
pub struct AngularConfig {
    /// Angle range (degrees): `{ start, stop, points }` or
    /// `{ start, stop, step }`.
    pub range: RangeSpec,
    /// Fixed wavelength in nm.
    pub wavelength_nm: f64,
}

/// Evaluation options.
#[derive(Debug, Deserialize)]
pub struct OptionsConfig {
    /// Evaluate samples across the Rayon thread pool (default: true).
    #[serde(default = "default_true")]
    pub parallel: bool,
    /// Treat the exit medium as a thick incoherent plate (default: false).
    #[serde(default)]
    pub finite_substrate: bool,
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            finite_substrate: false,
        }
    }
}

/// Output configuration.
#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    /// Output directory (default: "./output").
    #[serde(default = "default_output_dir")]
    pub directory: String,
    /// Whether to save sweep tables as CSV (default: true).
    #[serde(default = "default_true")]
    pub save_csv: bool,
    /// Whether to also save results as JSON (default: false).
    #[serde(default)]
    pub save_json: bool,
    /// Whether to save the refractive-index depth profile (default: true).
    #[serde(default = "default_true")]
    pub save_profile: bool,
    /// Wavelength at which the depth profile is taken; defaults to the
    /// angular sweep's wavelength, else the spectral range midpoint.
    pub profile_wavelength_nm: Option<f64>,
    /// Column/curve toggles for the exported tables.
    #[serde(default)]
    pub display: DisplayOptions,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            save_csv: true,
            save_json: false,
            save_profile: true,
            profile_wavelength_nm: None,
            display: DisplayOptions::default(),
        }
    }
}

fn default_output_dir() -> String {
    "./output".into()
}

fn default_true() -> bool {
    true
}

/// Load and parse a TOML job configuration file.
pub fn load_config(path: &std::path::Path) -> anyhow::Result<JobConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: JobConfig = toml::from_str(&content)?;
    Ok(config)
}

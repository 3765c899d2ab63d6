//! Quarter-wave optical thickness (QWOT) stack builder.
//!
//! Coating designs are usually written as a sequence of quarter-wave
//! factors at a reference wavelength, alternating between a high- and a
//! low-index material ("1,2,1" = quarter, half, quarter wave). This module
//! parses that notation and converts it to physical thicknesses, with the
//! quarter-wave condition evaluated at the design angle of incidence.

use lamella_materials::MaterialRegistry;

use crate::types::{ConfigError, Layer, Stack};

/// Parse a comma-separated QWOT factor list.
///
/// Blank entries are skipped; negative factors are rejected. An empty or
/// all-blank string is a valid empty sequence.
pub fn parse_qwot_factors(text: &str) -> Result<Vec<f64>, ConfigError> {
    let mut factors = Vec::new();
    for (position, part) in text.split(',').enumerate() {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let value: f64 = part.parse().map_err(|_| {
            ConfigError::Qwot(format!("invalid factor at position {}: '{part}'", position + 1))
        })?;
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigError::Qwot(format!(
                "factor at position {} must be finite and >= 0, got {value}",
                position + 1
            )));
        }
        factors.push(value);
    }
    Ok(factors)
}

/// Build an alternating high/low stack from QWOT factors.
///
/// Factor `i` uses `high` for even `i`, `low` for odd `i`; its physical
/// thickness is $f \lambda_0 / (4 n \cos\theta_i)$ where $\theta_i$ is the
/// design angle refracted into the layer. Zero factors keep their parity
/// slot but produce no layer. Errors when the design angle reaches a
/// layer's critical angle, where no quarter-wave thickness exists.
#[allow(clippy::too_many_arguments)]
pub fn qwot_stack(
    registry: &MaterialRegistry,
    incident: &str,
    high: &str,
    low: &str,
    exit: &str,
    factors: &[f64],
    reference_wavelength_nm: f64,
    design_angle_deg: f64,
) -> Result<Stack, ConfigError> {
    if !reference_wavelength_nm.is_finite() || reference_wavelength_nm <= 0.0 {
        return Err(ConfigError::InvalidWavelength(reference_wavelength_nm));
    }
    if !design_angle_deg.is_finite() || !(0.0..90.0).contains(&design_angle_deg) {
        return Err(ConfigError::InvalidAngle(design_angle_deg));
    }

    let n_incident = registry.index_of(incident, reference_wavelength_nm)?.re;
    // Real-index Snell invariant at the design condition.
    let snell = n_incident * design_angle_deg.to_radians().sin();

    let mut layers = Vec::with_capacity(factors.len());
    for (i, &factor) in factors.iter().enumerate() {
        let material = if i % 2 == 0 { high } else { low };
        if factor == 0.0 {
            continue;
        }
        let n = registry.index_of(material, reference_wavelength_nm)?.re;
        let cos_sq = 1.0 - (snell / n).powi(2);
        if cos_sq <= 1e-12 {
            return Err(ConfigError::Qwot(format!(
                "layer {} ('{material}'): design angle {design_angle_deg}° is at or beyond \
                 the critical angle, no quarter-wave thickness exists",
                i + 1
            )));
        }
        let thickness_nm = factor * reference_wavelength_nm / (4.0 * n * cos_sq.sqrt());
        layers.push(Layer::new(material, thickness_nm));
    }

    Ok(Stack::with_layers(incident, layers, exit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use lamella_materials::ConstantIndex;

    fn registry() -> MaterialRegistry {
        let mut registry = MaterialRegistry::with_builtins();
        registry.insert(Arc::new(ConstantIndex::new("H", 2.35, 0.0)));
        registry.insert(Arc::new(ConstantIndex::new("L", 1.48, 0.0)));
        registry
    }

    #[test]
    fn parses_factor_lists_leniently() {
        assert_eq!(parse_qwot_factors("1, 2 ,1").unwrap(), vec![1.0, 2.0, 1.0]);
        assert_eq!(parse_qwot_factors("1,,0.5,").unwrap(), vec![1.0, 0.5]);
        assert_eq!(parse_qwot_factors("   ").unwrap(), Vec::<f64>::new());
        assert!(parse_qwot_factors("1,-2").is_err());
        assert!(parse_qwot_factors("1,abc").is_err());
    }

    #[test]
    fn normal_incidence_thickness_is_quarter_wave() {
        let registry = registry();
        let stack = qwot_stack(
            &registry, "Air", "H", "L", "Glass_BK7", &[1.0, 1.0], 550.0, 0.0,
        )
        .unwrap();

        assert_eq!(stack.layers.len(), 2);
        assert_eq!(stack.layers[0].material, "H");
        assert_eq!(stack.layers[1].material, "L");
        assert!((stack.layers[0].thickness_nm - 550.0 / (4.0 * 2.35)).abs() < 1e-12);
        assert!((stack.layers[1].thickness_nm - 550.0 / (4.0 * 1.48)).abs() < 1e-12);
    }

    #[test]
    fn oblique_design_angle_thickens_the_layers() {
        let registry = registry();
        let normal = qwot_stack(
            &registry, "Air", "H", "L", "Glass_BK7", &[1.0], 550.0, 0.0,
        )
        .unwrap();
        let oblique = qwot_stack(
            &registry, "Air", "H", "L", "Glass_BK7", &[1.0], 550.0, 45.0,
        )
        .unwrap();
        assert!(oblique.layers[0].thickness_nm > normal.layers[0].thickness_nm);
    }

    #[test]
    fn zero_factors_skip_their_slot_but_keep_parity() {
        let registry = registry();
        let stack = qwot_stack(
            &registry, "Air", "H", "L", "Glass_BK7", &[1.0, 0.0, 1.0], 550.0, 0.0,
        )
        .unwrap();
        // Both remaining layers sit on even (high-index) parity slots.
        assert_eq!(stack.layers.len(), 2);
        assert!(stack.layers.iter().all(|l| l.material == "H"));
    }

    #[test]
    fn design_angle_past_critical_angle_is_rejected() {
        let mut registry = registry();
        registry.insert(Arc::new(ConstantIndex::new("Dense", 2.0, 0.0)));
        registry.insert(Arc::new(ConstantIndex::new("Thin", 1.1, 0.0)));
        // From a dense incident medium at 80°, the Snell invariant exceeds
        // the low index: 2.0·sin80° ≈ 1.97 > 1.1.
        let result = qwot_stack(
            &registry, "Dense", "Thin", "L", "Glass_BK7", &[1.0], 550.0, 80.0,
        );
        assert!(matches!(result, Err(ConfigError::Qwot(_))));
    }
}

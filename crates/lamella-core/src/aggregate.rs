//! Result post-processing: summary scalars, depth profile, export tables.
//!
//! No physics happens here: this module reshapes sweep output into the
//! structures the plotting and export collaborators consume, and owns the
//! numerical edge-case normalization (flagged samples are skipped, an
//! all-flagged sweep yields an empty summary).

use serde::Serialize;

use lamella_materials::MaterialRegistry;

use crate::sweep::SweepResult;
use crate::types::{ConfigError, DisplayOptions, Stack};

/// Summary scalars over one sweep.
///
/// Averages are unweighted arithmetic means over the valid (non-flagged)
/// samples; no wavelength weighting is applied. Fields are `None` when no
/// valid sample exists.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub mean_rs: Option<f64>,
    pub mean_rp: Option<f64>,
    pub mean_ts: Option<f64>,
    pub mean_tp: Option<f64>,
    /// Mean of (Rs + Rp)/2 over valid samples.
    pub mean_r: Option<f64>,
    /// Mean of (Ts + Tp)/2 over valid samples.
    pub mean_t: Option<f64>,
    /// Largest |Rs − Rp| over the grid.
    pub polarization_contrast: Option<f64>,
    /// (grid value, level) of the maximum of (Rs + Rp)/2.
    pub peak_r: Option<(f64, f64)>,
    /// (grid value, level) of the minimum of (Rs + Rp)/2.
    pub trough_r: Option<(f64, f64)>,
}

/// Compute summary scalars for one sweep, skipping flagged samples.
pub fn summarize(result: &SweepResult) -> Summary {
    let mut summary = Summary {
        mean_rs: None,
        mean_rp: None,
        mean_ts: None,
        mean_tp: None,
        mean_r: None,
        mean_t: None,
        polarization_contrast: None,
        peak_r: None,
        trough_r: None,
    };

    let mut count = 0usize;
    let mut sums = [0.0f64; 4];
    let mut contrast = 0.0f64;

    for i in 0..result.len() {
        if result.is_flagged(i) {
            continue;
        }
        count += 1;
        sums[0] += result.rs[i];
        sums[1] += result.rp[i];
        sums[2] += result.ts[i];
        sums[3] += result.tp[i];
        contrast = contrast.max((result.rs[i] - result.rp[i]).abs());

        let r_mean = 0.5 * (result.rs[i] + result.rp[i]);
        let x = result.grid[i];
        match summary.peak_r {
            Some((_, level)) if level >= r_mean => {}
            _ => summary.peak_r = Some((x, r_mean)),
        }
        match summary.trough_r {
            Some((_, level)) if level <= r_mean => {}
            _ => summary.trough_r = Some((x, r_mean)),
        }
    }

    if count > 0 {
        let n = count as f64;
        summary.mean_rs = Some(sums[0] / n);
        summary.mean_rp = Some(sums[1] / n);
        summary.mean_ts = Some(sums[2] / n);
        summary.mean_tp = Some(sums[3] / n);
        summary.mean_r = Some(0.5 * (sums[0] + sums[1]) / n);
        summary.mean_t = Some(0.5 * (sums[2] + sums[3]) / n);
        summary.polarization_contrast = Some(contrast);
    }
    summary
}

/// One breakpoint of the piecewise-constant refractive-index depth profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProfilePoint {
    /// Cumulative depth from the first interface (nm); negative values lie
    /// in the incident medium.
    pub depth_nm: f64,
    /// Real part of the refractive index at this depth.
    pub index: f64,
}

/// Margin drawn into each semi-infinite medium on either side of the films.
const PROFILE_MARGIN_NM: f64 = 50.0;

/// Real-index depth profile of a stack, as step breakpoints suited to a
/// line plot: a margin of incident medium, two points per layer face, and
/// a margin of exit medium.
///
/// Pure transformation of the layer sequence, no physics.
pub fn index_profile(
    stack: &Stack,
    registry: &MaterialRegistry,
    wavelength_nm: f64,
) -> Result<Vec<ProfilePoint>, ConfigError> {
    let n_in = registry.index_of(&stack.incident, wavelength_nm)?.re;
    let n_out = registry.index_of(&stack.exit, wavelength_nm)?.re;

    let mut points = Vec::with_capacity(2 * stack.layers.len() + 4);
    points.push(ProfilePoint {
        depth_nm: -PROFILE_MARGIN_NM,
        index: n_in,
    });
    points.push(ProfilePoint {
        depth_nm: 0.0,
        index: n_in,
    });

    let mut depth = 0.0;
    for layer in &stack.layers {
        let n = registry.index_of(&layer.material, wavelength_nm)?.re;
        points.push(ProfilePoint { depth_nm: depth, index: n });
        depth += layer.thickness_nm;
        points.push(ProfilePoint { depth_nm: depth, index: n });
    }

    points.push(ProfilePoint {
        depth_nm: depth,
        index: n_out,
    });
    points.push(ProfilePoint {
        depth_nm: depth + PROFILE_MARGIN_NM,
        index: n_out,
    });
    Ok(points)
}

/// Flat export table: one row per sample, one column per enabled quantity.
#[derive(Debug, Clone, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

/// Build the export table for one sweep.
///
/// Column order: independent variable, Rs, Rp, Ts, Tp, then R_avg/T_avg
/// when `show_average` is set. Disabled quantities omit their column.
/// Flagged samples export as NaN so gaps stay visible downstream.
pub fn table(result: &SweepResult, options: &DisplayOptions) -> Table {
    let independent = match result.axis {
        crate::sweep::SweepAxis::Spectral { .. } => "wavelength_nm",
        crate::sweep::SweepAxis::Angular { .. } => "angle_deg",
    };

    let mut columns = vec![independent.to_string()];
    if options.show_rs {
        columns.push("Rs".to_string());
    }
    if options.show_rp {
        columns.push("Rp".to_string());
    }
    if options.show_ts {
        columns.push("Ts".to_string());
    }
    if options.show_tp {
        columns.push("Tp".to_string());
    }
    if options.show_average {
        columns.push("R_avg".to_string());
        columns.push("T_avg".to_string());
    }

    let rows = (0..result.len())
        .map(|i| {
            let mut row = vec![result.grid[i]];
            if options.show_rs {
                row.push(result.rs[i]);
            }
            if options.show_rp {
                row.push(result.rp[i]);
            }
            if options.show_ts {
                row.push(result.ts[i]);
            }
            if options.show_tp {
                row.push(result.tp[i]);
            }
            if options.show_average {
                row.push(0.5 * (result.rs[i] + result.rp[i]));
                row.push(0.5 * (result.ts[i] + result.tp[i]));
            }
            row
        })
        .collect();

    Table { columns, rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sweep::SweepAxis;
    use crate::types::Layer;

    fn fake_result() -> SweepResult {
        SweepResult {
            axis: SweepAxis::Spectral { angle_deg: 0.0 },
            grid: vec![400.0, 500.0, 600.0],
            rs: vec![0.1, f64::NAN, 0.3],
            rp: vec![0.2, f64::NAN, 0.2],
            ts: vec![0.9, f64::NAN, 0.7],
            tp: vec![0.8, f64::NAN, 0.8],
            flagged: 1,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn summary_skips_flagged_samples() {
        let summary = summarize(&fake_result());
        assert_eq!(summary.mean_rs, Some(0.2));
        assert_eq!(summary.mean_tp, Some(0.8));
        assert_eq!(summary.mean_r, Some(0.2));
        // |Rs − Rp| is 0.1 at both valid samples.
        assert!((summary.polarization_contrast.unwrap() - 0.1).abs() < 1e-15);
        assert_eq!(summary.peak_r, Some((600.0, 0.25)));
        assert_eq!(summary.trough_r, Some((400.0, 0.15)));
    }

    #[test]
    fn all_flagged_sweep_summarizes_to_none() {
        let mut result = fake_result();
        for channel in [&mut result.rs, &mut result.rp, &mut result.ts, &mut result.tp] {
            channel.fill(f64::NAN);
        }
        result.flagged = result.grid.len();

        let summary = summarize(&result);
        assert_eq!(summary.mean_rs, None);
        assert_eq!(summary.peak_r, None);
    }

    #[test]
    fn profile_steps_through_the_stack() {
        let registry = MaterialRegistry::with_builtins();
        let stack = Stack::with_layers(
            "Air",
            vec![Layer::new("TiO2", 60.0), Layer::new("SiO2", 90.0)],
            "Glass_BK7",
        );

        let profile = index_profile(&stack, &registry, 550.0).unwrap();
        assert_eq!(profile.len(), 8);
        assert_eq!(profile[0].depth_nm, -50.0);
        assert_eq!(profile[0].index, 1.0);
        // TiO2 plateau spans [0, 60].
        assert_eq!(profile[2].depth_nm, 0.0);
        assert_eq!(profile[3].depth_nm, 60.0);
        assert!((profile[2].index - 2.39).abs() < 1e-9);
        // Exit margin ends 50 nm past the films at the substrate index.
        assert_eq!(profile[7].depth_nm, 200.0);
        assert_eq!(profile[7].index, 1.52);
    }

    #[test]
    fn table_honours_display_options_and_column_order() {
        let options = DisplayOptions {
            show_rs: true,
            show_rp: false,
            show_ts: false,
            show_tp: true,
            show_average: true,
        };
        let table = table(&fake_result(), &options);
        assert_eq!(
            table.columns,
            vec!["wavelength_nm", "Rs", "Tp", "R_avg", "T_avg"]
        );
        assert_eq!(table.rows.len(), 3);
        let row = &table.rows[0];
        assert_eq!(row[0], 400.0);
        assert_eq!(row[1], 0.1);
        assert_eq!(row[2], 0.8);
        assert!((row[3] - 0.15).abs() < 1e-12);
        assert!((row[4] - 0.85).abs() < 1e-12);
    }
}

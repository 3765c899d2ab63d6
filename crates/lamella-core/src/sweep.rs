//! Sweep engine: drives the solver across wavelength and angle grids.
//!
//! Every sample is a pure function of (stack, λ, θ), so grids are evaluated
//! in parallel with Rayon when requested, or sequentially with identical
//! results. Configuration errors fail fast before any sample runs; a
//! numeric failure in one sample is recorded as a NaN-flagged row and never
//! aborts the rest of the grid.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;

use lamella_materials::MaterialRegistry;

use crate::solver::{Amplitudes, Polarization, ResolvedStack, StackSolver};
use crate::types::{ConfigError, RangeSpec, Stack};

/// Tolerance on the per-polarization energy check R + T ≤ 1 + ε.
pub const ENERGY_TOLERANCE: f64 = 1e-6;

/// Which independent variable a sweep ran over, with the fixed companion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum SweepAxis {
    /// Wavelength sweep at a fixed angle of incidence.
    Spectral { angle_deg: f64 },
    /// Angle sweep at a fixed wavelength.
    Angular { wavelength_nm: f64 },
}

/// Cooperative cancellation flag, checked once per sample.
///
/// Cancelling mid-sweep leaves already-computed entries in place and flags
/// the remainder; the partial result stays usable.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Evaluation options for a sweep.
#[derive(Debug, Clone)]
pub struct SweepOptions {
    /// Evaluate samples across the Rayon thread pool. Sequential and
    /// parallel evaluation produce identical values.
    pub parallel: bool,
    /// Treat the exit medium as a thick incoherent plate in the incident
    /// ambient and fold its backside reflection into R and T.
    pub finite_substrate: bool,
    pub cancel: CancelToken,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            finite_substrate: false,
            cancel: CancelToken::new(),
        }
    }
}

/// Power fractions over one sweep grid. Immutable once produced; a new
/// request produces a new result rather than mutating this one.
///
/// Flagged samples hold NaN in all four channels.
#[derive(Debug, Clone, Serialize)]
pub struct SweepResult {
    pub axis: SweepAxis,
    /// Independent-variable grid (nm or degrees, per `axis`).
    pub grid: Vec<f64>,
    pub rs: Vec<f64>,
    pub rp: Vec<f64>,
    pub ts: Vec<f64>,
    pub tp: Vec<f64>,
    /// Number of flagged (NaN) samples.
    pub flagged: usize,
    /// Energy-conservation and per-sample anomaly annotations. Warnings,
    /// never hard failures.
    pub warnings: Vec<String>,
}

impl SweepResult {
    pub fn len(&self) -> usize {
        self.grid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }

    /// Whether sample `i` failed and holds NaN.
    pub fn is_flagged(&self, i: usize) -> bool {
        self.rs[i].is_nan()
    }

    /// Number of successfully computed samples.
    pub fn valid_len(&self) -> usize {
        self.len() - self.flagged
    }
}

/// One evaluated grid row.
struct Row {
    rs: f64,
    rp: f64,
    ts: f64,
    tp: f64,
    warning: Option<String>,
}

impl Row {
    fn flagged(warning: Option<String>) -> Self {
        Self {
            rs: f64::NAN,
            rp: f64::NAN,
            ts: f64::NAN,
            tp: f64::NAN,
            warning,
        }
    }
}

/// Sweep wavelength at a fixed angle of incidence.
pub fn sweep_wavelength(
    solver: &dyn StackSolver,
    registry: &MaterialRegistry,
    stack: &Stack,
    range: &RangeSpec,
    angle_deg: f64,
    opts: &SweepOptions,
) -> Result<SweepResult, ConfigError> {
    if !angle_deg.is_finite() || !(0.0..90.0).contains(&angle_deg) {
        return Err(ConfigError::InvalidAngle(angle_deg));
    }
    let grid = range.grid()?;
    if let Some(&bad) = grid.iter().find(|w| !(**w > 0.0)) {
        return Err(ConfigError::InvalidWavelength(bad));
    }
    // Probe both grid endpoints so a material that loses passivity inside
    // the sweep window fails fast instead of flagging rows one by one.
    stack.validate(registry, grid[0])?;
    stack.validate(registry, grid[grid.len() - 1])?;

    let points: Vec<(f64, f64)> = grid.iter().map(|&w| (w, angle_deg)).collect();
    let rows = evaluate(solver, registry, stack, &points, opts);
    Ok(assemble(SweepAxis::Spectral { angle_deg }, grid, rows))
}

/// Sweep angle of incidence at a fixed wavelength.
pub fn sweep_angle(
    solver: &dyn StackSolver,
    registry: &MaterialRegistry,
    stack: &Stack,
    range: &RangeSpec,
    wavelength_nm: f64,
    opts: &SweepOptions,
) -> Result<SweepResult, ConfigError> {
    if !wavelength_nm.is_finite() || wavelength_nm <= 0.0 {
        return Err(ConfigError::InvalidWavelength(wavelength_nm));
    }
    let grid = range.grid()?;
    if let Some(&bad) = grid
        .iter()
        .find(|a| !a.is_finite() || !(0.0..90.0).contains(*a))
    {
        return Err(ConfigError::InvalidAngle(bad));
    }
    stack.validate(registry, wavelength_nm)?;

    let points: Vec<(f64, f64)> = grid.iter().map(|&a| (wavelength_nm, a)).collect();
    let rows = evaluate(solver, registry, stack, &points, opts);
    Ok(assemble(SweepAxis::Angular { wavelength_nm }, grid, rows))
}

fn evaluate(
    solver: &dyn StackSolver,
    registry: &MaterialRegistry,
    stack: &Stack,
    points: &[(f64, f64)],
    opts: &SweepOptions,
) -> Vec<Row> {
    let eval = |&(wavelength_nm, angle_deg): &(f64, f64)| -> Row {
        if opts.cancel.is_cancelled() {
            return Row::flagged(None);
        }
        compute_row(
            solver,
            registry,
            stack,
            wavelength_nm,
            angle_deg,
            opts.finite_substrate,
        )
    };

    if opts.parallel {
        points.par_iter().map(eval).collect()
    } else {
        points.iter().map(eval).collect()
    }
}

/// Evaluate both polarizations at one sample point.
///
/// Any failure (resolution, solver, non-finite arithmetic) flags the whole
/// row: partial rows would misalign the polarization channels.
fn compute_row(
    solver: &dyn StackSolver,
    registry: &MaterialRegistry,
    stack: &Stack,
    wavelength_nm: f64,
    angle_deg: f64,
    finite_substrate: bool,
) -> Row {
    let resolved = match ResolvedStack::resolve(stack, registry, wavelength_nm) {
        Ok(resolved) => resolved,
        Err(e) => {
            let warning = format!("Sample λ={wavelength_nm} nm, θ={angle_deg}°: {e}");
            log::warn!("{warning}");
            return Row::flagged(Some(warning));
        }
    };

    let s = solver.amplitudes(&resolved, wavelength_nm, angle_deg, Polarization::S);
    let p = solver.amplitudes(&resolved, wavelength_nm, angle_deg, Polarization::P);
    let (s, p) = match (s, p) {
        (Ok(s), Ok(p)) => (s, p),
        (Err(e), _) | (_, Err(e)) => {
            let warning = format!("Sample λ={wavelength_nm} nm, θ={angle_deg}°: {e}");
            log::warn!("{warning}");
            return Row::flagged(Some(warning));
        }
    };

    let (rs, ts) = power_pair(&s, finite_substrate);
    let (rp, tp) = power_pair(&p, finite_substrate);

    let mut warning = None;
    for (label, r, t) in [("s", rs, ts), ("p", rp, tp)] {
        if r + t > 1.0 + ENERGY_TOLERANCE {
            let text = format!(
                "Energy check: R{label}+T{label} = {:.9} > 1 at λ={wavelength_nm} nm, θ={angle_deg}°",
                r + t
            );
            log::warn!("{text}");
            warning.get_or_insert(text);
        }
    }

    Row {
        rs: rs.clamp(0.0, 1.0),
        rp: rp.clamp(0.0, 1.0),
        ts: ts.clamp(0.0, 1.0),
        tp: tp.clamp(0.0, 1.0),
        warning,
    }
}

/// (R, T) for one polarization, with the optional incoherent backside
/// correction for a finite substrate.
fn power_pair(amplitudes: &Amplitudes, finite_substrate: bool) -> (f64, f64) {
    let r = amplitudes.reflectance();
    let t = amplitudes.transmittance();
    if !finite_substrate {
        return (r, t);
    }

    // Backside reflectance of the exit-medium/ambient interface, then the
    // incoherent geometric series of internal bounces.
    let denominator_rb = amplitudes.eta_out + amplitudes.eta_in;
    if denominator_rb.norm_sqr() == 0.0 || !denominator_rb.is_finite() {
        return (r, t);
    }
    let rb = ((amplitudes.eta_out - amplitudes.eta_in) / denominator_rb).norm_sqr();
    let denominator = 1.0 - r * rb;
    if denominator == 0.0 || !denominator.is_finite() {
        return (r, t);
    }
    (r + t * t * rb / denominator, t * (1.0 - rb) / denominator)
}

fn assemble(axis: SweepAxis, grid: Vec<f64>, rows: Vec<Row>) -> SweepResult {
    let mut result = SweepResult {
        axis,
        grid,
        rs: Vec::with_capacity(rows.len()),
        rp: Vec::with_capacity(rows.len()),
        ts: Vec::with_capacity(rows.len()),
        tp: Vec::with_capacity(rows.len()),
        flagged: 0,
        warnings: Vec::new(),
    };
    for row in rows {
        if row.rs.is_nan() {
            result.flagged += 1;
        }
        result.rs.push(row.rs);
        result.rp.push(row.rp);
        result.ts.push(row.ts);
        result.tp.push(row.tp);
        if let Some(warning) = row.warning {
            result.warnings.push(warning);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::{Amplitudes, SolverError, TransferMatrixSolver};
    use crate::types::Layer;
    use std::sync::atomic::AtomicUsize;

    fn sequential() -> SweepOptions {
        SweepOptions {
            parallel: false,
            ..Default::default()
        }
    }

    fn ar_stack() -> Stack {
        Stack::with_layers("Air", vec![Layer::new("MgF2", 99.6)], "Glass_BK7")
    }

    #[test]
    fn single_point_sweep_matches_direct_solver_call() {
        let registry = MaterialRegistry::with_builtins();
        let solver = TransferMatrixSolver;
        let stack = ar_stack();
        let range = RangeSpec::Count {
            start: 550.0,
            stop: 550.0,
            points: 1,
        };

        let result =
            sweep_wavelength(&solver, &registry, &stack, &range, 0.0, &sequential()).unwrap();
        assert_eq!(result.len(), 1);

        let resolved = ResolvedStack::resolve(&stack, &registry, 550.0).unwrap();
        let direct = solver
            .amplitudes(&resolved, 550.0, 0.0, Polarization::S)
            .unwrap();
        assert_eq!(result.rs[0], direct.reflectance());
        assert_eq!(result.ts[0], direct.transmittance());
    }

    #[test]
    fn parallel_and_sequential_agree_bitwise() {
        let registry = MaterialRegistry::with_builtins();
        let solver = TransferMatrixSolver;
        let stack = ar_stack();
        let range = RangeSpec::Count {
            start: 400.0,
            stop: 700.0,
            points: 31,
        };

        let seq =
            sweep_wavelength(&solver, &registry, &stack, &range, 30.0, &sequential()).unwrap();
        let par = sweep_wavelength(
            &solver,
            &registry,
            &stack,
            &range,
            30.0,
            &SweepOptions::default(),
        )
        .unwrap();
        assert_eq!(seq.rs, par.rs);
        assert_eq!(seq.tp, par.tp);
    }

    #[test]
    fn configuration_errors_fail_before_any_sample() {
        let registry = MaterialRegistry::with_builtins();
        let solver = TransferMatrixSolver;
        let stack = Stack::bare("Air", "Nonexistium");
        let range = RangeSpec::Count {
            start: 400.0,
            stop: 700.0,
            points: 10,
        };

        assert!(sweep_wavelength(&solver, &registry, &stack, &range, 0.0, &sequential()).is_err());

        let bad_angle = sweep_wavelength(
            &solver,
            &registry,
            &ar_stack(),
            &range,
            95.0,
            &sequential(),
        );
        assert!(matches!(bad_angle, Err(ConfigError::InvalidAngle(_))));
    }

    #[test]
    fn passivity_loss_inside_the_sweep_window_fails_fast() {
        use lamella_materials::{MaterialError, TabulatedIndex};
        use std::sync::Arc;

        let mut registry = MaterialRegistry::with_builtins();
        // k turns negative at the top of the table.
        registry.insert(Arc::new(TabulatedIndex::new(
            "Doped",
            vec![400.0, 500.0, 600.0],
            vec![2.0, 2.0, 2.0],
            vec![0.0, 0.0, -0.05],
        )));
        let solver = TransferMatrixSolver;
        let stack = Stack::with_layers("Air", vec![Layer::new("Doped", 70.0)], "Glass_BK7");
        let range = RangeSpec::Count {
            start: 400.0,
            stop: 600.0,
            points: 21,
        };

        let result = sweep_wavelength(&solver, &registry, &stack, &range, 0.0, &sequential());
        assert!(matches!(
            result,
            Err(ConfigError::Material(MaterialError::NotPassive { .. }))
        ));
    }

    #[test]
    fn out_of_table_wavelengths_are_flagged_not_fatal() {
        let registry = MaterialRegistry::with_builtins();
        let solver = TransferMatrixSolver;
        // TiO2 table starts at 350 nm; the first samples fall below it.
        let stack = Stack::with_layers("Air", vec![Layer::new("TiO2", 60.0)], "Glass_BK7");
        let range = RangeSpec::Step {
            start: 340.0,
            stop: 360.0,
            step: 5.0,
        };

        let result =
            sweep_wavelength(&solver, &registry, &stack, &range, 0.0, &sequential()).unwrap();
        assert_eq!(result.len(), 5);
        assert!(result.is_flagged(0) && result.is_flagged(1));
        assert!(!result.is_flagged(2) && !result.is_flagged(4));
        assert_eq!(result.flagged, 2);
        assert!(!result.warnings.is_empty());
    }

    /// Delegating solver that trips a cancel token after a fixed number of
    /// calls, so interruption lands at a deterministic sample.
    struct CancelAfter {
        inner: TransferMatrixSolver,
        token: CancelToken,
        calls_left: AtomicUsize,
    }

    impl StackSolver for CancelAfter {
        fn amplitudes(
            &self,
            stack: &ResolvedStack,
            wavelength_nm: f64,
            angle_deg: f64,
            pol: Polarization,
        ) -> Result<Amplitudes, SolverError> {
            if self.calls_left.fetch_sub(1, Ordering::SeqCst) <= 1 {
                self.token.cancel();
            }
            self.inner.amplitudes(stack, wavelength_nm, angle_deg, pol)
        }

        fn method_name(&self) -> &str {
            self.inner.method_name()
        }
    }

    #[test]
    fn cancellation_keeps_a_valid_ordered_prefix() {
        let registry = MaterialRegistry::with_builtins();
        let token = CancelToken::new();
        // 2 solver calls per sample; cancel lands after the 3rd sample.
        let solver = CancelAfter {
            inner: TransferMatrixSolver,
            token: token.clone(),
            calls_left: AtomicUsize::new(6),
        };
        let opts = SweepOptions {
            parallel: false,
            finite_substrate: false,
            cancel: token,
        };
        let range = RangeSpec::Count {
            start: 400.0,
            stop: 700.0,
            points: 10,
        };

        let result =
            sweep_wavelength(&solver, &registry, &ar_stack(), &range, 0.0, &opts).unwrap();
        assert_eq!(result.valid_len(), 3);
        assert_eq!(result.flagged, 7);
        for i in 0..result.len() {
            assert_eq!(result.is_flagged(i), i >= 3, "sample {i}");
        }
    }

    #[test]
    fn cancel_before_start_flags_everything() {
        let registry = MaterialRegistry::with_builtins();
        let solver = TransferMatrixSolver;
        let opts = sequential();
        opts.cancel.cancel();
        let range = RangeSpec::Count {
            start: 400.0,
            stop: 700.0,
            points: 7,
        };

        let result =
            sweep_wavelength(&solver, &registry, &ar_stack(), &range, 0.0, &opts).unwrap();
        assert_eq!(result.valid_len(), 0);
        assert_eq!(result.flagged, 7);
    }

    #[test]
    fn finite_substrate_adds_backside_reflection() {
        let registry = MaterialRegistry::with_builtins();
        let solver = TransferMatrixSolver;
        let stack = Stack::bare("Air", "Glass_BK7");
        let range = RangeSpec::Count {
            start: 550.0,
            stop: 550.0,
            points: 1,
        };

        let coherent =
            sweep_wavelength(&solver, &registry, &stack, &range, 0.0, &sequential()).unwrap();
        let opts = SweepOptions {
            parallel: false,
            finite_substrate: true,
            cancel: CancelToken::new(),
        };
        let finite = sweep_wavelength(&solver, &registry, &stack, &range, 0.0, &opts).unwrap();

        // The backside bounce adds reflection and removes transmission.
        assert!(finite.rs[0] > coherent.rs[0]);
        assert!(finite.ts[0] < coherent.ts[0]);
        // Still energy conserving for this lossless plate.
        assert!((finite.rs[0] + finite.ts[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn angular_sweep_covers_grid_and_grazing_end() {
        let registry = MaterialRegistry::with_builtins();
        let solver = TransferMatrixSolver;
        let range = RangeSpec::Step {
            start: 0.0,
            stop: 89.0,
            step: 1.0,
        };

        let result =
            sweep_angle(&solver, &registry, &ar_stack(), &range, 550.0, &sequential()).unwrap();
        assert_eq!(result.len(), 90);
        assert_eq!(result.flagged, 0);
        // Reflectance approaches unity toward grazing incidence.
        assert!(result.rs[89] > 0.9);
        match result.axis {
            SweepAxis::Angular { wavelength_nm } => assert_eq!(wavelength_nm, 550.0),
            other => panic!("wrong axis {other:?}"),
        }
    }
}

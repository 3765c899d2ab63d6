//! Job runner: ties together materials, stack construction, sweeps, and
//! output writers.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use lamella_core::aggregate::{self, ProfilePoint, Summary, Table};
use lamella_core::qwot::{parse_qwot_factors, qwot_stack};
use lamella_core::solver::{StackSolver, TransferMatrixSolver};
use lamella_core::sweep::{sweep_angle, sweep_wavelength, SweepOptions, SweepResult};
use lamella_core::types::{Layer, Stack};
use lamella_materials::{ConstantIndex, MaterialRegistry};

use crate::config::{JobConfig, StackConfig};

/// Results from one job run.
pub struct JobOutput {
    pub spectral: Option<(SweepResult, Summary)>,
    pub angular: Option<(SweepResult, Summary)>,
    pub profile: Option<Vec<ProfilePoint>>,
}

/// Registry for this job: built-ins plus any custom constant materials.
pub fn build_registry(job: &JobConfig) -> MaterialRegistry {
    let mut registry = MaterialRegistry::with_builtins();
    for material in &job.material {
        registry.insert(Arc::new(ConstantIndex::new(
            material.name.clone(),
            material.n,
            material.k,
        )));
    }
    registry
}

/// Build the stack from either the explicit layer list or the QWOT design.
pub fn build_stack(config: &StackConfig, registry: &MaterialRegistry) -> Result<Stack> {
    match (&config.qwot, config.layers.is_empty()) {
        (Some(qwot), true) => {
            let factors = parse_qwot_factors(&qwot.sequence)?;
            let stack = qwot_stack(
                registry,
                &config.incident,
                &qwot.high,
                &qwot.low,
                &config.exit,
                &factors,
                qwot.reference_wavelength_nm,
                qwot.design_angle_deg,
            )?;
            Ok(stack)
        }
        (Some(_), false) => bail!("[stack] defines both 'layers' and 'qwot'; pick one"),
        (None, _) => {
            let layers = config
                .layers
                .iter()
                .map(|l| Layer::new(l.material.clone(), l.thickness_nm))
                .collect();
            Ok(Stack::with_layers(
                config.incident.clone(),
                layers,
                config.exit.clone(),
            ))
        }
    }
}

/// Validate a job end to end without computing anything: registry, stack,
/// and both sweep ranges.
pub fn validate_job(job: &JobConfig) -> Result<Stack> {
    let registry = build_registry(job);
    let stack = build_stack(&job.stack, &registry)?;

    if job.sweep.spectral.is_none() && job.sweep.angular.is_none() {
        bail!("[sweep] must define at least one of 'spectral' or 'angular'");
    }
    if let Some(spectral) = &job.sweep.spectral {
        spectral.range.grid().context("[sweep.spectral] range")?;
        stack
            .validate(&registry, spectral.range.start())
            .context("[sweep.spectral]")?;
        stack
            .validate(&registry, spectral.range.stop())
            .context("[sweep.spectral]")?;
    }
    if let Some(angular) = &job.sweep.angular {
        angular.range.grid().context("[sweep.angular] range")?;
        stack
            .validate(&registry, angular.wavelength_nm)
            .context("[sweep.angular]")?;
    }
    Ok(stack)
}

/// Run a full job from a parsed configuration.
pub fn run_job(job: &JobConfig) -> Result<JobOutput> {
    let registry = build_registry(job);
    let stack = validate_job(job)?;
    let solver = TransferMatrixSolver;

    println!(
        "Stack: {} | {} layer(s), {:.1} nm | {}  ({})",
        stack.incident,
        stack.layers.len(),
        stack.total_thickness_nm(),
        stack.exit,
        solver.method_name(),
    );

    let opts = SweepOptions {
        parallel: job.options.parallel,
        finite_substrate: job.options.finite_substrate,
        ..Default::default()
    };

    let spectral = match &job.sweep.spectral {
        Some(config) => {
            let result = sweep_wavelength(
                &solver,
                &registry,
                &stack,
                &config.range,
                config.angle_deg,
                &opts,
            )?;
            report("spectral", &result.warnings, result.flagged, result.len());
            let summary = aggregate::summarize(&result);
            Some((result, summary))
        }
        None => None,
    };

    let angular = match &job.sweep.angular {
        Some(config) => {
            let result = sweep_angle(
                &solver,
                &registry,
                &stack,
                &config.range,
                config.wavelength_nm,
                &opts,
            )?;
            report("angular", &result.warnings, result.flagged, result.len());
            let summary = aggregate::summarize(&result);
            Some((result, summary))
        }
        None => None,
    };

    let profile = if job.output.save_profile {
        let wavelength = job.output.profile_wavelength_nm.unwrap_or_else(|| {
            job.sweep
                .angular
                .as_ref()
                .map(|a| a.wavelength_nm)
                .unwrap_or_else(|| {
                    let spectral = job.sweep.spectral.as_ref().expect("one sweep exists");
                    0.5 * (spectral.range.start() + spectral.range.stop())
                })
        });
        Some(aggregate::index_profile(&stack, &registry, wavelength)?)
    } else {
        None
    };

    Ok(JobOutput {
        spectral,
        angular,
        profile,
    })
}

fn report(label: &str, warnings: &[String], flagged: usize, total: usize) {
    println!("  {label} sweep: {} samples, {flagged} flagged", total);
    for warning in warnings.iter().take(5) {
        eprintln!("  Warning: {warning}");
    }
    if warnings.len() > 5 {
        eprintln!("  ... and {} further warnings", warnings.len() - 5);
    }
}

/// Write one sweep table to CSV with a metadata header.
pub fn write_table_csv(
    table: &Table,
    summary: &Summary,
    path: &Path,
    job: &JobConfig,
) -> Result<()> {
    use std::io::Write;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::File::create(path)?;

    writeln!(file, "# Lamella thin-film stack response")?;
    writeln!(file, "# Version: {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(
        file,
        "# Stack: {} / {} layer(s) / {}",
        job.stack.incident,
        job.stack.layers.len(),
        job.stack.exit
    )?;
    if let Some(mean_r) = summary.mean_r {
        writeln!(file, "# mean R: {mean_r:.6}")?;
    }
    if let Some(mean_t) = summary.mean_t {
        writeln!(file, "# mean T: {mean_t:.6}")?;
    }
    if let Some((x, level)) = summary.trough_r {
        writeln!(file, "# R minimum: {level:.6} at {x:.2}")?;
    }
    writeln!(file, "#")?;

    writeln!(file, "{}", table.columns.join(","))?;
    for row in &table.rows {
        let line: Vec<String> = row.iter().map(|v| format!("{v:.6}")).collect();
        writeln!(file, "{}", line.join(","))?;
    }

    println!("Table written to: {}", path.display());
    Ok(())
}

/// Write one sweep result (full arrays plus summary) to a JSON file.
pub fn write_result_json(result: &SweepResult, summary: &Summary, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let payload = serde_json::json!({
        "result": result,
        "summary": summary,
    });
    std::fs::write(path, serde_json::to_string_pretty(&payload)?)?;

    println!("JSON written to: {}", path.display());
    Ok(())
}

/// Write the refractive-index depth profile to CSV.
pub fn write_profile_csv(profile: &[ProfilePoint], path: &Path) -> Result<()> {
    use std::io::Write;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::File::create(path)?;
    writeln!(file, "# Lamella refractive-index depth profile")?;
    writeln!(file, "depth_nm,n")?;
    for point in profile {
        writeln!(file, "{:.4},{:.6}", point.depth_nm, point.index)?;
    }

    println!("Profile written to: {}", path.display());
    Ok(())
}

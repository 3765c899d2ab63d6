//! Lamella command-line interface.
//!
//! Run stack-response computations from TOML job files:
//! ```sh
//! lamella-cli run job.toml
//! lamella-cli validate job.toml
//! lamella-cli materials
//! ```

mod config;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use lamella_core::aggregate;
use lamella_materials::{MaterialProvider, MaterialRegistry};

#[derive(Parser)]
#[command(name = "lamella-cli")]
#[command(about = "Lamella: thin-film stack transfer-matrix engine")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the sweeps defined in a TOML job file.
    Run {
        /// Path to the job configuration file.
        config: PathBuf,
        /// Output directory (overrides config file setting).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a job file without computing anything.
    Validate {
        /// Path to the job configuration file.
        config: PathBuf,
    },
    /// Display the registered built-in materials.
    Materials,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, output } => {
            println!("Lamella Transfer-Matrix Engine");
            println!("==============================");
            let job = config::load_config(&config)?;
            println!("Configuration: {}", config.display());

            let result = runner::run_job(&job)?;

            let out_dir = output.unwrap_or_else(|| PathBuf::from(&job.output.directory));

            if let Some((sweep, summary)) = &result.spectral {
                if job.output.save_csv {
                    let table = aggregate::table(sweep, &job.output.display);
                    runner::write_table_csv(&table, summary, &out_dir.join("spectral.csv"), &job)?;
                }
                if job.output.save_json {
                    runner::write_result_json(sweep, summary, &out_dir.join("spectral.json"))?;
                }
            }
            if let Some((sweep, summary)) = &result.angular {
                if job.output.save_csv {
                    let table = aggregate::table(sweep, &job.output.display);
                    runner::write_table_csv(&table, summary, &out_dir.join("angular.csv"), &job)?;
                }
                if job.output.save_json {
                    runner::write_result_json(sweep, summary, &out_dir.join("angular.json"))?;
                }
            }
            if let Some(profile) = &result.profile {
                runner::write_profile_csv(profile, &out_dir.join("profile.csv"))?;
            }

            println!("Job complete.");
            Ok(())
        }
        Commands::Validate { config } => {
            let job = config::load_config(&config)?;
            let stack = runner::validate_job(&job)?;
            println!(
                "Configuration is valid: {} ({} layer(s), {:.1} nm total)",
                config.display(),
                stack.layers.len(),
                stack.total_thickness_nm()
            );
            Ok(())
        }
        Commands::Materials => {
            let registry = MaterialRegistry::with_builtins();
            println!("Built-in materials:");
            println!();
            for name in registry.names() {
                let provider = registry.lookup(name).expect("listed name resolves");
                let (min, max) = provider.wavelength_range();
                if max.is_finite() {
                    println!("  {name:<10} tabulated, {min:.0}-{max:.0} nm");
                } else {
                    println!("  {name:<10} constant index");
                }
            }
            println!();
            println!("Custom constant-index materials can be added per job via [[material]].");
            Ok(())
        }
    }
}

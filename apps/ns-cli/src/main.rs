use clap::{Parser, Subcommand};
use ns_app::{
    config, query, run_service, runtime, study, AppError, AppResult, EosSource,
    IntegrationSettings, LocatorSettings, RunOptions, RunProgressEvent, RunRequest, RunStage,
    SequenceSettings, UnitsDef,
};
use ns_eos::EosTable;
use ns_results::{write_profile_csv, write_sequence_csv, write_star_json, SequenceRecord, StarProfileRecord};
use ns_sequence::{MrSequence, Target};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "nstar")]
#[command(about = "Neutron-star structure and tidal deformability from tabulated EOS", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a run config file
    Validate {
        /// Path to the run config YAML file
        config_path: PathBuf,
    },
    /// Execute a run config (sequence, targets, export), using the cache
    Run {
        /// Path to the run config YAML file
        config_path: PathBuf,
        /// Skip cache and force re-run
        #[arg(long)]
        no_cache: bool,
    },
    /// List cached runs next to a config file
    Runs {
        /// Path to the run config YAML file
        config_path: PathBuf,
        /// EOS name to list runs for
        eos_name: String,
    },
    /// Show the summary of a cached run
    ShowRun {
        /// Path to the run config YAML file
        config_path: PathBuf,
        /// Run ID to display
        run_id: String,
    },
    /// Mass-radius-Lambda sequence of an EOS table
    Sequence {
        #[command(flatten)]
        eos: EosArgs,
        /// Number of central pressures
        #[arg(short, long, default_value_t = 100)]
        num_points: usize,
        /// Lowest central pressure (km^-2); table minimum by default
        #[arg(long)]
        p_min: Option<f64>,
        /// Highest central pressure (km^-2); table maximum by default
        #[arg(long)]
        p_max: Option<f64>,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Star of a given mass or radius on the stable branch
    Target {
        #[command(flatten)]
        eos: EosArgs,
        /// Target gravitational mass (solar masses)
        #[arg(long)]
        mass: Option<f64>,
        /// Target radius (km)
        #[arg(long)]
        radius: Option<f64>,
        /// Number of central pressures in the coarse sequence
        #[arg(short, long, default_value_t = 100)]
        num_points: usize,
        /// Output JSON file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Radial profile of the star with central pressure p_c
    Profile {
        #[command(flatten)]
        eos: EosArgs,
        /// Central pressure (km^-2)
        #[arg(long)]
        pc: f64,
        /// Radial sample spacing (km)
        #[arg(long, default_value_t = 0.1)]
        spacing: f64,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct EosArgs {
    /// EOS table (CSV, code units)
    eos_path: PathBuf,
    /// Auxiliary column holding the phase index
    #[arg(long)]
    phase_column: Option<String>,
    /// Units of the pressure and energy-density columns
    #[arg(long, value_enum, default_value_t = UnitsArg::Code)]
    units: UnitsArg,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum UnitsArg {
    /// km^-2
    Code,
    /// MeV/fm^3
    MevFm3,
    /// dyn/cm^2 and g/cm^3
    Cgs,
}

impl From<UnitsArg> for UnitsDef {
    fn from(units: UnitsArg) -> Self {
        match units {
            UnitsArg::Code => UnitsDef::Code,
            UnitsArg::MevFm3 => UnitsDef::MevFm3,
            UnitsArg::Cgs => UnitsDef::Cgs,
        }
    }
}

impl EosArgs {
    fn load(&self) -> AppResult<EosTable> {
        let source = EosSource::Csv {
            path: self.eos_path.clone(),
            phase_column: self.phase_column.clone(),
            units: self.units.into(),
        };
        runtime::load_eos(&source, Path::new("."))
    }
}

fn main() -> AppResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { config_path } => cmd_validate(&config_path),
        Commands::Run {
            config_path,
            no_cache,
        } => cmd_run(&config_path, !no_cache),
        Commands::Runs {
            config_path,
            eos_name,
        } => cmd_runs(&config_path, &eos_name),
        Commands::ShowRun {
            config_path,
            run_id,
        } => cmd_show_run(&config_path, &run_id),
        Commands::Sequence {
            eos,
            num_points,
            p_min,
            p_max,
            output,
        } => cmd_sequence(&eos, num_points, p_min, p_max, output.as_deref()),
        Commands::Target {
            eos,
            mass,
            radius,
            num_points,
            output,
        } => cmd_target(&eos, mass, radius, num_points, output.as_deref()),
        Commands::Profile {
            eos,
            pc,
            spacing,
            output,
        } => cmd_profile(&eos, pc, spacing, output.as_deref()),
    }
}

fn cmd_validate(config_path: &Path) -> AppResult<()> {
    println!("Validating config: {}", config_path.display());
    let config = config::load_config(config_path)?;
    config::validate_config(&config)?;
    let base_dir = config_path.parent().unwrap_or(Path::new("."));
    let eos = runtime::load_eos(&config.eos, base_dir)?;
    let (p_min, p_max) = eos.pressure_range();
    println!(
        "✓ Config is valid ({} EOS rows, p in [{:.3e}, {:.3e}])",
        eos.len(),
        p_min,
        p_max
    );
    Ok(())
}

fn cmd_run(config_path: &Path, use_cache: bool) -> AppResult<()> {
    println!("Running config: {}", config_path.display());

    let request = RunRequest {
        config_path,
        options: RunOptions {
            use_cache,
            solver_version: "0.1.0".to_string(),
        },
    };

    let mut last_emit = Instant::now();
    let mut last_stage = None;
    let response = run_service::ensure_run_with_progress(
        &request,
        Some(&mut |event| {
            let emit_now = last_stage != Some(event.stage) || last_emit.elapsed().as_millis() >= 100;
            if emit_now {
                render_cli_progress(&event);
                last_stage = Some(event.stage);
                last_emit = Instant::now();
            }
        }),
    )?;
    clear_progress_line();

    if response.loaded_from_cache {
        println!("✓ Loaded from cache: {}", response.run_id);
    } else {
        println!("✓ Run completed: {}", response.run_id);
    }

    print_timing_summary(&response.timing);
    print_sequence_summary(&response.sequence)?;

    for outcome in &response.targets {
        match &outcome.result {
            Ok(star) => println!(
                "  {}: M = {:.4} Msun, R = {:.3} km, Lambda = {}",
                outcome.label,
                star.star.mass_solar,
                star.star.radius_km,
                fmt_opt(star.star.lambda)
            ),
            Err(message) => println!("  {}: failed ({})", outcome.label, message),
        }
    }
    for path in &response.exported {
        println!("  wrote {}", path.display());
    }

    Ok(())
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(120));
    let _ = io::stdout().flush();
}

fn render_cli_progress(event: &RunProgressEvent) {
    match (event.stage, &event.sequence) {
        (RunStage::BuildingSequence, Some(p)) => {
            let width = 28usize;
            let fraction = p.fraction();
            let filled = ((fraction * width as f64).round() as usize).min(width);
            let bar = format!(
                "{}{}",
                "#".repeat(filled),
                "-".repeat(width.saturating_sub(filled))
            );
            print!(
                "\r[{}] {:>6.2}%  phase={}  stars={}/{}  elapsed={:.1}s",
                bar,
                fraction * 100.0,
                event.stage.label(),
                p.completed,
                p.total,
                event.elapsed_wall_s
            );
            let _ = io::stdout().flush();
        }
        _ => {
            let spinner = ['|', '/', '-', '\\'];
            let spin_idx = ((event.elapsed_wall_s * 10.0) as usize) % spinner.len();
            let mut line = format!(
                "\r{} {}  elapsed={:.2}s",
                spinner[spin_idx],
                event.stage.label(),
                event.elapsed_wall_s
            );
            if let Some(msg) = &event.message {
                line.push_str(&format!("  {}", msg));
            }
            print!("{}", line);
            let _ = io::stdout().flush();
        }
    }
}

fn print_timing_summary(timing: &ns_app::RunTimingSummary) {
    let total = timing.total_time_s.max(1.0e-12);
    let pct = |t: f64| 100.0 * t / total;

    println!("\nTiming summary:");
    println!(
        "  EOS:      {:.3}s ({:.1}%)",
        timing.load_eos_time_s,
        pct(timing.load_eos_time_s)
    );
    if timing.sequence_time_s > 0.0 {
        println!(
            "  Sequence: {:.3}s ({:.1}%)",
            timing.sequence_time_s,
            pct(timing.sequence_time_s)
        );
        println!(
            "  Targets:  {:.3}s ({:.1}%)",
            timing.locate_time_s,
            pct(timing.locate_time_s)
        );
        println!("  Save:     {:.3}s", timing.save_time_s);
    }
    if timing.load_cache_time_s > 0.0 {
        println!("  Cache load: {:.3}s", timing.load_cache_time_s);
    }
    if timing.export_time_s > 0.0 {
        println!("  Export:   {:.3}s", timing.export_time_s);
    }
    println!("  Total:    {:.3}s", timing.total_time_s);
}

fn print_sequence_summary(record: &SequenceRecord) -> AppResult<()> {
    let summary = query::get_run_summary(record)?;
    println!("\nSequence '{}':", record.eos_name);
    println!(
        "  Stars: {} ({} stable, {} rejected)",
        summary.star_count, summary.stable_count, summary.rejected_count
    );
    println!(
        "  M_max = {:.4} Msun at R = {:.3} km (p_c = {:.4e})",
        summary.max_mass_solar, summary.radius_at_max_km, summary.p_c_at_max
    );
    Ok(())
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.2}")).unwrap_or_else(|| "-".to_string())
}

fn cmd_runs(config_path: &Path, eos_name: &str) -> AppResult<()> {
    let runs = run_service::list_runs(config_path, eos_name)?;

    if runs.is_empty() {
        println!("No cached runs found for EOS: {}", eos_name);
    } else {
        println!("Cached runs for EOS '{}':", eos_name);
        for manifest in runs {
            println!("  {} ({})", manifest.run_id, manifest.timestamp);
        }
    }
    Ok(())
}

fn cmd_show_run(config_path: &Path, run_id: &str) -> AppResult<()> {
    println!("Loading run: {}", run_id);

    let (manifest, record) = run_service::load_run(config_path, run_id)?;
    println!("  Created: {}", manifest.timestamp);
    println!("  Solver:  {}", manifest.solver_version);
    print_sequence_summary(&record)?;

    println!("\nStable branch:");
    for star in query::stable_stars(&record) {
        println!(
            "  p_c = {:.4e}  M = {:.4}  R = {:.3}  Lambda = {}",
            star.p_c,
            star.mass_solar,
            star.radius_km,
            fmt_opt(star.lambda)
        );
    }
    Ok(())
}

fn scan(eos: &EosTable, num_points: usize, p_min: Option<f64>, p_max: Option<f64>) -> AppResult<MrSequence> {
    let settings = SequenceSettings {
        num_points,
        p_min,
        p_max,
        ..Default::default()
    };
    study::sequence_study(eos, &settings, &IntegrationSettings::default(), None)
}

fn cmd_sequence(
    eos_args: &EosArgs,
    num_points: usize,
    p_min: Option<f64>,
    p_max: Option<f64>,
    output: Option<&Path>,
) -> AppResult<()> {
    let eos = eos_args.load()?;
    let sequence = scan(&eos, num_points, p_min, p_max)?;
    let record = SequenceRecord::from_sequence(&sequence, Some(&eos));

    match output {
        Some(path) => {
            ns_results::save_sequence_csv(path, &record)?;
            print_sequence_summary(&record)?;
            if let Ok(at) = sequence.interpolate_at_mass(1.4) {
                println!(
                    "  At 1.4 Msun: R = {:.3} km, Lambda = {}",
                    at.radius,
                    fmt_opt(at.lambda)
                );
            }
            println!("✓ Exported {} stars to {}", record.stars.len(), path.display());
        }
        None => write_sequence_csv(io::stdout().lock(), &record)?,
    }
    Ok(())
}

fn cmd_target(
    eos_args: &EosArgs,
    mass: Option<f64>,
    radius: Option<f64>,
    num_points: usize,
    output: Option<&Path>,
) -> AppResult<()> {
    let target = match (mass, radius) {
        (Some(m), None) => Target::Mass(m),
        (None, Some(r)) => Target::Radius(r),
        _ => {
            return Err(AppError::InvalidInput(
                "give exactly one of --mass or --radius".to_string(),
            ))
        }
    };

    let eos = eos_args.load()?;
    let sequence = scan(&eos, num_points, None, None)?;
    let located = study::target_study(
        &eos,
        &sequence,
        target,
        &LocatorSettings::default(),
        &IntegrationSettings::default(),
    )?;
    let record = StarProfileRecord::from_located(&located, &eos, Some(&eos));

    match output {
        Some(path) => {
            ns_results::save_star_json(path, &record)?;
            println!(
                "✓ {}: p_c = {:.6e}, M = {:.4} Msun, R = {:.3} km, k2 = {}, Lambda = {} ({} bisection steps)",
                target,
                located.star.p_c,
                located.star.mass_solar(),
                located.star.radius,
                located.star.k2().map(|k| format!("{k:.5}")).unwrap_or_else(|| "-".into()),
                fmt_opt(located.star.lambda()),
                located.iterations
            );
            println!("  wrote {}", path.display());
        }
        None => write_star_json(io::stdout().lock(), &record)?,
    }
    Ok(())
}

fn cmd_profile(eos_args: &EosArgs, p_c: f64, spacing: f64, output: Option<&Path>) -> AppResult<()> {
    let eos = eos_args.load()?;
    let star = study::profile_study(&eos, p_c, &IntegrationSettings::default(), spacing)?;
    let record = StarProfileRecord::from_star(&star, &eos, Some(&eos));

    match output {
        Some(path) => {
            write_profile_csv(std::fs::File::create(path)?, &record)?;
            println!(
                "✓ {} samples, M = {:.4} Msun, R = {:.3} km ({})",
                record.profile.len(),
                star.mass_solar(),
                star.radius,
                eos.name()
            );
        }
        None => write_profile_csv(io::stdout().lock(), &record)?,
    }
    Ok(())
}

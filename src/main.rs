//! `u-convoy` command line.
//!
//! ```text
//! u-convoy plan  --config convoy.toml --output out/
//! u-convoy check --people p.csv --teams t.csv --vehicles v.csv
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing::{error, info, warn};

use u_convoy::config::{Backend, ConfigOverrides, ConvoyConfig, InputEncoding};
use u_convoy::logging;
use u_convoy::pipeline::{check_from_config, run_from_config};
use u_convoy::Result;

#[derive(Debug, Parser)]
#[command(name = "u-convoy", version, about = "Assign teams to vehicles")]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Solve the allocation and write the exports
    Plan(PlanArgs),
    /// List every data problem without solving
    Check(InputArgs),
}

#[derive(Debug, Args)]
struct InputArgs {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// People file
    #[arg(long)]
    people: Option<PathBuf>,

    /// Teams file
    #[arg(long)]
    teams: Option<PathBuf>,

    /// Vehicles file
    #[arg(long)]
    vehicles: Option<PathBuf>,

    /// Input file encoding
    #[arg(long, value_enum)]
    encoding: Option<InputEncoding>,

    /// Maximum absolute faction sum per vehicle
    #[arg(long)]
    faction_band: Option<i64>,

    /// Maximum minors per vehicle
    #[arg(long)]
    max_minors: Option<u32>,

    /// Minimum certified members per vehicle
    #[arg(long)]
    min_certified: Option<u32>,
}

#[derive(Debug, Args)]
struct PlanArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Output directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Solver backend
    #[arg(long, value_enum)]
    backend: Option<Backend>,

    /// Write the model in LP format to this file
    #[arg(long)]
    dump_model: Option<PathBuf>,
}

impl InputArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            people: self.people.clone(),
            teams: self.teams.clone(),
            vehicles: self.vehicles.clone(),
            encoding: self.encoding,
            faction_band: self.faction_band,
            max_minors: self.max_minors,
            min_certified: self.min_certified,
            ..ConfigOverrides::default()
        }
    }
}

/// Config file (or defaults) with command-line overrides applied.
fn load_config(path: Option<&PathBuf>, overrides: ConfigOverrides) -> Result<ConvoyConfig> {
    let config = match path {
        Some(path) => ConvoyConfig::load(path)?,
        None => ConvoyConfig::default(),
    };
    Ok(config.with_overrides(overrides)?)
}

fn plan(args: &PlanArgs) -> Result<()> {
    let overrides = ConfigOverrides {
        output: args.output.clone(),
        model_dump: args.dump_model.clone(),
        backend: args.backend,
        ..args.input.overrides()
    };
    let config = load_config(args.input.config.as_ref(), overrides)?;

    let (report, files) = run_from_config(&config)?;
    let s = &report.summary;
    println!(
        "{} people ({} new, {} certified, {} volunteers, {} organizers), {} teams, {} vehicles, {} seats",
        s.people, s.new, s.certified, s.volunteers, s.organizers, s.teams, s.vehicles, s.total_seats
    );
    for v in &report.vehicles {
        println!(
            "vehicle {:>3}: {:>3}/{:<3} seats, teams {:?}",
            v.id, v.occupied_seats, v.capacity, v.team_ids
        );
    }
    println!("{} of {} people seated", s.seated, s.people);
    info!(files = files.len(), dir = %config.output.directory.display(), "done");
    Ok(())
}

fn check(args: &InputArgs) -> Result<bool> {
    let config = load_config(args.config.as_ref(), args.overrides())?;
    let findings = check_from_config(&config)?;
    for finding in &findings {
        if finding.is_fatal() {
            error!("{}", finding.message);
        } else {
            warn!("{}", finding.message);
        }
    }
    let fatal = findings.iter().filter(|f| f.is_fatal()).count();
    println!("{} findings, {} fatal", findings.len(), fatal);
    Ok(fatal == 0)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(if cli.verbose { "debug" } else { "info" });

    let outcome = match &cli.command {
        Command::Plan(args) => plan(args).map(|()| true),
        Command::Check(args) => check(args),
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use temkit::config::AnalysisConfig;
use temkit::pipeline;
use temkit::unit::Unit;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "temkit",
    version,
    about = "Equivalent dipole moments of antennas measured in a TEM cell"
)]
struct Cli {
    /// Tracing filter, overridden by RUST_LOG
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute the dipole moments and write the report.
    Moments(MomentsArgs),
    /// Validate the configuration and inputs, including the strategy's
    /// per-frequency checks, without writing output.
    Check(CheckArgs),
}

#[derive(ClapArgs, Debug)]
struct MomentsArgs {
    /// YAML analysis configuration.
    #[arg(short, long)]
    config: PathBuf,
    /// CSV output, overrides `output.csv` of the configuration.
    #[arg(short, long)]
    out: Option<PathBuf>,
    /// Print the report as JSON instead of a table.
    #[arg(long)]
    json: bool,
}

#[derive(ClapArgs, Debug)]
struct CheckArgs {
    /// YAML analysis configuration.
    #[arg(short, long)]
    config: PathBuf,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn moments(args: MomentsArgs) -> Result<(), Box<dyn Error>> {
    let mut config = AnalysisConfig::from_yaml_file(&args.config)?;
    if args.out.is_some() {
        config.output.csv = args.out;
    }
    let analysis = pipeline::run(&config)?;
    let report = &analysis.report;

    if args.json {
        println!("{}", report.to_json()?);
        return Ok(());
    }
    println!("{} ({})", report.title, analysis.strategy);
    println!("{:>14}  {:>14}  {:>14}", "f", "|m_e|*Z", "|m_m|");
    let unit = Unit::VoltMeter.to_str();
    println!("{:>14}  {:>14}  {:>14}", report.frequency_unit, unit, unit);
    for i in 0..report.len() {
        println!(
            "{:>14.6}  {:>14.6e}  {:>14.6e}",
            report.frequency[i], report.electric[i], report.magnetic[i]
        );
    }
    println!("y-range [0, {:.6e}]", report.y_limits.1);
    Ok(())
}

fn check(args: CheckArgs) -> Result<(), Box<dyn Error>> {
    let config = AnalysisConfig::from_yaml_file(&args.config)?;
    let set = pipeline::check(&config)?;
    let freq = set.frequency();
    let scale = config.report.frequency_scale;
    println!(
        "{}: {} strategy, {} samples, {} - {} {}Hz",
        config.name,
        config.strategy.name(),
        freq.npts(),
        scale.scale(freq.start()),
        scale.scale(freq.stop()),
        scale
    );
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let result = match cli.command {
        Command::Moments(args) => moments(args),
        Command::Check(args) => check(args),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

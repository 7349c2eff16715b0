use anyhow::{bail, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use majin_cli::config::{AttackPlan, ProfileArgs, ProfileConfig, TargetArgs, WorkloadArgs};
use majin_cli::{output, random_mode};
use majin_core::{Attacker, StaticTargeter, Targeter, WorkloadSimulator};
use majin_http::HttpAttacker;
use std::io;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Majin: workload-simulating HTTP load generator
///
/// Offers a time-varying request rate to an HTTP target: a seasonal cosine
/// curve with trend, noise and random bursts, one rate per second.
///
/// Example usage:
///   majin attack --target http://localhost:8080/ --base-load 100 --period 60 --duration 600
///   majin attack --noise 5 --burst-frequency 120 --burst-index 3 --burst-duration 10
///   majin attack -P profiles/daily-cycle.toml --header 'Authorization: Bearer t0k3n'
///   majin attack --random --base-load 500 --duration 300
///   majin preview --base-load 10 --period 2 --duration 9
#[derive(Parser)]
#[command(name = "majin")]
#[command(version, about = "Workload-simulating HTTP load generator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a workload simulation and attack according to its parameters
    Attack(AttackArgs),

    /// Print the rate of every tick without sending any requests
    Preview(PreviewArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
struct AttackArgs {
    /// Generate random workloads, using the other parameters as maximum values
    #[arg(long, env = "RANDOM")]
    random: bool,

    #[command(flatten)]
    profile: ProfileArgs,

    #[command(flatten)]
    workload: WorkloadArgs,

    #[command(flatten)]
    target: TargetArgs,
}

#[derive(Args)]
struct PreviewArgs {
    #[command(flatten)]
    profile: ProfileArgs,

    #[command(flatten)]
    workload: WorkloadArgs,

    /// Number of ticks to print (required for workloads that run forever)
    #[arg(long)]
    ticks: Option<u64>,

    /// Print one JSON object per tick
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    match cli.command {
        Commands::Attack(args) => run_attack(args),
        Commands::Preview(args) => run_preview(args),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "majin", &mut io::stdout());
            Ok(())
        }
    }
}

fn run_attack(args: AttackArgs) -> Result<()> {
    let profile = ProfileConfig::load(args.profile.profile.as_deref())?;
    let plan =
        AttackPlan::resolve(profile, &args.profile, &args.workload, &args.target, args.random)?;

    tracing::info!("Launching attack on {}", plan.target.url);
    if let Some(seed) = plan.seed {
        tracing::info!("Seed: {} (reproducible mode)", seed);
    }

    let targeter: Arc<dyn Targeter> = Arc::new(StaticTargeter::new(plan.target.clone()));
    let attacker: Arc<dyn Attacker> = Arc::new(HttpAttacker::new(plan.attacker.clone()));

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        if plan.random {
            random_mode::run_forever(plan.spec, plan.seed, attacker, targeter).await;
        } else {
            let simulator = match plan.seed {
                Some(seed) => WorkloadSimulator::with_seed(plan.spec, seed),
                None => WorkloadSimulator::new(plan.spec),
            };
            simulator.run(attacker, targeter).await;
        }
    });

    Ok(())
}

fn run_preview(args: PreviewArgs) -> Result<()> {
    let profile = ProfileConfig::load(args.profile.profile.as_deref())?;
    let spec = args.workload.apply(profile.workload);
    spec.validate()?;

    let simulator = match args.profile.seed.or(profile.seed) {
        Some(seed) => WorkloadSimulator::with_seed(spec, seed),
        None => WorkloadSimulator::new(spec),
    };

    let mut stdout = io::stdout().lock();
    match (spec.is_bounded(), args.ticks) {
        (_, Some(ticks)) => {
            output::write_preview(&mut stdout, simulator.series().take(ticks as usize), args.json)?
        }
        (true, None) => output::write_preview(&mut stdout, simulator.series(), args.json)?,
        (false, None) => bail!("This workload runs forever (duration 0); pass --ticks to preview it"),
    };

    Ok(())
}

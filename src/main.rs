use anyhow::{Context, Result};
use biotope_core::config::EngineConfig;
use biotope_core::metrics::{init_logging, BIRTHS, DEATHS};
use biotope_lib::driver::{Driver, DriverConfig, DriverEvent, EngineSimulator};
use biotope_lib::session::{rng_for, Session};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Engine config file (TOML); built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of advances to run headless
    #[arg(short, long, default_value_t = 1000)]
    steps: u64,

    /// Simulated time per advance
    #[arg(long, default_value_t = 0.1)]
    dt: f64,

    /// RNG seed, overriding the config
    #[arg(long)]
    seed: Option<u64>,

    /// Print a JSON snapshot every N advances
    #[arg(long)]
    snapshot_every: Option<u64>,

    /// Run through the real-time driver for this many wall seconds
    #[arg(long)]
    realtime: Option<f64>,

    /// Simulated time per wall second in real-time mode, overriding the config
    #[arg(long)]
    speed: Option<f64>,
}

fn main() -> Result<()> {
    init_logging("info");
    let args = Args::parse();

    let (mut config, mut driver_config) = match &args.config {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            let engine = EngineConfig::from_toml(&content)
                .with_context(|| format!("parsing config {}", path.display()))?;
            let driver = DriverConfig::from_toml(&content)
                .with_context(|| format!("parsing [driver] in {}", path.display()))?;
            (engine, driver)
        }
        None => (EngineConfig::default(), DriverConfig::default()),
    };
    if args.seed.is_some() {
        config.engine.seed = args.seed;
    }
    if let Some(speed) = args.speed {
        driver_config.speed = speed;
    }

    let mut rng = rng_for(&config);
    let session = Session::demo(&config, &mut rng)?;

    match args.realtime {
        Some(seconds) => run_realtime(session, rng, seconds, driver_config),
        None => run_headless(session, rng, &args),
    }
}

fn run_headless(session: Session, mut rng: rand_chacha::ChaCha8Rng, args: &Args) -> Result<()> {
    anyhow::ensure!(args.dt > 0.0, "--dt must be positive");
    let Session {
        engine, mut status, ..
    } = session;

    for step in 1..=args.steps {
        let target = status.time + args.dt;
        status = engine.next(status, target, &mut rng)?;
        if let Some(every) = args.snapshot_every.filter(|&n| n > 0) {
            if step % every == 0 {
                println!("{}", serde_json::to_string(&engine.snapshot(&status)?)?);
            }
        }
        if status.individuals() == 0 {
            tracing::info!(time = status.time, "all populations extinct");
            break;
        }
    }

    println!("{}", serde_json::to_string_pretty(&engine.snapshot(&status)?)?);
    tracing::info!(
        steps = engine.metrics().step_count(),
        births = engine.metrics().counter(BIRTHS),
        deaths = engine.metrics().counter(DEATHS),
        elapsed_ms = engine.metrics().elapsed().as_millis() as u64,
        "Headless simulation finished"
    );
    Ok(())
}

fn run_realtime(
    session: Session,
    rng: rand_chacha::ChaCha8Rng,
    seconds: f64,
    config: DriverConfig,
) -> Result<()> {
    anyhow::ensure!(
        seconds.is_finite() && seconds >= 0.0,
        "--realtime must be a non-negative number of seconds"
    );
    let Session { engine, status, .. } = session;
    let driver = Driver::spawn(EngineSimulator::new(engine, rng), config, |event| match event {
        DriverEvent::Advanced { observation, speed } => {
            match serde_json::to_string(&observation) {
                Ok(json) => println!("{{\"speed\":{speed},\"snapshot\":{json}}}"),
                Err(e) => tracing::warn!(error = %e, "failed to encode snapshot"),
            }
        }
        DriverEvent::Failed(e) => tracing::error!(error = %e, "simulation stopped"),
    })?;

    driver.push_seed(status).wait()?;
    driver.start().wait()?;
    std::thread::sleep(Duration::from_secs_f64(seconds));
    driver.stop().wait()?;
    if let Some(status) = driver.shutdown()? {
        tracing::info!(
            time = status.time,
            individuals = status.individuals(),
            "Real-time simulation finished"
        );
    }
    Ok(())
}

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use rail_sim::simulation::{demo_scenario, Scenario, Simulator};

#[derive(Parser)]
#[command(name = "rail_sim")]
#[command(about = "Tick-driven rail network simulation")]
struct Cli {
    /// Scenario file to run; the built-in demo network is used when omitted
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Maximum number of ticks to simulate
    #[arg(long, default_value = "100")]
    max_ticks: u64,

    /// Print a system summary every N ticks (0 = only at the end)
    #[arg(long, default_value = "0")]
    summary_every: u64,

    /// Do not print individual events
    #[arg(long)]
    quiet: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn,rail_sim=info"))
        .init();

    let cli = Cli::parse();
    run_headless(&cli)
}

/// Run the simulation to completion, printing events as they happen
fn run_headless(cli: &Cli) -> Result<()> {
    let scenario = match &cli.scenario {
        Some(path) => Scenario::from_file(path)?,
        None => demo_scenario()?,
    };
    let mut simulator = Simulator::from_scenario(scenario).context("setting up the simulation")?;

    println!("Running rail simulation in headless mode...");
    println!("Max ticks: {}", cli.max_ticks);
    println!();
    println!("Initial state:");
    print!("{}", simulator.system().summary());
    println!();

    let mut ticks = 0;
    while !simulator.is_done() && ticks < cli.max_ticks {
        let events = simulator.step()?;
        ticks += 1;

        if !cli.quiet {
            for event in &events {
                println!("{}", event);
            }
        }

        if cli.summary_every > 0 && ticks % cli.summary_every == 0 {
            println!("--- After tick {} ---", simulator.system().current_time());
            print!("{}", simulator.system().summary());
            println!();
        }
    }

    let report = simulator.report();
    println!("=== Final State ===");
    print!("{}", simulator.system().summary());
    println!();
    println!("{}", report);
    for flagged in &report.flagged {
        println!("Flagged: {}", flagged);
    }

    Ok(())
}

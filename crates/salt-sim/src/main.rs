// ─────────────────────────────────────────────────────────────────────
// SCPN Salt Loop — CLI Entry Point
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use log::{error, LevelFilter};

use salt_sim::controller::Simulation;
use salt_types::config::MainConfig;
use salt_types::error::SaltResult;

/// Molten-salt reactor depletion and online reprocessing driver.
#[derive(Parser, Debug)]
#[command(name = "saltloop", version, about)]
struct Cli {
    /// Main input file (JSON).
    #[arg(short, long)]
    input: String,

    /// Increase log verbosity (-v: debug, -vv: trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn build_simulation(input: &str) -> SaltResult<Simulation> {
    let config = MainConfig::from_file(input)?;
    let library = salt_reproc::process::ProcessLibrary::from_file(&config.proc_input_file)?;
    let dot_text = fs::read_to_string(&config.dot_input_file)?;
    let graph = salt_reproc::graph::ProcessGraph::parse(&dot_text)?;
    let code = salt_depcode::create(&config.depcode, Path::new(&config.output_path))?;
    Simulation::new(config, library, graph, code)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    let mut simulation = match build_simulation(&cli.input) {
        Ok(simulation) => simulation,
        Err(e) => {
            error!("failed to set up simulation: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = simulation.run() {
        error!("simulation failed: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

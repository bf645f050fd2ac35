// ─────────────────────────────────────────────────────────────────────
// SCPN Salt Loop — Simulation Controller
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! The depletion step loop.
//!
//! Per step: write input, run the external code, check the geometry
//! switch trigger against the measured end-of-step k, reprocess,
//! refill, write the material back, append a durable step record.
//! There is no retry; the only recovery path after a failure is a
//! restart from the last checkpointed record.

use std::path::Path;

use log::{info, warn};

use salt_depcode::{DepletionCode, StepContext};
use salt_reproc::engine::{refill, reprocess};
use salt_reproc::graph::{NodeIndex, ProcessGraph};
use salt_reproc::process::ProcessLibrary;
use salt_types::config::MainConfig;
use salt_types::error::SaltResult;

use crate::checkpoint::{CheckpointDb, StepRecord};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Where the loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationState {
    Init,
    Running,
    Checkpoint,
    Terminated,
    Failed,
}

pub struct Simulation {
    config: MainConfig,
    library: ProcessLibrary,
    graph: ProcessGraph,
    order: Vec<NodeIndex>,
    code: Box<dyn DepletionCode>,
    db: CheckpointDb,
    state: SimulationState,
    step_index: usize,
    /// Core mass the refill closes against, captured at the first step.
    target_mass: Option<f64>,
    restarted: bool,
}

impl Simulation {
    pub fn new(
        config: MainConfig,
        library: ProcessLibrary,
        graph: ProcessGraph,
        code: Box<dyn DepletionCode>,
    ) -> SaltResult<Self> {
        graph.validate_processes(&library)?;
        let order = graph.resolve()?;
        let db = CheckpointDb::new(
            Path::new(&config.output_path).join(&config.simulation.db_name),
        );
        Ok(Simulation {
            config,
            library,
            graph,
            order,
            code,
            db,
            state: SimulationState::Init,
            step_index: 0,
            target_mass: None,
            restarted: false,
        })
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    pub fn checkpoint_db(&self) -> &CheckpointDb {
        &self.db
    }

    /// Run every remaining depletion step.
    pub fn run(&mut self) -> SaltResult<()> {
        self.prepare()?;
        while self.step_index < self.config.step_count() {
            if let Err(e) = self.run_step() {
                self.state = SimulationState::Failed;
                return Err(e);
            }
        }
        self.state = SimulationState::Terminated;
        info!(
            "simulation '{}' finished after {} steps",
            self.config.simulation.sim_name,
            self.config.step_count()
        );
        Ok(())
    }

    /// Resume from the last durable record, or clear out the previous
    /// run's database for a fresh start.
    fn prepare(&mut self) -> SaltResult<()> {
        if self.config.simulation.restart_flag {
            match self.db.last_record()? {
                Some(last) => {
                    self.step_index = last.step_index + 1;
                    self.target_mass = Some(last.target_mass);
                    self.code.set_geometry_cursor(last.geometry_cursor)?;
                    self.code.write_material(&last.core)?;
                    self.restarted = true;
                    info!(
                        "resuming '{}' at step {} ({} d burned)",
                        self.config.simulation.sim_name,
                        self.step_index,
                        last.cumulative_days
                    );
                }
                None => warn!(
                    "restart requested but '{}' holds no records; starting fresh",
                    self.db.path().display()
                ),
            }
        } else {
            if self.db.exists() {
                info!("removing previous run database '{}'", self.db.path().display());
            }
            self.db.remove()?;
        }
        self.state = SimulationState::Running;
        Ok(())
    }

    fn run_step(&mut self) -> SaltResult<()> {
        self.state = SimulationState::Running;
        let step = StepContext {
            step_index: self.step_index,
            power_w: self.config.reactor.power_levels[self.step_index],
            step_days: self.config.step_days(self.step_index),
            restart: self.restarted,
        };
        info!(
            "step {}: {:.3e} W for {} d on geometry '{}'",
            step.step_index,
            step.power_w,
            step.step_days,
            self.code.current_geometry()
        );

        self.code.write_input(&step)?;
        let output = self.code.run()?;
        // The refill target is the salt mass filling the configured
        // core volume at the fresh-salt density measured on the first
        // step.
        let configured_volume = self.config.reactor.volume;
        let target = *self
            .target_mass
            .get_or_insert(output.core_begin.density * configured_volume);

        self.check_geometry_trigger(output.keff_end.0);

        let outcome = reprocess(
            &output.core_end,
            &self.graph,
            &self.order,
            &self.library,
            step.step_days * SECONDS_PER_DAY,
        )?;
        let mut core = outcome.core;
        core.volume = configured_volume;
        core.mass_flowrate = self.config.reactor.mass_flowrate;
        core.renormalize();
        let refilled_mass = refill(&mut core, target, self.library.feed.as_ref())?;

        self.state = SimulationState::Checkpoint;
        self.code.write_material(&core)?;
        let record = StepRecord {
            step_index: self.step_index,
            cumulative_days: self.config.reactor.dep_step_length_cumulative[self.step_index],
            power_level: output.power_w,
            keff_begin: output.keff_begin,
            keff_end: output.keff_end,
            geometry: self.code.current_geometry().to_string(),
            geometry_cursor: self.code.geometry_cursor(),
            target_mass: target,
            core,
            waste: outcome.waste,
            refilled_mass,
            execution_time_s: output.execution_time_s,
        };
        self.db.append(&record)?;
        self.step_index += 1;
        Ok(())
    }

    /// Switch to the next geometry deck when the measured end-of-step
    /// k falls below the threshold. An exhausted deck list downgrades
    /// to a warning so the run can burn on.
    fn check_geometry_trigger(&mut self, keff_end: f64) {
        if !self.config.simulation.adjust_geo {
            return;
        }
        if keff_end >= self.config.simulation.k_switch_threshold {
            return;
        }
        match self.code.switch_geometry() {
            Ok(()) => info!(
                "k = {keff_end:.5} below {:.5}; switching to geometry '{}'",
                self.config.simulation.k_switch_threshold,
                self.code.current_geometry()
            ),
            Err(e) => warn!("k = {keff_end:.5} below threshold but {e}"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// SCPN Salt Loop — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Main input file model.
//!
//! Maps 1:1 to the user-facing JSON schema: which depletion code to
//! drive, where its templates and geometry decks live, the reprocessing
//! network description files, and the reactor power/step schedule.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{SaltError, SaltResult};

/// Supported external depletion code families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeKind {
    Serpent,
    Openmc,
}

/// Top-level run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MainConfig {
    /// JSON file describing extraction processes and the makeup feed.
    pub proc_input_file: String,
    /// DOT file wiring the processes into a flow network.
    pub dot_input_file: String,
    /// Directory receiving iteration decks and the checkpoint database.
    pub output_path: String,
    pub depcode: DepcodeConfig,
    pub simulation: SimulationConfig,
    pub reactor: ReactorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepcodeConfig {
    pub codename: CodeKind,
    pub exec_path: String,
    /// Single-deck template (Serpent-class).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_path: Option<String>,
    /// Role-tagged template set (OpenMC-class).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_paths: Option<TemplatePaths>,
    #[serde(default = "default_npop")]
    pub npop: u32,
    #[serde(default = "default_cycles")]
    pub active_cycles: u32,
    #[serde(default = "default_cycles")]
    pub inactive_cycles: u32,
    /// Geometry decks in switch order; the run starts on the first.
    pub geo_file: Vec<String>,
}

/// The four role-tagged template files of the OpenMC-class code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplatePaths {
    pub settings: String,
    pub materials: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plots: Option<String>,
    pub chain_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub sim_name: String,
    /// Checkpoint database filename, created under `output_path`.
    pub db_name: String,
    /// Resume from the last checkpoint instead of starting fresh.
    #[serde(default)]
    pub restart_flag: bool,
    /// Switch geometry when the k-eigenvalue falls below the threshold.
    #[serde(default)]
    pub adjust_geo: bool,
    #[serde(default = "default_k_threshold")]
    pub k_switch_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactorConfig {
    /// Core salt volume [cm^3].
    pub volume: f64,
    /// Loop mass flowrate [g/s].
    pub mass_flowrate: f64,
    /// Power level per depletion step [W].
    pub power_levels: Vec<f64>,
    /// Cumulative depletion time at the end of each step [d].
    pub dep_step_length_cumulative: Vec<f64>,
}

fn default_npop() -> u32 {
    50
}
fn default_cycles() -> u32 {
    20
}
fn default_k_threshold() -> f64 {
    1.0
}

impl MainConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> SaltResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Cross-field checks the schema alone cannot express.
    pub fn validate(&self) -> SaltResult<()> {
        let reactor = &self.reactor;
        if reactor.power_levels.is_empty() {
            return Err(SaltError::Config(
                "reactor.power_levels must name at least one depletion step".to_string(),
            ));
        }
        if reactor.power_levels.len() != reactor.dep_step_length_cumulative.len() {
            return Err(SaltError::Config(format!(
                "reactor.power_levels ({}) and reactor.dep_step_length_cumulative ({}) \
                 must have the same length",
                reactor.power_levels.len(),
                reactor.dep_step_length_cumulative.len()
            )));
        }
        let schedule = &reactor.dep_step_length_cumulative;
        for i in 1..schedule.len() {
            if schedule[i] <= schedule[i - 1] {
                return Err(SaltError::Config(format!(
                    "reactor.dep_step_length_cumulative must be strictly increasing \
                     (step {} is {} after {})",
                    i,
                    schedule[i],
                    schedule[i - 1]
                )));
            }
        }
        if self.depcode.geo_file.is_empty() {
            return Err(SaltError::Config(
                "depcode.geo_file must list at least one geometry deck".to_string(),
            ));
        }
        match self.depcode.codename {
            CodeKind::Serpent => {
                if self.depcode.template_path.is_none() {
                    return Err(SaltError::Config(
                        "serpent depcode requires depcode.template_path".to_string(),
                    ));
                }
            }
            CodeKind::Openmc => {
                if self.depcode.template_paths.is_none() {
                    return Err(SaltError::Config(
                        "openmc depcode requires depcode.template_paths".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Number of configured depletion steps.
    pub fn step_count(&self) -> usize {
        self.reactor.power_levels.len()
    }

    /// Length of one step [d] from the cumulative schedule.
    pub fn step_days(&self, step_index: usize) -> f64 {
        let schedule = &self.reactor.dep_step_length_cumulative;
        if step_index == 0 {
            schedule[0]
        } else {
            schedule[step_index] - schedule[step_index - 1]
        }
    }
}

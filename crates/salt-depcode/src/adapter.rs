// ─────────────────────────────────────────────────────────────────────
// SCPN Salt Loop — Adapter Contract
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! The contract every depletion backend implements, plus the shared
//! subprocess helper.

use std::path::Path;
use std::process::Command;

use log::info;

use salt_types::config::{CodeKind, DepcodeConfig};
use salt_types::error::{SaltError, SaltResult};
use salt_types::material::Material;

use crate::openmc::OpenmcCode;
use crate::serpent::SerpentCode;

/// Everything a backend needs to know about the step it is preparing.
#[derive(Debug, Clone, Copy)]
pub struct StepContext {
    pub step_index: usize,
    /// Thermal power for this step [W].
    pub power_w: f64,
    /// Length of this step [d].
    pub step_days: f64,
    /// True when the run resumed from a checkpoint.
    pub restart: bool,
}

/// Parsed results of one depletion run.
#[derive(Debug, Clone)]
pub struct StepOutput {
    /// Core salt at the beginning of the step.
    pub core_begin: Material,
    /// Core salt at the end of the step.
    pub core_end: Material,
    /// k-eigenvalue (value, MC std-dev) at beginning of step.
    pub keff_begin: (f64, f64),
    /// k-eigenvalue (value, MC std-dev) at end of step.
    pub keff_end: (f64, f64),
    /// Depletion interval the code actually burned [d].
    pub burn_days: f64,
    /// Wall time the external code reported [s].
    pub execution_time_s: f64,
    /// Power level the code ran at [W].
    pub power_w: f64,
}

/// One external Monte Carlo depletion code.
///
/// The deck (`write_input`) and the rewritable material file
/// (`write_material`) are separate so restart can re-emit the
/// checkpointed composition without re-deriving the deck.
pub trait DepletionCode {
    /// Produce the native input deck for one step. The first step of a
    /// fresh run merges the user template; later steps re-edit the
    /// iteration deck in place.
    fn write_input(&mut self, step: &StepContext) -> SaltResult<()>;

    /// Serialize the core salt into the iteration material file the
    /// next run consumes.
    fn write_material(&mut self, core: &Material) -> SaltResult<()>;

    /// Run the external code, blocking until it exits, then parse its
    /// native output into a `StepOutput`.
    fn run(&mut self) -> SaltResult<StepOutput>;

    /// Advance to the next geometry deck in the user-ordered list.
    fn switch_geometry(&mut self) -> SaltResult<()>;

    /// Geometry deck the next run will use.
    fn current_geometry(&self) -> &str;

    /// Index into the geometry list, persisted in the step record.
    fn geometry_cursor(&self) -> usize;

    /// Reposition the geometry cursor when restoring from a checkpoint.
    fn set_geometry_cursor(&mut self, cursor: usize) -> SaltResult<()>;
}

/// Construct the backend named by the config.
pub fn create(config: &DepcodeConfig, output_path: &Path) -> SaltResult<Box<dyn DepletionCode>> {
    match config.codename {
        CodeKind::Serpent => Ok(Box::new(SerpentCode::new(config, output_path)?)),
        CodeKind::Openmc => Ok(Box::new(OpenmcCode::new(config, output_path)?)),
    }
}

/// Run an external executable, capturing output. Non-zero exit becomes
/// an `ExternalCode` error carrying the tail of stderr.
pub(crate) fn run_external(exec_path: &str, args: &[String]) -> SaltResult<()> {
    info!("running {exec_path} {}", args.join(" "));
    let output = Command::new(exec_path).args(args).output().map_err(|e| {
        SaltError::ExternalCode(format!("could not launch '{exec_path}': {e}"))
    })?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let tail: Vec<&str> = stderr.lines().rev().take(12).collect();
        let tail: Vec<&str> = tail.into_iter().rev().collect();
        return Err(SaltError::ExternalCode(format!(
            "'{exec_path}' exited with {}; stderr tail:\n{}",
            output.status,
            tail.join("\n")
        )));
    }
    info!("finished {exec_path}");
    Ok(())
}

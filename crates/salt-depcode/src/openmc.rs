// ─────────────────────────────────────────────────────────────────────
// SCPN Salt Loop — OpenMC-Class Adapter
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! OpenMC-class backend: role-tagged JSON templates plus a wrapper
//! executable.
//!
//! Each step this adapter writes a depletion-settings file (timestep,
//! power, chain file, Monte Carlo parameters, active geometry) and a
//! materials file, then invokes the wrapper, which is expected to leave
//! a `depletion_results.json` in the output directory: k-eigenvalue
//! pairs per burn point, per-material nuclide masses in grams at begin
//! and end of step, and the step diagnostics.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;

use salt_types::config::{DepcodeConfig, TemplatePaths};
use salt_types::error::{SaltError, SaltResult};
use salt_types::material::Material;

use crate::adapter::{run_external, DepletionCode, StepContext, StepOutput};

pub struct OpenmcCode {
    exec_path: String,
    templates: TemplatePaths,
    /// Depletion settings, rewritten every step.
    iter_settings: PathBuf,
    /// Rewritable material file the wrapper consumes.
    iter_matfile: PathBuf,
    results_path: PathBuf,
    geo_files: Vec<String>,
    geo_cursor: usize,
    npop: u32,
    active_cycles: u32,
    inactive_cycles: u32,
}

/// Wrapper output schema.
#[derive(Debug, Deserialize)]
struct DepletionResults {
    /// (value, MC std-dev) per burn point, begin of step first.
    keff: Vec<[f64; 2]>,
    burn_days: f64,
    power_w: f64,
    #[serde(default)]
    execution_time_s: f64,
    materials: IndexMap<String, MaterialResult>,
}

#[derive(Debug, Deserialize)]
struct MaterialResult {
    volume: f64,
    #[serde(default)]
    temperature: f64,
    #[serde(default)]
    burnup: f64,
    /// Nuclide name to mass [g] at begin and end of step.
    nuclides: IndexMap<String, [f64; 2]>,
}

impl OpenmcCode {
    pub fn new(config: &DepcodeConfig, output_path: &Path) -> SaltResult<Self> {
        let templates = config.template_paths.clone().ok_or_else(|| {
            SaltError::Config("openmc backend requires depcode.template_paths".to_string())
        })?;
        fs::create_dir_all(output_path)?;
        Ok(OpenmcCode {
            exec_path: config.exec_path.clone(),
            templates,
            iter_settings: output_path.join("depletion_settings.json"),
            iter_matfile: output_path.join("materials.json"),
            results_path: output_path.join("depletion_results.json"),
            geo_files: config.geo_file.clone(),
            geo_cursor: 0,
            npop: config.npop,
            active_cycles: config.active_cycles,
            inactive_cycles: config.inactive_cycles,
        })
    }

    /// Read the settings template and override the Monte Carlo
    /// parameters, leaving all other user keys untouched.
    fn merged_settings(&self) -> SaltResult<serde_json::Value> {
        let text = fs::read_to_string(&self.templates.settings)?;
        let mut settings: serde_json::Value = serde_json::from_str(&text)?;
        let object = settings.as_object_mut().ok_or_else(|| {
            SaltError::Config(format!(
                "settings template '{}' is not a JSON object",
                self.templates.settings
            ))
        })?;
        object.insert("particles".to_string(), self.npop.into());
        object.insert(
            "batches".to_string(),
            (self.active_cycles + self.inactive_cycles).into(),
        );
        object.insert("inactive".to_string(), self.inactive_cycles.into());
        Ok(settings)
    }
}

impl DepletionCode for OpenmcCode {
    fn write_input(&mut self, step: &StepContext) -> SaltResult<()> {
        if step.step_index == 0 && !step.restart {
            fs::copy(&self.templates.materials, &self.iter_matfile)?;
            if let Some(plots) = &self.templates.plots {
                let name = Path::new(plots)
                    .file_name()
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("plots.json"));
                let dest = self.iter_settings.with_file_name(name);
                fs::copy(plots, dest)?;
            }
        }
        let deck = serde_json::json!({
            "timesteps": [step.step_days],
            "timestep_units": "d",
            "power": [step.power_w],
            "chain_file": self.templates.chain_file,
            "geometry": self.current_geometry(),
            "materials": self.iter_matfile.display().to_string(),
            "settings": self.merged_settings()?,
        });
        fs::write(&self.iter_settings, serde_json::to_string_pretty(&deck)?)?;
        Ok(())
    }

    fn write_material(&mut self, core: &Material) -> SaltResult<()> {
        if core.mass <= 0.0 {
            return Err(SaltError::Config(
                "cannot write a material file for a zero-mass core".to_string(),
            ));
        }
        let doc = serde_json::json!({ "fuel": core });
        fs::write(&self.iter_matfile, serde_json::to_string_pretty(&doc)?)?;
        Ok(())
    }

    fn run(&mut self) -> SaltResult<StepOutput> {
        run_external(
            &self.exec_path,
            &[
                "--settings".to_string(),
                self.iter_settings.display().to_string(),
                "--results".to_string(),
                self.results_path.display().to_string(),
            ],
        )?;
        let text = fs::read_to_string(&self.results_path).map_err(|e| {
            SaltError::ExternalCode(format!(
                "missing depletion results '{}': {e}",
                self.results_path.display()
            ))
        })?;
        let results: DepletionResults = serde_json::from_str(&text).map_err(|e| {
            SaltError::ExternalCode(format!(
                "unparseable depletion results '{}': {e}",
                self.results_path.display()
            ))
        })?;
        parse_results(&results)
    }

    fn switch_geometry(&mut self) -> SaltResult<()> {
        if self.geo_cursor + 1 >= self.geo_files.len() {
            return Err(SaltError::Config(format!(
                "geometry list exhausted after '{}'",
                self.current_geometry()
            )));
        }
        self.geo_cursor += 1;
        Ok(())
    }

    fn current_geometry(&self) -> &str {
        &self.geo_files[self.geo_cursor]
    }

    fn geometry_cursor(&self) -> usize {
        self.geo_cursor
    }

    fn set_geometry_cursor(&mut self, cursor: usize) -> SaltResult<()> {
        if cursor >= self.geo_files.len() {
            return Err(SaltError::Config(format!(
                "geometry cursor {cursor} out of range ({} decks)",
                self.geo_files.len()
            )));
        }
        self.geo_cursor = cursor;
        Ok(())
    }
}

fn parse_results(results: &DepletionResults) -> SaltResult<StepOutput> {
    let keff_begin = results.keff.first().copied().ok_or_else(|| {
        SaltError::ExternalCode("depletion results carry no k-eigenvalue".to_string())
    })?;
    let keff_end = results.keff.last().copied().ok_or_else(|| {
        SaltError::ExternalCode("depletion results carry no k-eigenvalue".to_string())
    })?;
    let (name, burnable) = results.materials.first().ok_or_else(|| {
        SaltError::ExternalCode("depletion results carry no materials".to_string())
    })?;
    let core_begin = material_at(name, burnable, 0)?;
    let core_end = material_at(name, burnable, 1)?;
    Ok(StepOutput {
        core_begin,
        core_end,
        keff_begin: (keff_begin[0], keff_begin[1]),
        keff_end: (keff_end[0], keff_end[1]),
        burn_days: results.burn_days,
        execution_time_s: results.execution_time_s,
        power_w: results.power_w,
    })
}

fn material_at(name: &str, result: &MaterialResult, moment: usize) -> SaltResult<Material> {
    let mut comp = IndexMap::with_capacity(result.nuclides.len());
    for (nuclide, masses) in &result.nuclides {
        let grams = *masses.get(moment).ok_or_else(|| {
            SaltError::ExternalCode(format!(
                "material '{name}' nuclide '{nuclide}' has no burn point {moment}"
            ))
        })?;
        comp.insert(nuclide.clone(), grams);
    }
    let mut material = Material::from_composition(comp);
    material.volume = result.volume;
    material.temperature = result.temperature;
    material.burnup = result.burnup;
    material.renormalize();
    Ok(material)
}

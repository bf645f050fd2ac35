// ─────────────────────────────────────────────────────────────────────
// SCPN Salt Loop — Extraction Processes
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Extraction unit operations.
//!
//! Each process splits an incoming salt stream into a product stream
//! (returned to the loop) and a waste stream, per-element removal
//! efficiencies deciding the split. Per-nuclide mass conservation is
//! checked after every call and is never corrected silently.

use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;

use salt_types::error::{SaltError, SaltResult};
use salt_types::material::{Material, MASS_TOLERANCE};
use salt_types::nuclide::element_of;

/// Product/waste pair produced by one pass through a unit operation.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub product: Material,
    pub waste: Material,
}

/// A named unit operation with an element-keyed removal-efficiency model.
pub trait ExtractionProcess: std::fmt::Debug {
    fn name(&self) -> &str;

    /// Fraction of `element` removed by one call spanning `duration_s`
    /// seconds of throughput. Values outside [0, 1] are clamped by the
    /// caller.
    fn removal_fraction(&self, element: &str, duration_s: f64) -> f64;

    /// Split `feed` into product and waste streams.
    fn process(&self, feed: &Material, duration_s: f64) -> SaltResult<Extraction> {
        let mut product = Material::empty();
        let mut waste = Material::empty();
        for (nuclide, &grams) in &feed.comp {
            let eps = self
                .removal_fraction(element_of(nuclide), duration_s)
                .clamp(0.0, 1.0);
            product.comp.insert(nuclide.clone(), grams * (1.0 - eps));
            waste.comp.insert(nuclide.clone(), grams * eps);
        }
        product.mass = product.composition_mass();
        waste.mass = waste.composition_mass();
        product.volume = feed.volume;
        product.temperature = feed.temperature;
        product.mass_flowrate = feed.mass_flowrate;
        product.burnup = feed.burnup;
        waste.temperature = feed.temperature;
        if product.volume > 0.0 {
            product.density = product.mass / product.volume;
        }
        check_conservation(self.name(), feed, &product, &waste)?;
        Ok(Extraction { product, waste })
    }
}

/// Per-nuclide `feed == product + waste` within tolerance.
fn check_conservation(
    name: &str,
    feed: &Material,
    product: &Material,
    waste: &Material,
) -> SaltResult<()> {
    for (nuclide, &grams) in &feed.comp {
        let out = product.nuclide_mass(nuclide) + waste.nuclide_mass(nuclide);
        let scale = grams.abs().max(1.0);
        if (out - grams).abs() > MASS_TOLERANCE * scale {
            return Err(SaltError::MassBalance {
                nuclide: format!("{nuclide} (process '{name}')"),
                expected: grams,
                actual: out,
            });
        }
    }
    Ok(())
}

/// Generic removal with flat user-specified per-element efficiencies.
#[derive(Debug, Clone)]
pub struct FixedEfficiency {
    name: String,
    efficiency: IndexMap<String, f64>,
}

impl FixedEfficiency {
    pub fn new(name: impl Into<String>, efficiency: IndexMap<String, f64>) -> SaltResult<Self> {
        let name = name.into();
        for (element, &eps) in &efficiency {
            if !(0.0..=1.0).contains(&eps) {
                return Err(SaltError::Config(format!(
                    "Process '{name}': efficiency for {element} must be in [0, 1], got {eps}"
                )));
            }
        }
        Ok(FixedEfficiency { name, efficiency })
    }
}

impl ExtractionProcess for FixedEfficiency {
    fn name(&self) -> &str {
        &self.name
    }

    fn removal_fraction(&self, element: &str, _duration_s: f64) -> f64 {
        self.efficiency.get(element).copied().unwrap_or(0.0)
    }
}

/// Helium-bubbling gas stripper.
///
/// One pass through the contactor removes
/// `(1 - exp(-K_L a V / Q_salt)) / (1 + Q_salt / (H Q_gas))` of a
/// strippable element; over a step the salt makes
/// `duration * Q_salt / V` passes, so the step-level removal saturates
/// toward complete stripping for long steps.
#[derive(Debug, Clone)]
pub struct Sparger {
    name: String,
    /// Liquid-side mass-transfer coefficient [cm/s].
    pub mass_transfer_coeff: f64,
    /// Bubble interfacial area per contactor volume [cm^2/cm^3].
    pub interfacial_area: f64,
    /// Contactor volume [cm^3].
    pub contactor_volume: f64,
    /// Salt flowrate through the contactor [cm^3/s].
    pub salt_flowrate: f64,
    /// Sweep-gas flowrate [cm^3/s].
    pub gas_flowrate: f64,
    /// Dimensionless gas/salt partition factor.
    pub henry_factor: f64,
    /// Elements the sweep gas can carry.
    pub targets: Vec<String>,
}

impl Sparger {
    fn per_pass_efficiency(&self) -> f64 {
        let transfer =
            self.mass_transfer_coeff * self.interfacial_area * self.contactor_volume
                / self.salt_flowrate;
        let equilibrium = 1.0 + self.salt_flowrate / (self.henry_factor * self.gas_flowrate);
        (1.0 - (-transfer).exp()) / equilibrium
    }
}

impl ExtractionProcess for Sparger {
    fn name(&self) -> &str {
        &self.name
    }

    fn removal_fraction(&self, element: &str, duration_s: f64) -> f64 {
        if !self.targets.iter().any(|t| t == element) {
            return 0.0;
        }
        let passes = duration_s * self.salt_flowrate / self.contactor_volume;
        let retained_per_pass = 1.0 - self.per_pass_efficiency();
        1.0 - retained_per_pass.powf(passes.max(1.0))
    }
}

/// Centrifugal gas-salt entrainment separator.
///
/// Removal of a target element rides on the entrained gas fraction `f`
/// and the separation factor `S`: `eps = S f / (1 + f (S - 1))`.
#[derive(Debug, Clone)]
pub struct Separator {
    name: String,
    pub separation_factor: f64,
    /// Entrained gas void fraction at the separator inlet.
    pub gas_fraction: f64,
    pub targets: Vec<String>,
}

impl ExtractionProcess for Separator {
    fn name(&self) -> &str {
        &self.name
    }

    fn removal_fraction(&self, element: &str, _duration_s: f64) -> f64 {
        if !self.targets.iter().any(|t| t == element) {
            return 0.0;
        }
        let s = self.separation_factor;
        let f = self.gas_fraction;
        s * f / (1.0 + f * (s - 1.0))
    }
}

fn default_gas_targets() -> Vec<String> {
    vec![
        "He".to_string(),
        "Xe".to_string(),
        "Kr".to_string(),
        "H".to_string(),
    ]
}

fn default_henry_factor() -> f64 {
    1.0
}

/// One process entry in the `proc_input_file` JSON.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProcessSpec {
    Fixed {
        efficiency: IndexMap<String, f64>,
    },
    Sparger {
        mass_transfer_coeff: f64,
        interfacial_area: f64,
        contactor_volume: f64,
        salt_flowrate: f64,
        gas_flowrate: f64,
        #[serde(default = "default_henry_factor")]
        henry_factor: f64,
        #[serde(default = "default_gas_targets")]
        targets: Vec<String>,
    },
    Separator {
        separation_factor: f64,
        gas_fraction: f64,
        #[serde(default = "default_gas_targets")]
        targets: Vec<String>,
    },
}

/// Makeup-feed entry in the `proc_input_file` JSON. Composition is in
/// grams on an arbitrary basis; refill rescales it to the shortfall.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedSpec {
    pub comp: IndexMap<String, f64>,
    #[serde(default)]
    pub density: f64,
    #[serde(default)]
    pub volume: f64,
}

impl FeedSpec {
    pub fn into_material(self) -> Material {
        let mut feed = Material::from_composition(self.comp);
        feed.density = self.density;
        feed.volume = self.volume;
        feed
    }
}

#[derive(Debug, Clone, Deserialize)]
struct LibraryFile {
    processes: IndexMap<String, ProcessSpec>,
    #[serde(default)]
    feed: Option<FeedSpec>,
}

/// All configured unit operations plus the optional makeup feed.
#[derive(Debug)]
pub struct ProcessLibrary {
    processes: IndexMap<String, Box<dyn ExtractionProcess>>,
    pub feed: Option<Material>,
}

impl ProcessLibrary {
    pub fn from_file<P: AsRef<Path>>(path: P) -> SaltResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn from_json(text: &str) -> SaltResult<Self> {
        let file: LibraryFile = serde_json::from_str(text)?;
        let mut processes: IndexMap<String, Box<dyn ExtractionProcess>> = IndexMap::new();
        for (name, spec) in file.processes {
            let process = build_process(&name, spec)?;
            processes.insert(name, process);
        }
        Ok(ProcessLibrary {
            processes,
            feed: file.feed.map(FeedSpec::into_material),
        })
    }

    pub fn get(&self, name: &str) -> Option<&dyn ExtractionProcess> {
        self.processes.get(name).map(|p| p.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.processes.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.processes.keys().map(|s| s.as_str())
    }
}

fn build_process(name: &str, spec: ProcessSpec) -> SaltResult<Box<dyn ExtractionProcess>> {
    match spec {
        ProcessSpec::Fixed { efficiency } => {
            Ok(Box::new(FixedEfficiency::new(name, efficiency)?))
        }
        ProcessSpec::Sparger {
            mass_transfer_coeff,
            interfacial_area,
            contactor_volume,
            salt_flowrate,
            gas_flowrate,
            henry_factor,
            targets,
        } => {
            for (label, value) in [
                ("mass_transfer_coeff", mass_transfer_coeff),
                ("interfacial_area", interfacial_area),
                ("contactor_volume", contactor_volume),
                ("salt_flowrate", salt_flowrate),
                ("gas_flowrate", gas_flowrate),
                ("henry_factor", henry_factor),
            ] {
                if value <= 0.0 {
                    return Err(SaltError::Config(format!(
                        "Sparger '{name}': {label} must be positive, got {value}"
                    )));
                }
            }
            Ok(Box::new(Sparger {
                name: name.to_string(),
                mass_transfer_coeff,
                interfacial_area,
                contactor_volume,
                salt_flowrate,
                gas_flowrate,
                henry_factor,
                targets,
            }))
        }
        ProcessSpec::Separator {
            separation_factor,
            gas_fraction,
            targets,
        } => {
            if separation_factor < 0.0 {
                return Err(SaltError::Config(format!(
                    "Separator '{name}': separation_factor must be non-negative"
                )));
            }
            if !(0.0..=1.0).contains(&gas_fraction) {
                return Err(SaltError::Config(format!(
                    "Separator '{name}': gas_fraction must be in [0, 1], got {gas_fraction}"
                )));
            }
            Ok(Box::new(Separator {
                name: name.to_string(),
                separation_factor,
                gas_fraction,
                targets,
            }))
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// SCPN Salt Loop — Material Inventory
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Salt-stream material inventory.
//!
//! A `Material` is the per-nuclide mass map of one salt stream plus its
//! bulk physical state. Every component of the step loop mutates or
//! snapshots this structure; the one invariant everybody relies on is
//! that `mass` stays equal to the sum of the composition map.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{SaltError, SaltResult};

/// Relative tolerance for the composition/total-mass invariant.
pub const MASS_TOLERANCE: f64 = 1e-9;

/// Isotopic composition and bulk state of one salt stream.
///
/// Composition is nuclide name → mass in grams, insertion-ordered so
/// serialized snapshots and written input decks are deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub comp: IndexMap<String, f64>,
    /// Total mass [g]. Kept in sync with `comp` by every operation.
    pub mass: f64,
    /// Bulk density [g/cm^3].
    pub density: f64,
    /// Stream volume [cm^3].
    pub volume: f64,
    /// Temperature [K].
    pub temperature: f64,
    /// Loop mass flowrate [g/s].
    pub mass_flowrate: f64,
    /// Gas void fraction in the salt.
    pub void_fraction: f64,
    /// Accumulated burnup [MWd/kgHM].
    pub burnup: f64,
}

impl Material {
    /// Build from a composition map; total mass is the composition sum.
    pub fn from_composition(comp: IndexMap<String, f64>) -> Self {
        let mass = comp.values().sum();
        Material {
            comp,
            mass,
            density: 0.0,
            volume: 0.0,
            temperature: 0.0,
            mass_flowrate: 0.0,
            void_fraction: 0.0,
            burnup: 0.0,
        }
    }

    /// Zero-mass stream carrying no nuclides.
    pub fn empty() -> Self {
        Material::from_composition(IndexMap::new())
    }

    /// Mass of one nuclide [g]; absent nuclides weigh nothing.
    pub fn nuclide_mass(&self, nuclide: &str) -> f64 {
        self.comp.get(nuclide).copied().unwrap_or(0.0)
    }

    /// Sum of the composition map [g].
    pub fn composition_mass(&self) -> f64 {
        self.comp.values().sum()
    }

    /// Verify the composition/total-mass invariant.
    pub fn assert_mass_balance(&self) -> SaltResult<()> {
        let sum = self.composition_mass();
        let scale = self.mass.abs().max(sum.abs()).max(1.0);
        if (sum - self.mass).abs() > MASS_TOLERANCE * scale {
            return Err(SaltError::MassBalance {
                nuclide: "<total>".to_string(),
                expected: self.mass,
                actual: sum,
            });
        }
        Ok(())
    }

    /// Copy with every nuclide mass (and the volume) scaled by `factor`.
    /// Used for stream splitting and feed dosing.
    pub fn scaled(&self, factor: f64) -> Self {
        let comp: IndexMap<String, f64> =
            self.comp.iter().map(|(k, v)| (k.clone(), v * factor)).collect();
        Material {
            mass: self.mass * factor,
            volume: self.volume * factor,
            comp,
            ..self.clone()
        }
    }

    /// Merge another stream into this one, summing per-nuclide masses.
    pub fn absorb(&mut self, other: &Material) {
        for (nuclide, grams) in &other.comp {
            *self.comp.entry(nuclide.clone()).or_insert(0.0) += grams;
        }
        self.mass += other.mass;
        self.volume += other.volume;
    }

    /// Recompute total mass from the composition and refresh density.
    /// Call after any in-place composition edit.
    pub fn renormalize(&mut self) {
        self.mass = self.composition_mass();
        if self.volume > 0.0 {
            self.density = self.mass / self.volume;
        }
    }
}

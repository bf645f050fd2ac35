// ─────────────────────────────────────────────────────────────────────
// SCPN Salt Loop — Reprocessing Engine
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Per-step application of the resolved flow graph to the core salt.
//!
//! `reprocess` walks the topological order, feeding each unit operation
//! the sum of its routed upstream streams and collecting waste per
//! process; whatever is not routed onward returns to the core. `refill`
//! then closes the mass deficit with the configured makeup feed.
//! Extraction strictly precedes refill within a step.

use indexmap::IndexMap;
use log::{debug, info};

use salt_types::error::{SaltError, SaltResult};
use salt_types::material::{Material, MASS_TOLERANCE};

use crate::graph::{NodeIndex, ProcessGraph};
use crate::process::ProcessLibrary;

/// Result of one reprocessing pass.
#[derive(Debug, Clone)]
pub struct ReprocessOutcome {
    /// Core salt after extraction, before refill.
    pub core: Material,
    /// Waste stream per process name, declaration order.
    pub waste: IndexMap<String, Material>,
    /// Total mass pulled out of the loop [g].
    pub extracted_mass: f64,
}

/// Route `stream` along `graph.outgoing(node)`: split per edge fraction,
/// return lanes and the unrouted remainder go back to the core.
fn route(
    stream: &Material,
    graph: &ProcessGraph,
    node: NodeIndex,
    inbox: &mut [Material],
    returned: &mut Material,
) {
    let edges = graph.outgoing(node);
    let mut routed = 0.0;
    for edge in edges {
        let part = stream.scaled(edge.fraction);
        routed += edge.fraction;
        if edge.to == graph.core() {
            returned.absorb(&part);
        } else {
            inbox[edge.to].absorb(&part);
        }
    }
    let remainder = 1.0 - routed;
    if remainder > MASS_TOLERANCE {
        returned.absorb(&stream.scaled(remainder));
    }
}

/// Apply the resolved graph to the core material for one step of
/// `duration_s` seconds.
pub fn reprocess(
    core: &Material,
    graph: &ProcessGraph,
    order: &[NodeIndex],
    library: &ProcessLibrary,
    duration_s: f64,
) -> SaltResult<ReprocessOutcome> {
    let mut inbox: Vec<Material> = vec![Material::empty(); graph.node_count()];
    let mut returned = Material::empty();
    let mut waste: IndexMap<String, Material> = IndexMap::new();

    route(core, graph, graph.core(), &mut inbox, &mut returned);

    for &node in order {
        let name = graph.node_name(node);
        let process = library.get(name).ok_or_else(|| {
            SaltError::Graph(format!("Flow graph references undeclared process '{name}'"))
        })?;
        let feed = std::mem::replace(&mut inbox[node], Material::empty());
        let extraction = process.process(&feed, duration_s)?;
        debug!(
            "process '{}': feed {:.6e} g, waste {:.6e} g",
            name, feed.mass, extraction.waste.mass
        );
        waste.insert(name.to_string(), extraction.waste);
        route(&extraction.product, graph, node, &mut inbox, &mut returned);
    }

    let mut out = returned;
    out.volume = core.volume;
    out.temperature = core.temperature;
    out.mass_flowrate = core.mass_flowrate;
    out.void_fraction = core.void_fraction;
    out.burnup = core.burnup;
    out.renormalize();

    let extracted_mass: f64 = waste.values().map(|w| w.mass).sum();
    let balance = out.mass + extracted_mass;
    if (balance - core.mass).abs() > MASS_TOLERANCE * core.mass.abs().max(1.0) {
        return Err(SaltError::MassBalance {
            nuclide: "<reprocess total>".to_string(),
            expected: core.mass,
            actual: balance,
        });
    }
    info!(
        "reprocessed core: {:.6e} g kept, {:.6e} g extracted across {} processes",
        out.mass,
        extracted_mass,
        waste.len()
    );

    Ok(ReprocessOutcome {
        core: out,
        waste,
        extracted_mass,
    })
}

/// Close the post-extraction deficit against `target_mass` with the
/// makeup feed. Returns the grams added.
pub fn refill(
    core: &mut Material,
    target_mass: f64,
    feed: Option<&Material>,
) -> SaltResult<f64> {
    let shortfall = target_mass - core.mass;
    if shortfall <= MASS_TOLERANCE * target_mass.abs().max(1.0) {
        return Ok(0.0);
    }
    let feed = feed.ok_or_else(|| {
        SaltError::Config(format!(
            "Core is {shortfall:.6e} g short of target but no feed composition is configured"
        ))
    })?;
    if feed.mass <= 0.0 {
        return Err(SaltError::Config(
            "Configured feed composition has zero mass".to_string(),
        ));
    }
    let dose = feed.scaled(shortfall / feed.mass);
    let volume = core.volume;
    core.absorb(&dose);
    core.volume = volume;
    core.renormalize();
    core.assert_mass_balance()?;
    info!("refilled core with {shortfall:.6e} g of makeup feed");
    Ok(shortfall)
}

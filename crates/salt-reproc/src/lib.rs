// ─────────────────────────────────────────────────────────────────────
// SCPN Salt Loop — Salt Reprocessing
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Fuel-salt reprocessing: extraction unit operations, the process-flow
//! graph, and the per-step reprocess/refill engine.

pub mod engine;
pub mod graph;
pub mod process;

// ─────────────────────────────────────────────────────────────────────
// SCPN Salt Loop — Simulation Crate
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! The outer depletion loop: per-step orchestration of the external
//! code, the reprocessing engine, and the durable checkpoint database.

pub mod checkpoint;
pub mod controller;

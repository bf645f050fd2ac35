// ─────────────────────────────────────────────────────────────────────
// SCPN Salt Loop — Depletion Code Adapters
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Adapters for the external Monte Carlo depletion codes.
//!
//! One trait, two backends: a Serpent-class code driven through a
//! single text deck, and an OpenMC-class code driven through a set of
//! role-tagged template files plus a wrapper executable. The rest of
//! the loop only ever sees `Box<dyn DepletionCode>`.

pub mod adapter;
pub mod openmc;
pub mod serpent;

pub use adapter::{create, DepletionCode, StepContext, StepOutput};

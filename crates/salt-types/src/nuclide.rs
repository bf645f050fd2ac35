// ─────────────────────────────────────────────────────────────────────
// SCPN Salt Loop — Nuclide Naming
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Nuclide identifier conversions.
//!
//! Canonical human notation is `Xe135` / `Am242m1` (element symbol, mass
//! number, optional metastable suffix). The Serpent-class code family
//! encodes nuclides as `zzaaam` integers and folds metastable states into
//! the mass-number field (`aaa + 200`, or `aaa + 100` above Z=76), so both
//! directions of that folding live here.

use crate::error::{SaltError, SaltResult};

/// Element symbols indexed by Z-1, hydrogen through fermium.
const ELEMENT_SYMBOLS: [&str; 100] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S", "Cl",
    "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As",
    "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In",
    "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd", "Tb",
    "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", "Tl",
    "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk",
    "Cf", "Es", "Fm",
];

/// Symbol for proton number `z`.
pub fn element_symbol(z: u32) -> SaltResult<&'static str> {
    if z == 0 || z as usize > ELEMENT_SYMBOLS.len() {
        return Err(SaltError::Config(format!(
            "Unknown element with Z = {z}"
        )));
    }
    Ok(ELEMENT_SYMBOLS[z as usize - 1])
}

/// Proton number for an element symbol (case-sensitive, `"Xe"` → 54).
pub fn element_z(symbol: &str) -> SaltResult<u32> {
    ELEMENT_SYMBOLS
        .iter()
        .position(|&s| s == symbol)
        .map(|i| i as u32 + 1)
        .ok_or_else(|| SaltError::Config(format!("Unknown element symbol '{symbol}'")))
}

/// Leading element symbol of a nuclide name (`"Xe135"` → `"Xe"`,
/// `"Cnat"` → `"C"`). Removal efficiencies are keyed by element, not
/// isotope, so every extraction path goes through this.
pub fn element_of(name: &str) -> &str {
    // Natural-element entries carry an all-alphabetic `nat` tail that
    // must not be folded into the symbol.
    let stem = match name.strip_suffix("nat") {
        Some(s) if !s.is_empty() => s,
        _ => name,
    };
    let end = stem
        .char_indices()
        .find(|(_, c)| !c.is_ascii_alphabetic())
        .map(|(i, _)| i)
        .unwrap_or(stem.len());
    &stem[..end]
}

/// Human-readable name for a `zzaaam` code (`541350` → `"Xe135"`,
/// `952421` → `"Am242m1"`).
pub fn zzaaam_to_name(code: u32) -> SaltResult<String> {
    let z = code / 10_000;
    let a = (code / 10) % 1_000;
    let m = code % 10;
    let symbol = element_symbol(z)?;
    let mut name = if a == 0 {
        format!("{symbol}nat")
    } else {
        format!("{symbol}{a}")
    };
    if m > 0 {
        name.push('m');
        name.push_str(&m.to_string());
    }
    Ok(name)
}

/// Parse a canonical name back to its `zzaaam` code.
pub fn name_to_zzaaam(name: &str) -> SaltResult<u32> {
    let symbol = element_of(name);
    if symbol.is_empty() {
        return Err(SaltError::Config(format!(
            "Nuclide name '{name}' has no element symbol"
        )));
    }
    let z = element_z(symbol)?;
    let rest = &name[symbol.len()..];
    let (a_str, m) = match rest.split_once('m') {
        Some((a, m_str)) => {
            let m: u32 = m_str.parse().map_err(|_| {
                SaltError::Config(format!("Bad metastable suffix in nuclide '{name}'"))
            })?;
            (a, m)
        }
        None => (rest, 0),
    };
    let a: u32 = if a_str == "nat" {
        0
    } else {
        a_str.parse().map_err(|_| {
            SaltError::Config(format!("Bad mass number in nuclide '{name}'"))
        })?
    };
    if a >= 1_000 || m >= 10 {
        return Err(SaltError::Config(format!(
            "Nuclide '{name}' out of zzaaam range"
        )));
    }
    Ok(z * 10_000 + a * 10 + m)
}

/// Unfold a Serpent-class `zzaaa` code to `zzaaam`. Metastable states
/// arrive with the mass number shifted by 200 (or 100 above Z=76), e.g.
/// `47310` for Ag-110m1 or `95342` for Am-242m1.
pub fn serpent_zzaaa_to_zzaaam(code: u32) -> SaltResult<u32> {
    let z = code / 1_000;
    let a = code % 1_000;
    if z == 0 || z as usize > ELEMENT_SYMBOLS.len() {
        return Err(SaltError::Config(format!(
            "Bad Serpent nuclide code {code}"
        )));
    }
    if a > 300 {
        let a_true = if z > 76 { a - 100 } else { a - 200 };
        Ok(z * 10_000 + a_true * 10 + 1)
    } else {
        Ok(z * 10_000 + a * 10)
    }
}

/// Fold a `zzaaam` code into the Serpent-class `zzaaa` representation.
pub fn zzaaam_to_serpent_zzaaa(code: u32) -> u32 {
    let z = code / 10_000;
    let a = (code / 10) % 1_000;
    let m = code % 10;
    if m > 0 {
        let shift = if z > 76 { 100 } else { 200 };
        z * 1_000 + a + shift
    } else {
        z * 1_000 + a
    }
}

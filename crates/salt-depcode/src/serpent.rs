// ─────────────────────────────────────────────────────────────────────
// SCPN Salt Loop — Serpent-Class Adapter
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Serpent-class backend: single text deck, MATLAB-syntax output files.
//!
//! The user template is merged once at the first step of a fresh run:
//! the neutron population line is rewritten, the active geometry deck
//! is injected as an `include`, and the materials `include` is
//! redirected to a rewritable iteration file. Every later step re-edits
//! the iteration deck in place, so user content outside those three
//! lines survives verbatim. Results come back through `<input>_dep.m`
//! (per-nuclide mass densities) and `<input>_res.m` (k-eigenvalue and
//! step diagnostics).

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use salt_types::config::DepcodeConfig;
use salt_types::error::{SaltError, SaltResult};
use salt_types::material::Material;
use salt_types::nuclide::{name_to_zzaaam, zzaaam_to_name, zzaaam_to_serpent_zzaaa};

use crate::adapter::{run_external, DepletionCode, StepContext, StepOutput};

/// Cross-section library suffix for transport nuclides.
const XS_LIBRARY: &str = "09c";

pub struct SerpentCode {
    exec_path: String,
    template_path: PathBuf,
    /// Iteration deck, rewritten every step.
    input_path: PathBuf,
    /// Rewritable material file the deck includes.
    iter_matfile: PathBuf,
    geo_files: Vec<String>,
    geo_cursor: usize,
    npop: u32,
    active_cycles: u32,
    inactive_cycles: u32,
    /// Burnable material name, discovered from the first parsed output.
    material_name: String,
}

impl SerpentCode {
    pub fn new(config: &DepcodeConfig, output_path: &Path) -> SaltResult<Self> {
        let template_path = config.template_path.as_deref().ok_or_else(|| {
            SaltError::Config("serpent backend requires depcode.template_path".to_string())
        })?;
        fs::create_dir_all(output_path)?;
        Ok(SerpentCode {
            exec_path: config.exec_path.clone(),
            template_path: PathBuf::from(template_path),
            input_path: output_path.join("serpent_input"),
            iter_matfile: output_path.join("serpent_materials"),
            geo_files: config.geo_file.clone(),
            geo_cursor: 0,
            npop: config.npop,
            active_cycles: config.active_cycles,
            inactive_cycles: config.inactive_cycles,
            material_name: "fuel".to_string(),
        })
    }

    fn read_lines(path: &Path) -> SaltResult<Vec<String>> {
        let contents = fs::read_to_string(path)?;
        Ok(contents.lines().map(str::to_string).collect())
    }

    /// Rewrite the `set pop` line to the configured Monte Carlo
    /// parameters. The template must carry exactly one.
    fn set_population(&self, lines: &mut [String]) -> SaltResult<()> {
        let hits: Vec<usize> = lines
            .iter()
            .enumerate()
            .filter(|(_, l)| l.trim_start().starts_with("set pop"))
            .map(|(i, _)| i)
            .collect();
        match hits.as_slice() {
            [idx] => {
                lines[*idx] = format!(
                    "set pop {} {} {}",
                    self.npop, self.active_cycles, self.inactive_cycles
                );
                Ok(())
            }
            [] => Err(SaltError::Config(format!(
                "template '{}' has no 'set pop' line",
                self.template_path.display()
            ))),
            _ => Err(SaltError::Config(format!(
                "template '{}' has multiple 'set pop' lines",
                self.template_path.display()
            ))),
        }
    }

    /// Copy the template's material include target into the iteration
    /// material file and point the deck at it.
    fn redirect_materials(&self, lines: &mut [String]) -> SaltResult<()> {
        let idx = lines
            .iter()
            .position(|l| l.trim_start().starts_with("include "))
            .ok_or_else(|| {
                SaltError::Config(format!(
                    "template '{}' has no materials include statement",
                    self.template_path.display()
                ))
            })?;
        let target = lines[idx]
            .split('"')
            .nth(1)
            .map(str::to_string)
            .ok_or_else(|| {
                SaltError::Config(format!(
                    "malformed include statement: '{}'",
                    lines[idx].trim()
                ))
            })?;
        let source = if Path::new(&target).is_absolute() {
            PathBuf::from(&target)
        } else {
            self.template_path
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(&target)
        };
        let contents = fs::read_to_string(&source)?;
        if !contents.contains("mat ") {
            return Err(SaltError::Config(format!(
                "first include '{}' carries no material definitions",
                source.display()
            )));
        }
        fs::write(&self.iter_matfile, contents)?;
        lines[idx] = format!("include \"{}\"", self.iter_matfile.display());
        Ok(())
    }

    /// Point the deck at the active geometry, replacing a previous
    /// geometry include if one is present.
    fn set_geometry(&self, lines: &mut Vec<String>) {
        let geo_line = format!("include \"{}\"", self.current_geometry());
        let existing = lines.iter().position(|l| {
            l.trim_start()
                .strip_prefix("include ")
                .map(|rest| rest.trim().trim_matches('"'))
                .is_some_and(|target| self.geo_files.iter().any(|g| g == target))
        });
        match existing {
            Some(idx) => lines[idx] = geo_line,
            None => {
                let at = lines.len().min(1);
                lines.insert(at, geo_line);
            }
        }
    }

    /// Replace or insert the `set power P dep daystep D` line that
    /// activates depletion mode for this step.
    fn set_burnup(lines: &mut Vec<String>, step: &StepContext) {
        let burn_line = format!(
            "set power {:.9E} dep daystep {:.5E}",
            step.power_w, step.step_days
        );
        match lines
            .iter()
            .position(|l| l.trim_start().starts_with("set power"))
        {
            Some(idx) => lines[idx] = burn_line,
            None => {
                let at = lines.len().min(8);
                lines.insert(at, burn_line);
            }
        }
    }

    fn dep_path(&self) -> PathBuf {
        PathBuf::from(format!("{}_dep.m", self.input_path.display()))
    }

    fn res_path(&self) -> PathBuf {
        PathBuf::from(format!("{}_res.m", self.input_path.display()))
    }
}

impl DepletionCode for SerpentCode {
    fn write_input(&mut self, step: &StepContext) -> SaltResult<()> {
        let mut lines = if step.step_index == 0 && !step.restart {
            let mut lines = Self::read_lines(&self.template_path)?;
            self.set_population(&mut lines)?;
            self.redirect_materials(&mut lines)?;
            lines
        } else {
            Self::read_lines(&self.input_path)?
        };
        self.set_geometry(&mut lines);
        Self::set_burnup(&mut lines, step);
        fs::write(&self.input_path, lines.join("\n") + "\n")?;
        Ok(())
    }

    fn write_material(&mut self, core: &Material) -> SaltResult<()> {
        if core.mass <= 0.0 {
            return Err(SaltError::Config(
                "cannot write a material file for a zero-mass core".to_string(),
            ));
        }
        let mut out = String::from("% Material compositions (iteration deck)\n\n");
        out.push_str(&format!(
            "mat {} -{:.9E} burn 1 fix {} {:.0} vol {:.5E}\n",
            self.material_name, core.density, XS_LIBRARY, core.temperature, core.volume
        ));
        for (name, grams) in &core.comp {
            let code = zzaaam_to_serpent_zzaaa(name_to_zzaaam(name)?);
            out.push_str(&format!(
                "           {code}.{XS_LIBRARY}  -{:.14E}\n",
                grams / core.mass
            ));
        }
        fs::write(&self.iter_matfile, out)?;
        Ok(())
    }

    fn run(&mut self) -> SaltResult<StepOutput> {
        run_external(
            &self.exec_path,
            &[self.input_path.display().to_string()],
        )?;

        let dep_text = fs::read_to_string(self.dep_path()).map_err(|e| {
            SaltError::ExternalCode(format!(
                "missing depletion output '{}': {e}",
                self.dep_path().display()
            ))
        })?;
        let dep = parse_matlab_arrays(&dep_text)?;
        let (name, core_begin) = material_at(&dep, 0)?;
        let (_, core_end) = material_at(&dep, 1)?;
        self.material_name = name;

        let res_text = fs::read_to_string(self.res_path()).map_err(|e| {
            SaltError::ExternalCode(format!(
                "missing results output '{}': {e}",
                self.res_path().display()
            ))
        })?;
        let res = parse_matlab_arrays(&res_text)?;
        let keff = res_rows(&res, "IMP_KEFF")?;
        let keff_begin = keff_pair(keff.first(), "IMP_KEFF")?;
        let keff_end = keff_pair(keff.last(), "IMP_KEFF")?;
        let burn_days = res_scalar(&res, "BURN_DAYS")?;
        let power_w = res_scalar(&res, "TOT_POWER")?;
        let execution_time_s = res_scalar(&res, "RUNNING_TIME")?;

        Ok(StepOutput {
            core_begin,
            core_end,
            keff_begin,
            keff_end,
            burn_days,
            execution_time_s,
            power_w,
        })
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

/// Parse MATLAB-syntax `NAME = [ ... ];` assignments into rows of
/// floats. Repeated names (one assignment per burn point in the
/// results file) stack their rows in file order. Assignments whose
/// right-hand side is not a bracketed numeric array (the quoted
/// `VERSION`/`TITLE`/path strings heading a results file) are skipped.
fn parse_matlab_arrays(text: &str) -> SaltResult<IndexMap<String, Vec<Vec<f64>>>> {
    let mut arrays: IndexMap<String, Vec<Vec<f64>>> = IndexMap::new();
    let mut current: Option<String> = None;

    for raw_line in text.lines() {
        let line = raw_line.split('%').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let (data, closes) = match &current {
            None => {
                let Some(eq) = line.find('=') else {
                    continue;
                };
                let rhs = line[eq + 1..].trim_start();
                if !rhs.starts_with('[') {
                    continue;
                }
                let key = line
                    .split_whitespace()
                    .next()
                    .unwrap_or_default()
                    .to_string();
                if key.is_empty() {
                    continue;
                }
                current = Some(key);
                (&rhs[1..], rhs.contains(']'))
            }
            Some(_) => (line, line.contains(']')),
        };
        let data = data
            .trim()
            .trim_end_matches(';')
            .trim_end()
            .trim_end_matches(']')
            .trim();
        let key = current.clone().unwrap_or_default();
        if !data.is_empty() {
            let row: SaltResult<Vec<f64>> = data
                .split_whitespace()
                .map(|tok| {
                    tok.parse::<f64>().map_err(|e| {
                        SaltError::ExternalCode(format!(
                            "unparseable value '{tok}' in array '{key}': {e}"
                        ))
                    })
                })
                .collect();
            arrays.entry(key.clone()).or_default().push(row?);
        }
        if closes {
            current = None;
        }
    }
    Ok(arrays)
}

/// Build the burnable material at one burn point (0 = begin of step,
/// 1 = end of step). Returns the discovered material name with it.
fn material_at(
    arrays: &IndexMap<String, Vec<Vec<f64>>>,
    moment: usize,
) -> SaltResult<(String, Material)> {
    let mdens_key = arrays
        .keys()
        .find(|k| k.starts_with("MAT_") && k.ends_with("_MDENS"))
        .ok_or_else(|| {
            SaltError::ExternalCode("depletion output has no MAT_*_MDENS array".to_string())
        })?;
    let name = mdens_key
        .trim_start_matches("MAT_")
        .trim_end_matches("_MDENS")
        .to_string();

    let zai = arrays.get("ZAI").ok_or_else(|| {
        SaltError::ExternalCode("depletion output has no ZAI array".to_string())
    })?;
    let mdens = &arrays[mdens_key];
    let volume = dep_value(arrays, &format!("MAT_{name}_VOLUME"), moment)?;
    let burnup = dep_value(arrays, &format!("MAT_{name}_BURNUP"), moment)?;

    // The last two ZAI entries are the lost and total pseudo-nuclides;
    // the last mass-density row is the total.
    let nuclide_count = zai.len().saturating_sub(2);
    let mut comp = IndexMap::with_capacity(nuclide_count);
    for (row, code) in zai.iter().take(nuclide_count).enumerate() {
        let code = code.first().copied().unwrap_or(-1.0);
        if code < 0.0 {
            continue;
        }
        let density = *mdens
            .get(row)
            .and_then(|r| r.get(moment))
            .ok_or_else(|| {
                SaltError::ExternalCode(format!(
                    "mass-density array of '{name}' has no burn point {moment}"
                ))
            })?;
        let nuclide = zzaaam_to_name(code as u32)?;
        comp.insert(nuclide, density * volume);
    }

    // The reported bulk density includes the lost pseudo-nuclide; the
    // total mass must stay the composition sum, so recompute both.
    let mut material = Material::from_composition(comp);
    material.volume = volume;
    material.burnup = burnup;
    material.renormalize();
    Ok((name, material))
}

fn dep_value(
    arrays: &IndexMap<String, Vec<Vec<f64>>>,
    key: &str,
    moment: usize,
) -> SaltResult<f64> {
    arrays
        .get(key)
        .and_then(|rows| rows.first())
        .and_then(|row| row.get(moment))
        .copied()
        .ok_or_else(|| {
            SaltError::ExternalCode(format!(
                "depletion output has no '{key}' value at burn point {moment}"
            ))
        })
}

fn res_rows<'a>(
    arrays: &'a IndexMap<String, Vec<Vec<f64>>>,
    key: &str,
) -> SaltResult<&'a Vec<Vec<f64>>> {
    arrays.get(key).ok_or_else(|| {
        SaltError::ExternalCode(format!("results output has no '{key}' array"))
    })
}

fn keff_pair(row: Option<&Vec<f64>>, key: &str) -> SaltResult<(f64, f64)> {
    let row = row.ok_or_else(|| {
        SaltError::ExternalCode(format!("results output '{key}' array is empty"))
    })?;
    match row.as_slice() {
        [value, stddev, ..] => Ok((*value, *stddev)),
        _ => Err(SaltError::ExternalCode(format!(
            "results output '{key}' row carries fewer than two values"
        ))),
    }
}

fn res_scalar(arrays: &IndexMap<String, Vec<Vec<f64>>>, key: &str) -> SaltResult<f64> {
    res_rows(arrays, key)?
        .last()
        .and_then(|row| row.first())
        .copied()
        .ok_or_else(|| {
            SaltError::ExternalCode(format!("results output '{key}' array is empty"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use indexmap::indexmap;
    use salt_types::config::CodeKind;
    use tempfile::TempDir;

    fn sample_config(template: &Path, geo: &[&str]) -> DepcodeConfig {
        DepcodeConfig {
            codename: CodeKind::Serpent,
            exec_path: "sss2".to_string(),
            template_path: Some(template.display().to_string()),
            template_paths: None,
            npop: 500,
            active_cycles: 40,
            inactive_cycles: 20,
            geo_file: geo.iter().map(|g| g.to_string()).collect(),
        }
    }

    fn write_template(dir: &Path) -> PathBuf {
        let matfile = dir.join("mats.ini");
        fs::write(
            &matfile,
            "mat fuel -2.0 burn 1 fix 09c 900 vol 1.0E+03\n           3007.09c  -1.0\n",
        )
        .unwrap();
        let template = dir.join("reactor.serpent");
        fs::write(
            &template,
            "set title \"msbr\"\n\
             set acelib \"endfb71\"\n\
             include \"mats.ini\"\n\
             set pop 100 50 50\n\
             set bc 1\n",
        )
        .unwrap();
        template
    }

    fn step(index: usize, restart: bool) -> StepContext {
        StepContext {
            step_index: index,
            power_w: 2.25e9,
            step_days: 3.0,
            restart,
        }
    }

    #[test]
    fn test_first_step_merges_template() {
        let dir = TempDir::new().unwrap();
        let template = write_template(dir.path());
        let out = dir.path().join("out");
        let config = sample_config(&template, &["geo_full.ini", "geo_half.ini"]);
        let mut code = SerpentCode::new(&config, &out).unwrap();

        code.write_input(&step(0, false)).unwrap();
        let deck = fs::read_to_string(out.join("serpent_input")).unwrap();
        assert!(deck.contains("set pop 500 40 20"));
        assert!(deck.contains("include \"geo_full.ini\""));
        assert!(deck.contains("set power 2.250000000E9 dep daystep 3.00000E0"));
        assert!(!deck.contains("include \"mats.ini\""));

        // The materials include was copied and redirected.
        let iter_mats = fs::read_to_string(out.join("serpent_materials")).unwrap();
        assert!(iter_mats.contains("mat fuel"));
        assert!(deck.contains("serpent_materials"));
    }

    #[test]
    fn test_later_steps_reedit_iteration_deck() {
        let dir = TempDir::new().unwrap();
        let template = write_template(dir.path());
        let out = dir.path().join("out");
        let config = sample_config(&template, &["geo_full.ini"]);
        let mut code = SerpentCode::new(&config, &out).unwrap();

        code.write_input(&step(0, false)).unwrap();
        let mut second = step(1, false);
        second.power_w = 1.0e9;
        second.step_days = 6.0;
        code.write_input(&second).unwrap();

        let deck = fs::read_to_string(out.join("serpent_input")).unwrap();
        assert_eq!(deck.matches("set power").count(), 1);
        assert_eq!(deck.matches("include \"geo_full.ini\"").count(), 1);
        assert!(deck.contains("set power 1.000000000E9 dep daystep 6.00000E0"));
        assert!(deck.contains("set title \"msbr\""));
    }

    #[test]
    fn test_geometry_switch_rewrites_include() {
        let dir = TempDir::new().unwrap();
        let template = write_template(dir.path());
        let out = dir.path().join("out");
        let config = sample_config(&template, &["geo_full.ini", "geo_half.ini"]);
        let mut code = SerpentCode::new(&config, &out).unwrap();

        code.write_input(&step(0, false)).unwrap();
        code.switch_geometry().unwrap();
        code.write_input(&step(1, false)).unwrap();

        let deck = fs::read_to_string(out.join("serpent_input")).unwrap();
        assert!(deck.contains("include \"geo_half.ini\""));
        assert!(!deck.contains("include \"geo_full.ini\""));
    }

    #[test]
    fn test_geometry_exhaustion_rejected() {
        let dir = TempDir::new().unwrap();
        let template = write_template(dir.path());
        let config = sample_config(&template, &["geo_full.ini"]);
        let mut code = SerpentCode::new(&config, &dir.path().join("out")).unwrap();
        let err = code.switch_geometry().expect_err("single deck cannot switch");
        match err {
            SaltError::Config(msg) => assert!(msg.contains("exhausted")),
            other => panic!("Unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_template_without_pop_rejected() {
        let dir = TempDir::new().unwrap();
        let template = dir.path().join("bad.serpent");
        fs::write(&template, "set title \"x\"\ninclude \"mats.ini\"\n").unwrap();
        let config = sample_config(&template, &["geo.ini"]);
        let mut code = SerpentCode::new(&config, &dir.path().join("out")).unwrap();
        let err = code
            .write_input(&step(0, false))
            .expect_err("missing set pop must fail");
        match err {
            SaltError::Config(msg) => assert!(msg.contains("set pop")),
            other => panic!("Unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_material_file_format() {
        let dir = TempDir::new().unwrap();
        let template = write_template(dir.path());
        let out = dir.path().join("out");
        let config = sample_config(&template, &["geo.ini"]);
        let mut code = SerpentCode::new(&config, &out).unwrap();

        let mut core = Material::from_composition(indexmap! {
            "Li7".to_string() => 400.0,
            "U235".to_string() => 100.0,
            "Am242m1".to_string() => 500.0,
            "Cnat".to_string() => 1000.0,
        });
        core.volume = 1000.0;
        core.temperature = 900.0;
        core.renormalize();
        code.write_material(&core).unwrap();

        let text = fs::read_to_string(out.join("serpent_materials")).unwrap();
        assert!(text.contains("mat fuel -2.000000000E0 burn 1 fix 09c 900 vol 1.00000E3"));
        assert!(text.contains("3007.09c  -2.00000000000000E-1"));
        assert!(text.contains("92235.09c  -5.00000000000000E-2"));
        // Metastable Am-242m1 folds into the 3xx mass-number form.
        assert!(text.contains("95342.09c  -2.50000000000000E-1"));
        // Natural carbon keeps its zero mass number.
        assert!(text.contains("6000.09c  -5.00000000000000E-1"));
    }

    #[test]
    fn test_dep_parser_reads_both_burn_points() {
        let dep = "\
ZAI = [
30070
541350
922350
-1
0
];
DAYS = [ 0.00000E+00 3.00000E+00 ];
MAT_fuel_VOLUME = [ 1.00000E+03 1.00000E+03 ];
MAT_fuel_BURNUP = [ 0.00000E+00 5.00000E-01 ];
MAT_fuel_MDENS = [
4.00000E-01 3.90000E-01 % Li-7
1.00000E-02 9.00000E-03 % Xe-135
1.00000E-01 9.50000E-02 % U-235
1.00000E-03 1.00000E-03 % lost
5.11000E-01 4.95000E-01 % total
];
";
        let arrays = parse_matlab_arrays(dep).unwrap();
        let (name, begin) = material_at(&arrays, 0).unwrap();
        assert_eq!(name, "fuel");
        assert_relative_eq!(begin.nuclide_mass("Li7"), 400.0, max_relative = 1e-12);
        assert_relative_eq!(begin.nuclide_mass("Xe135"), 10.0, max_relative = 1e-12);
        // The lost pseudo-nuclide row is excluded from the inventory.
        assert_relative_eq!(begin.mass, 510.0, max_relative = 1e-12);
        assert_relative_eq!(begin.density, 0.510, max_relative = 1e-12);
        begin.assert_mass_balance().unwrap();

        let (_, end) = material_at(&arrays, 1).unwrap();
        assert_relative_eq!(end.nuclide_mass("U235"), 95.0, max_relative = 1e-12);
        assert_relative_eq!(end.burnup, 0.5, max_relative = 1e-12);
    }

    #[test]
    fn test_material_writer_dep_parser_agree() {
        // A deck written from a composition and a depletion output
        // generated from the same composition must describe the same
        // material.
        let mut core = Material::from_composition(indexmap! {
            "Li7".to_string() => 400.0,
            "F19".to_string() => 500.0,
            "U235".to_string() => 100.0,
        });
        core.volume = 1000.0;
        core.renormalize();

        let mut dep = String::from("ZAI = [\n");
        for name in core.comp.keys() {
            dep.push_str(&format!("{}\n", name_to_zzaaam(name).unwrap()));
        }
        dep.push_str("-1\n0\n];\n");
        dep.push_str("MAT_fuel_VOLUME = [ 1.00000E+03 1.00000E+03 ];\n");
        dep.push_str("MAT_fuel_BURNUP = [ 0.0 0.0 ];\n");
        dep.push_str("MAT_fuel_MDENS = [\n");
        for grams in core.comp.values() {
            let density = grams / core.volume;
            dep.push_str(&format!("{density:.14E} {density:.14E}\n"));
        }
        dep.push_str("0.0 0.0\n");
        dep.push_str(&format!("{0:.14E} {0:.14E}\n];\n", core.density));

        let arrays = parse_matlab_arrays(&dep).unwrap();
        let (_, parsed) = material_at(&arrays, 0).unwrap();
        for (nuclide, &grams) in &core.comp {
            assert_relative_eq!(
                parsed.nuclide_mass(nuclide),
                grams,
                max_relative = 1e-12
            );
        }
        assert_relative_eq!(parsed.mass, core.mass, max_relative = 1e-12);
    }

    #[test]
    fn test_res_parser_stacks_burn_points() {
        let res = "\
IMP_KEFF                  (idx, [1:   2]) = [  1.02710E+00 9.60000E-04 ];
BURN_DAYS                 (idx, [1:   2]) = [  0.00000E+00 0.00000E+00 ];
TOT_POWER                 (idx, [1:   2]) = [  2.25000E+09 0.00000E+00 ];
RUNNING_TIME              (idx, 1)        = [  1.22000E+01 ];
IMP_KEFF                  (idx, [1:   2]) = [  9.85400E-01 8.90000E-04 ];
BURN_DAYS                 (idx, [1:   2]) = [  3.00000E+00 0.00000E+00 ];
TOT_POWER                 (idx, [1:   2]) = [  2.25000E+09 0.00000E+00 ];
RUNNING_TIME              (idx, 1)        = [  2.41000E+01 ];
";
        let arrays = parse_matlab_arrays(res).unwrap();
        let keff = res_rows(&arrays, "IMP_KEFF").unwrap();
        let begin = keff_pair(keff.first(), "IMP_KEFF").unwrap();
        let end = keff_pair(keff.last(), "IMP_KEFF").unwrap();
        assert_relative_eq!(begin.0, 1.02710, max_relative = 1e-12);
        assert_relative_eq!(begin.1, 9.6e-4, max_relative = 1e-12);
        assert_relative_eq!(end.0, 0.98540, max_relative = 1e-12);
        assert_relative_eq!(res_scalar(&arrays, "BURN_DAYS").unwrap(), 3.0, max_relative = 1e-12);
        assert_relative_eq!(
            res_scalar(&arrays, "RUNNING_TIME").unwrap(),
            24.1,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_res_parser_skips_string_assignments() {
        // A results file opens with quoted string entries; only the
        // bracketed numeric arrays may reach the float parser.
        let res = "\
VERSION                   (idx, [1: 14])  = 'Serpent 2.1.31' ;
COMPILE_DATE              (idx, [1: 20])  = 'Aug 14 2021 16:42:21' ;
TITLE                     (idx, [1:  4]) = 'msbr' ;
INPUT_FILE_NAME           (idx, [1: 13]) = 'serpent_input' ;
HOSTNAME                  (idx, [1:  7]) = 'node-03' ;
CONFIDENCE_BOUNDS         (idx, 1)        = 1 ;
IMP_KEFF                  (idx, [1:   2]) = [  1.02710E+00 9.60000E-04 ];
BURN_DAYS                 (idx, [1:   2]) = [  3.00000E+00 0.00000E+00 ];
TOT_POWER                 (idx, [1:   2]) = [  2.25000E+09 0.00000E+00 ];
RUNNING_TIME              (idx, 1)        = [  1.22000E+01 ];
";
        let arrays = parse_matlab_arrays(res).unwrap();
        assert!(!arrays.contains_key("VERSION"));
        assert!(!arrays.contains_key("CONFIDENCE_BOUNDS"));
        let keff = keff_pair(res_rows(&arrays, "IMP_KEFF").unwrap().first(), "IMP_KEFF").unwrap();
        assert_relative_eq!(keff.0, 1.02710, max_relative = 1e-12);
        assert_relative_eq!(
            res_scalar(&arrays, "BURN_DAYS").unwrap(),
            3.0,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_res_parser_missing_key_errors() {
        let arrays = parse_matlab_arrays("BURN_DAYS (idx, 1) = [ 3.0 ];\n").unwrap();
        let err = res_rows(&arrays, "IMP_KEFF").expect_err("missing keff must fail");
        match err {
            SaltError::ExternalCode(msg) => assert!(msg.contains("IMP_KEFF")),
            other => panic!("Unexpected error: {other:?}"),
        }
    }
}

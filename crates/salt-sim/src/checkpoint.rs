// ─────────────────────────────────────────────────────────────────────
// SCPN Salt Loop — Checkpoint Database
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Append-only JSON-lines step log.
//!
//! One fully self-contained record per depletion step. Every append is
//! flushed and fsynced before the controller moves on, so the last
//! line on disk is either complete or torn by a crash mid-write; a
//! torn trailing line is ignored on resume.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::warn;
use serde::{Deserialize, Serialize};

use salt_types::error::{SaltError, SaltResult};
use salt_types::material::Material;

/// Everything needed to resume the loop after this step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step_index: usize,
    /// Cumulative depletion time at end of step [d].
    pub cumulative_days: f64,
    /// Power level the step ran at [W].
    pub power_level: f64,
    pub keff_begin: (f64, f64),
    pub keff_end: (f64, f64),
    /// Geometry deck in effect after this step; a switch triggered by
    /// this step's k is already reflected here so restart picks it up.
    pub geometry: String,
    pub geometry_cursor: usize,
    /// Core mass the refill closes against [g].
    pub target_mass: f64,
    /// Core salt after reprocessing and refill.
    pub core: Material,
    /// Waste stream per process for this step.
    pub waste: IndexMap<String, Material>,
    /// Makeup feed added this step [g].
    pub refilled_mass: f64,
    /// Wall time the external code reported [s].
    pub execution_time_s: f64,
}

pub struct CheckpointDb {
    path: PathBuf,
}

impl CheckpointDb {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        CheckpointDb { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Delete the database from a previous run. Missing file is fine.
    pub fn remove(&self) -> SaltResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SaltError::Io(e)),
        }
    }

    /// Repair the file tail before appending. A crash mid-append can
    /// leave the last line without its newline: a parseable tail only
    /// lost the terminator, anything else is a torn record and is cut
    /// back to the last complete line.
    fn repair_tail(&self) -> SaltResult<()> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(SaltError::Io(e)),
        };
        if contents.is_empty() || contents.ends_with('\n') {
            return Ok(());
        }
        let tail_start = contents.rfind('\n').map(|p| p + 1).unwrap_or(0);
        if serde_json::from_str::<StepRecord>(&contents[tail_start..]).is_ok() {
            let mut file = OpenOptions::new().append(true).open(&self.path)?;
            file.write_all(b"\n")?;
            file.flush()?;
            file.sync_all()?;
        } else {
            warn!(
                "dropping torn trailing record in '{}'",
                self.path.display()
            );
            let file = OpenOptions::new().write(true).open(&self.path)?;
            file.set_len(tail_start as u64)?;
            file.sync_all()?;
        }
        Ok(())
    }

    /// Append one record and make it durable before returning.
    pub fn append(&self, record: &StepRecord) -> SaltResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        self.repair_tail()?;
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.flush()?;
        file.sync_all()?;
        Ok(())
    }

    /// All complete records in step order. A torn trailing line is
    /// dropped; a torn line anywhere else is corruption and errors.
    pub fn records(&self) -> SaltResult<Vec<StepRecord>> {
        if !self.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&self.path)?;
        let lines: Vec<&str> = contents.lines().filter(|l| !l.trim().is_empty()).collect();
        let mut records = Vec::with_capacity(lines.len());
        for (idx, line) in lines.iter().enumerate() {
            match serde_json::from_str::<StepRecord>(line) {
                Ok(record) => records.push(record),
                Err(e) if idx + 1 == lines.len() => {
                    warn!(
                        "ignoring torn trailing record in '{}': {e}",
                        self.path.display()
                    );
                }
                Err(e) => {
                    return Err(SaltError::Config(format!(
                        "checkpoint database '{}' is corrupt at line {}: {e}",
                        self.path.display(),
                        idx + 1
                    )));
                }
            }
        }
        Ok(records)
    }

    /// The record to resume from, if any. Scans from the tail and
    /// parses at most two lines: the last one, and its predecessor when
    /// the last is torn.
    pub fn last_record(&self) -> SaltResult<Option<StepRecord>> {
        if !self.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path)?;
        let mut tail = contents.lines().filter(|l| !l.trim().is_empty()).rev();
        let Some(last) = tail.next() else {
            return Ok(None);
        };
        match serde_json::from_str(last) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!(
                    "ignoring torn trailing record in '{}': {e}",
                    self.path.display()
                );
                match tail.next() {
                    None => Ok(None),
                    Some(prev) => serde_json::from_str(prev).map(Some).map_err(|e| {
                        SaltError::Config(format!(
                            "checkpoint database '{}' is corrupt before the torn tail: {e}",
                            self.path.display()
                        ))
                    }),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::indexmap;
    use tempfile::TempDir;

    fn record(step_index: usize) -> StepRecord {
        let mut core = Material::from_composition(indexmap! {
            "Li7".to_string() => 400.0,
            "U235".to_string() => 100.0,
        });
        core.volume = 1000.0;
        core.renormalize();
        StepRecord {
            step_index,
            cumulative_days: 3.0 * (step_index + 1) as f64,
            power_level: 2.25e9,
            keff_begin: (1.0271, 9.6e-4),
            keff_end: (0.9854, 8.9e-4),
            geometry: "geo_full.ini".to_string(),
            geometry_cursor: 0,
            target_mass: 500.0,
            core,
            waste: IndexMap::new(),
            refilled_mass: 1.5,
            execution_time_s: 12.2,
        }
    }

    #[test]
    fn test_append_and_read_back() {
        let dir = TempDir::new().unwrap();
        let db = CheckpointDb::new(dir.path().join("steps.jsonl"));
        db.append(&record(0)).unwrap();
        db.append(&record(1)).unwrap();

        let records = db.records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].step_index, 1);
        assert_eq!(db.last_record().unwrap().unwrap(), record(1));
    }

    #[test]
    fn test_missing_database_is_empty() {
        let dir = TempDir::new().unwrap();
        let db = CheckpointDb::new(dir.path().join("absent.jsonl"));
        assert!(db.records().unwrap().is_empty());
        assert!(db.last_record().unwrap().is_none());
        db.remove().expect("removing a missing database is fine");
    }

    #[test]
    fn test_torn_trailing_line_ignored() {
        let dir = TempDir::new().unwrap();
        let db = CheckpointDb::new(dir.path().join("steps.jsonl"));
        db.append(&record(0)).unwrap();
        db.append(&record(1)).unwrap();

        // Simulate a crash mid-write of record 2.
        let mut contents = fs::read_to_string(db.path()).unwrap();
        contents.push_str("{\"step_index\": 2, \"cumulative_da");
        fs::write(db.path(), contents).unwrap();

        assert_eq!(db.last_record().unwrap().unwrap(), record(1));
    }

    #[test]
    fn test_append_truncates_torn_tail() {
        let dir = TempDir::new().unwrap();
        let db = CheckpointDb::new(dir.path().join("steps.jsonl"));
        db.append(&record(0)).unwrap();

        // Crash mid-write of record 1, then the resumed run appends.
        let mut contents = fs::read_to_string(db.path()).unwrap();
        contents.push_str("{\"step_index\": 1, \"cumulative_da");
        fs::write(db.path(), contents).unwrap();
        db.append(&record(1)).unwrap();
        db.append(&record(2)).unwrap();

        let records = db.records().unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[1], record(1));
    }

    #[test]
    fn test_append_completes_unterminated_whole_record() {
        let dir = TempDir::new().unwrap();
        let db = CheckpointDb::new(dir.path().join("steps.jsonl"));
        db.append(&record(0)).unwrap();
        db.append(&record(1)).unwrap();

        // Crash after the record bytes but before the newline: the
        // record is complete and must survive the next append.
        let contents = fs::read_to_string(db.path()).unwrap();
        fs::write(db.path(), contents.trim_end_matches('\n')).unwrap();
        db.append(&record(2)).unwrap();

        let records = db.records().unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[1], record(1));
        assert_eq!(records[2], record(2));
    }

    #[test]
    fn test_torn_middle_line_is_corruption() {
        let dir = TempDir::new().unwrap();
        let db = CheckpointDb::new(dir.path().join("steps.jsonl"));
        db.append(&record(0)).unwrap();
        let good = fs::read_to_string(db.path()).unwrap();
        fs::write(db.path(), format!("{{\"step_index\"\n{good}")).unwrap();

        let err = db.records().expect_err("mid-file corruption must fail");
        match err {
            SaltError::Config(msg) => assert!(msg.contains("corrupt at line 1")),
            other => panic!("Unexpected error: {other:?}"),
        }
    }
}

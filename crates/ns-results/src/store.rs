//! Run storage API.
//!
//! Layout: `<root>/<run_id>/manifest.json`, `sequence.json`, and one
//! `star_<label>.json` per profiled star.

use crate::types::{RunManifest, SequenceRecord, StarProfileRecord};
use crate::{ResultsError, ResultsResult};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug)]
pub struct RunStore {
    root_dir: PathBuf,
}

impl RunStore {
    pub fn new(root_dir: PathBuf) -> ResultsResult<Self> {
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
        }
        Ok(Self { root_dir })
    }

    /// Store next to a run configuration file, under `.nstar/runs`.
    pub fn for_config(config_path: &Path) -> ResultsResult<Self> {
        let config_dir = config_path
            .parent()
            .ok_or_else(|| ResultsError::InvalidPath {
                message: "config path has no parent directory".to_string(),
            })?;
        Self::new(config_dir.join(".nstar").join("runs"))
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn run_dir(&self, run_id: &str) -> PathBuf {
        self.root_dir.join(run_id)
    }

    fn star_path(&self, run_id: &str, label: &str) -> PathBuf {
        self.run_dir(run_id).join(format!("star_{label}.json"))
    }

    pub fn has_run(&self, run_id: &str) -> bool {
        let dir = self.run_dir(run_id);
        dir.join("manifest.json").exists() && dir.join("sequence.json").exists()
    }

    pub fn save_run(&self, manifest: &RunManifest, sequence: &SequenceRecord) -> ResultsResult<()> {
        let run_dir = self.run_dir(&manifest.run_id);
        fs::create_dir_all(&run_dir)?;

        // Sequence first so a manifest never points at a missing sequence.
        fs::write(
            run_dir.join("sequence.json"),
            serde_json::to_string(sequence)?,
        )?;
        fs::write(
            run_dir.join("manifest.json"),
            serde_json::to_string_pretty(manifest)?,
        )?;
        Ok(())
    }

    pub fn load_manifest(&self, run_id: &str) -> ResultsResult<RunManifest> {
        let path = self.run_dir(run_id).join("manifest.json");
        let content = self.read(run_id, &path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn load_sequence(&self, run_id: &str) -> ResultsResult<SequenceRecord> {
        let path = self.run_dir(run_id).join("sequence.json");
        let content = self.read(run_id, &path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn load_run(&self, run_id: &str) -> ResultsResult<(RunManifest, SequenceRecord)> {
        Ok((self.load_manifest(run_id)?, self.load_sequence(run_id)?))
    }

    pub fn save_star(&self, run_id: &str, label: &str, star: &StarProfileRecord) -> ResultsResult<()> {
        fs::create_dir_all(self.run_dir(run_id))?;
        fs::write(
            self.star_path(run_id, label),
            serde_json::to_string_pretty(star)?,
        )?;
        Ok(())
    }

    pub fn has_star(&self, run_id: &str, label: &str) -> bool {
        self.star_path(run_id, label).exists()
    }

    pub fn load_star(&self, run_id: &str, label: &str) -> ResultsResult<StarProfileRecord> {
        let path = self.star_path(run_id, label);
        let content = self.read(run_id, &path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Manifests of all stored runs for one EOS, oldest first.
    pub fn list_runs(&self, eos_name: &str) -> ResultsResult<Vec<RunManifest>> {
        let mut runs = Vec::new();

        if !self.root_dir.exists() {
            return Ok(runs);
        }

        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            if entry.path().is_dir() {
                let run_id = entry.file_name().to_string_lossy().to_string();
                if let Ok(manifest) = self.load_manifest(&run_id)
                    && manifest.eos_name == eos_name
                {
                    runs.push(manifest);
                }
            }
        }

        runs.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(runs)
    }

    pub fn delete_run(&self, run_id: &str) -> ResultsResult<()> {
        let run_dir = self.run_dir(run_id);
        if run_dir.exists() {
            fs::remove_dir_all(run_dir)?;
        }
        Ok(())
    }

    fn read(&self, run_id: &str, path: &Path) -> ResultsResult<String> {
        if !path.exists() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }
        Ok(fs::read_to_string(path)?)
    }
}

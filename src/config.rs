use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use crate::constants::{FLATTEN_BUCKET, SCORE_DEAL, SCORE_FLIP, SCORE_HIGH, SOLVER_MAX_ITERS};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub hints: HintSettings,
    pub solver: SolverSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HintSettings {
    /// Scores shown to the player are rounded down to this bucket.
    pub flatten_bucket: u32,
    pub score_flip: u32,
    pub score_deal: u32,
    /// Flip shortcut and deal suppression threshold.
    pub high_score: u32,
}

impl Default for HintSettings {
    fn default() -> Self {
        Self {
            flatten_bucket: FLATTEN_BUCKET,
            score_flip: SCORE_FLIP,
            score_deal: SCORE_DEAL,
            high_score: SCORE_HIGH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    pub enabled: bool,
    pub fc_solve_command: String,
    pub black_hole_command: String,
    pub max_iters: u32,
    /// Passed as `--load-config` to fc-solve.
    pub preset: Option<String>,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            fc_solve_command: "fc-solve".into(),
            black_hole_command: "black-hole-solve".into(),
            max_iters: SOLVER_MAX_ITERS,
            preset: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Paths {
    pub cfg_file: PathBuf,
    pub cfg_dir: PathBuf,
}

pub fn project_paths() -> Result<Paths> {
    let dirs = ProjectDirs::from("com", "0x4D44", "SolitaireHints")
        .context("Failed to determine project directories")?;
    let cfg_dir = dirs.config_dir().to_path_buf();
    let cfg_file = cfg_dir.join("hints.json");
    Ok(Paths { cfg_file, cfg_dir })
}

impl Config {
    /// Missing or unreadable files give the defaults.
    pub fn load_from(path: &Path) -> Config {
        match fs::read_to_string(path) {
            Ok(s) => serde_json::from_str(&s).unwrap_or_else(|err| {
                tracing::warn!(path = %path.display(), %err, "ignoring malformed config");
                Config::default()
            }),
            Err(_) => Config::default(),
        }
    }

    /// Apply `MDSOL_*` overrides read through `lookup`.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("MDSOL_FCS_COMMAND").filter(|v| !v.trim().is_empty()) {
            self.solver.fc_solve_command = v;
        }
        if let Some(v) = lookup("MDSOL_BHS_COMMAND").filter(|v| !v.trim().is_empty()) {
            self.solver.black_hole_command = v;
        }
        if let Some(n) = lookup("MDSOL_SOLVER_MAX_ITERS").and_then(|v| v.trim().parse().ok()) {
            self.solver.max_iters = n;
        }
        if let Some(v) = lookup("MDSOL_SOLVER_ENABLED") {
            match v.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.solver.enabled = true,
                "0" | "false" | "no" | "off" => self.solver.enabled = false,
                _ => {}
            }
        }
        if let Some(n) = lookup("MDSOL_HINT_FLATTEN").and_then(|v| v.trim().parse().ok()) {
            self.hints.flatten_bucket = n;
        }
    }

    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }
}

pub fn load_or_default() -> Result<(Config, Paths)> {
    let paths = project_paths()?;
    let mut cfg = Config::load_from(&paths.cfg_file);
    cfg.apply_env();
    Ok((cfg, paths))
}

pub fn save_atomic(cfg: &Config, paths: &Paths) -> Result<()> {
    fs::create_dir_all(&paths.cfg_dir).ok();
    let tmp = paths.cfg_file.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(cfg)?;
    {
        let mut f = fs::File::create(&tmp).context("create temp cfg")?;
        f.write_all(&data).context("write temp cfg")?;
        f.sync_all().ok();
    }
    fs::rename(&tmp, &paths.cfg_file).context("rename temp to final")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let cfg: Config = serde_json::from_str(r#"{"solver":{"max_iters":5}}"#).unwrap();
        assert_eq!(cfg.solver.max_iters, 5);
        assert_eq!(cfg.solver.fc_solve_command, "fc-solve");
        assert_eq!(cfg.hints, HintSettings::default());
    }

    #[test]
    fn test_env_overrides_ignore_garbage() {
        let env: HashMap<&str, &str> = [
            ("MDSOL_FCS_COMMAND", "/opt/fcs/fc-solve"),
            ("MDSOL_SOLVER_MAX_ITERS", "not-a-number"),
            ("MDSOL_SOLVER_ENABLED", "off"),
            ("MDSOL_HINT_FLATTEN", "1000"),
        ]
        .into_iter()
        .collect();
        let mut cfg = Config::default();
        cfg.apply_env_with(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.solver.fc_solve_command, "/opt/fcs/fc-solve");
        assert_eq!(cfg.solver.max_iters, SOLVER_MAX_ITERS);
        assert!(!cfg.solver.enabled);
        assert_eq!(cfg.hints.flatten_bucket, 1000);
        assert_eq!(cfg.solver.black_hole_command, "black-hole-solve");
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let cfg = Config::load_from(Path::new("/nonexistent/dir/hints.json"));
        assert_eq!(cfg, Config::default());
    }
}

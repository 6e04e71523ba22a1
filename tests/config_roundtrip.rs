use pretty_assertions::assert_eq;
use solitaire_hint::config::{save_atomic, Config, Paths};
use std::fs;

#[test]
fn save_and_load_roundtrip() {
    let mut cfg = Config::default();
    cfg.hints.flatten_bucket = 1_000;
    cfg.hints.high_score = 95_000;
    cfg.solver.enabled = false;
    cfg.solver.fc_solve_command = "/opt/fcs/bin/fc-solve".into();
    cfg.solver.max_iters = 5_000;
    cfg.solver.preset = Some("lg".into());

    let td = tempfile::tempdir().expect("tmpdir");
    let cfg_dir = td.path().join("cfg");
    let paths = Paths {
        cfg_file: cfg_dir.join("hints.json"),
        cfg_dir,
    };
    save_atomic(&cfg, &paths).expect("save");
    let data = fs::read_to_string(&paths.cfg_file).expect("read file");
    assert!(data.contains("fc_solve_command"));
    assert!(!paths.cfg_file.with_extension("json.tmp").exists());

    let back = Config::load_from(&paths.cfg_file);
    assert_eq!(back, cfg);
}

#[test]
fn malformed_file_loads_defaults() {
    let td = tempfile::tempdir().expect("tmpdir");
    let file = td.path().join("hints.json");
    fs::write(&file, "{ not json").unwrap();
    assert_eq!(Config::load_from(&file), Config::default());
    assert_eq!(Config::load_from(&td.path().join("missing.json")), Config::default());
}

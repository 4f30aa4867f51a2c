use std::path::PathBuf;
use std::sync::Mutex;

use tempfile::NamedTempFile;

use dataset_reader::ReaderConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "DATASET_READER_CONFIG",
        "DATASET_MAIN_PATH",
        "DATASET_DEPTH_PATH",
        "DATASET_CALIB_PATH",
        "DATASET_GAMMA_PATH",
        "DATASET_VIGNETTE_PATH",
        "DATASET_TIMES_PATH",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_toml_config_with_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let toml = r#"
        main_path = "seq/images.zip"
        depth_path = "seq/depth.zip"

        [calibration]
        camera = "seq/camera.txt"
        gamma = "seq/pcalib.txt"
    "#;
    std::io::Write::write_all(&mut file, toml.as_bytes()).expect("write config");

    std::env::set_var("DATASET_READER_CONFIG", file.path());
    std::env::set_var("DATASET_VIGNETTE_PATH", "seq/vignette.png");
    std::env::set_var("DATASET_TIMES_PATH", "seq/times_fixed.txt");

    let cfg = ReaderConfig::load().expect("load config");

    assert_eq!(cfg.main_path, PathBuf::from("seq/images.zip"));
    assert_eq!(cfg.depth_path, Some(PathBuf::from("seq/depth.zip")));
    assert_eq!(cfg.calibration.calibration, PathBuf::from("seq/camera.txt"));
    assert_eq!(cfg.calibration.gamma, Some(PathBuf::from("seq/pcalib.txt")));
    assert_eq!(
        cfg.calibration.vignette,
        Some(PathBuf::from("seq/vignette.png"))
    );
    assert_eq!(cfg.times_file(), PathBuf::from("seq/times_fixed.txt"));

    clear_env();
}

#[test]
fn loads_json_config() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = tempfile::Builder::new()
        .suffix(".json")
        .tempfile()
        .expect("temp config");
    let json = r#"{
        "main_path": "mav0/cam0",
        "calibration": { "camera": "mav0/camera.txt" }
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");
    std::env::set_var("DATASET_READER_CONFIG", file.path());
    std::env::set_var("DATASET_MAIN_PATH", "mav0/cam1");

    let cfg = ReaderConfig::load().expect("load config");
    assert_eq!(cfg.main_path, PathBuf::from("mav0/cam1"));
    assert_eq!(cfg.depth_path, None);
    assert_eq!(cfg.times_file(), PathBuf::from("mav0/times.txt"));

    clear_env();
}

#[test]
fn env_alone_is_enough() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("DATASET_MAIN_PATH", "images");
    std::env::set_var("DATASET_CALIB_PATH", "camera.txt");
    std::env::set_var("DATASET_DEPTH_PATH", "  ");

    let cfg = ReaderConfig::load().expect("load config");
    assert_eq!(cfg, ReaderConfig::new("images", "camera.txt"));

    clear_env();
}

#[test]
fn rejects_missing_inputs_and_bad_files() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("DATASET_MAIN_PATH", "images");
    let err = ReaderConfig::load().unwrap_err();
    assert!(err.to_string().contains("calibration.camera"));

    let mut file = NamedTempFile::new().expect("temp config");
    std::io::Write::write_all(&mut file, b"main_path = [").expect("write config");
    std::env::set_var("DATASET_READER_CONFIG", file.path());
    std::env::set_var("DATASET_CALIB_PATH", "camera.txt");
    let err = ReaderConfig::load().unwrap_err();
    assert!(err.to_string().contains("invalid config file"));

    std::env::set_var("DATASET_READER_CONFIG", "/nonexistent/reader.toml");
    assert!(ReaderConfig::load().is_err());

    clear_env();
}

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};

fn base_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_bcmqa"));
    cmd.env("HOME", home);
    cmd.env_remove("SUDO_UID");
    cmd.env_remove("BCMQA_CONFIG");
    cmd.env_remove("BCMQA_IDENTITY_FILE");
    cmd.env_remove("BCMQA_STATUS_SCRIPT");
    cmd.env_remove("BCMQA_TEST_SCRIPT");
    cmd.env_remove("BCMQA_ARCHIVE_DIR");
    cmd.env_remove("BCMQA_UI_COLOR");
    cmd.env_remove("BCMQA_TIMEOUT_SECS");
    cmd
}

fn make_temp_home() -> PathBuf {
    static HOME_SEQ: AtomicU64 = AtomicU64::new(0);
    let seq = HOME_SEQ.fetch_add(1, Ordering::Relaxed);
    let home = std::env::temp_dir().join(format!(
        "bcmqa-config-test-{}-{seq}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&home);
    std::fs::create_dir_all(&home).expect("create home");
    home
}

fn write_file(path: &Path, bytes: &[u8]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("mkdirs");
    }
    std::fs::write(path, bytes).expect("write");
}

fn show_config(cmd: &mut Command) -> serde_json::Value {
    let out = cmd.arg("--show-config").output().expect("run bcmqa");
    assert!(
        out.status.success(),
        "stderr={}",
        String::from_utf8_lossy(&out.stderr)
    );
    serde_json::from_slice(&out.stdout).expect("parse json")
}

#[test]
fn defaults_without_config_file() {
    let home = make_temp_home();
    let v = show_config(&mut base_cmd(&home));

    assert_eq!(v["identity"]["file"], "~/.bin/username");
    assert_eq!(v["paths"]["status_script"], "./bcm_status.sh");
    assert_eq!(v["paths"]["test_script"], "./bcm_qa.sh");
    assert_eq!(v["paths"]["archive_dir"], "~/Desktop/Test_Results");
    assert_eq!(v["run"]["timeout_secs"], 0);
    assert!(v.get("config_path").is_none());

    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn env_overrides_config_file() {
    let home = make_temp_home();
    write_file(
        home.join(".config/bcmqa/config.toml").as_path(),
        br#"
[paths]
archive_dir = "/srv/from-file"
test_script = "/opt/bcm/bcm_qa.sh"

[ui]
color = false
"#,
    );

    let v = show_config(
        base_cmd(&home)
            .env("BCMQA_ARCHIVE_DIR", "/srv/from-env")
            .env("BCMQA_UI_COLOR", "yes"),
    );

    assert_eq!(v["paths"]["archive_dir"], "/srv/from-env");
    assert_eq!(v["paths"]["test_script"], "/opt/bcm/bcm_qa.sh");
    assert_eq!(v["ui"]["color"], true);
    assert!(v["config_path"].as_str().is_some());

    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn cli_config_path_overrides_env_config_path() {
    let home = make_temp_home();
    let cfg_env = home.join("env-config.toml");
    let cfg_cli = home.join("cli-config.toml");
    write_file(cfg_env.as_path(), b"[run]\ntimeout_secs = 10\n");
    write_file(cfg_cli.as_path(), b"[run]\ntimeout_secs = 600\n");

    let v = show_config(
        base_cmd(&home)
            .env("BCMQA_CONFIG", &cfg_env)
            .arg("--config")
            .arg(&cfg_cli),
    );

    assert_eq!(v["run"]["timeout_secs"], 600);
    assert_eq!(
        v["config_path"].as_str(),
        Some(cfg_cli.display().to_string().as_str())
    );

    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn explicit_missing_config_exits_2() {
    let home = make_temp_home();
    let out = base_cmd(&home)
        .args(["--config", "/nonexistent/bcmqa.toml", "--show-config"])
        .output()
        .expect("run bcmqa");
    assert_eq!(out.status.code(), Some(2));
    let _ = std::fs::remove_dir_all(&home);
}

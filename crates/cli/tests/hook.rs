//! Integration tests running the `playdv` binary the way qBittorrent does.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const GB: u64 = 1024 * 1024 * 1024;

fn write_config(dir: &Path, extra: &str) -> PathBuf {
    let path = dir.join("playdv.toml");
    let body = format!(
        r#"
[qbittorrent]
host = "localhost"
port = 8080
username = "admin"
password = "test"

[paths]
output_dir = "{out}"
log_dir = "{logs}"

[filters]
excluded_categories = ["music", "software"]
{extra}
"#,
        out = dir.join("plex").display(),
        logs = dir.join("logs").display(),
        extra = extra,
    );
    std::fs::write(&path, body).unwrap();
    path
}

fn playdv(config: &Path, name: &str, category: &str, content: &Path, extra: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_playdv"))
        .arg(name)
        .arg(category)
        .arg(content)
        .arg("--config")
        .arg(config)
        .args(extra)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run playdv")
}

#[test]
fn test_missing_config_exits_with_2() {
    let dir = TempDir::new().unwrap();
    let output = playdv(
        &dir.path().join("absent.toml"),
        "Show.S01E01.2160p.DV",
        "tv",
        dir.path(),
        &[],
    );
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_invalid_config_exits_with_2() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("playdv.toml");
    std::fs::write(&config, "[qbittorrent]\nhost = \"localhost\"\nport = 8080\n").unwrap();

    let output = playdv(&config, "Show.S01E01.2160p.DV", "tv", dir.path(), &[]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("qbittorrent.username"), "{}", stderr);
}

#[test]
fn test_excluded_category_is_skipped() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "");
    let content = dir.path().join("Album.2160p.DV.mkv");
    std::fs::write(&content, b"mkv").unwrap();

    let size = (5 * GB).to_string();
    let output = playdv(&config, "Album.2160p.DV", "Music", &content, &["--size", &size]);
    assert_eq!(output.status.code(), Some(0));
    assert!(content.exists());
    assert!(!dir.path().join("plex").exists());
}

#[test]
fn test_too_small_torrent_is_skipped() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "");
    let content = dir.path().join("Show.S01E01.2160p.DV.mkv");
    std::fs::write(&content, b"mkv").unwrap();

    let output = playdv(&config, "Show.S01E01.2160p.DV", "tv", &content, &[]);
    assert_eq!(output.status.code(), Some(0));
    assert!(!dir.path().join("plex").exists());
}

#[cfg(unix)]
mod with_tools {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    const PROBE_JSON: &str = r#"{"streams":[{"index":0,"codec_type":"video","codec_name":"hevc","width":3840,"height":2160,"color_transfer":"smpte2084","side_data_list":[{"side_data_type":"DOVI configuration record","dv_profile":8}]},{"index":1,"codec_type":"audio","codec_name":"eac3","tags":{"language":"eng"}}]}"#;

    fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    fn tools_config(dir: &Path, ffmpeg_body: &str) -> PathBuf {
        let ffprobe = write_script(dir, "ffprobe", &format!("echo '{}'", PROBE_JSON));
        let ffmpeg = write_script(dir, "ffmpeg", ffmpeg_body);
        write_config(
            dir,
            &format!(
                "\n[processing]\nmin_file_size_gb = 0\nffprobe_path = \"{}\"\nffmpeg_path = \"{}\"\ndelete_after_success = true\n",
                ffprobe.display(),
                ffmpeg.display()
            ),
        )
    }

    fn movie(dir: &Path) -> PathBuf {
        let content = dir.join("downloads/Movie.2023.2160p.DV");
        std::fs::create_dir_all(&content).unwrap();
        let file = content.join("Movie.2023.2160p.DV.mkv");
        std::fs::write(&file, b"mkv").unwrap();
        content
    }

    #[test]
    fn test_dry_run_prints_plan() {
        let dir = TempDir::new().unwrap();
        let config = tools_config(dir.path(), "exit 1");
        let content = movie(dir.path());

        let output = playdv(&config, "Movie.2023.2160p.DV", "movies", &content, &["--dry-run"]);
        assert_eq!(output.status.code(), Some(0));

        let plans: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        let plans = plans.as_array().unwrap();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0]["plan"]["dolby_vision"], serde_json::Value::Bool(true));
        assert!(plans[0]["plan"]["output_path"]
            .as_str()
            .unwrap()
            .ends_with("Movie.2023.2160p.DV.mp4"));
        assert!(content.join("Movie.2023.2160p.DV.mkv").exists());
    }

    #[test]
    fn test_conversion_replaces_source() {
        let dir = TempDir::new().unwrap();
        let config = tools_config(dir.path(), r#"for last; do :; done; echo mp4 > "$last""#);
        let content = movie(dir.path());

        let output = playdv(&config, "Movie.2023.2160p.DV", "movies", &content, &[]);
        assert_eq!(
            output.status.code(),
            Some(0),
            "{}",
            String::from_utf8_lossy(&output.stderr)
        );
        assert!(dir.path().join("plex/Movie.2023.2160p.DV.mp4").exists());
        assert!(!content.join("Movie.2023.2160p.DV.mkv").exists());

        let logs: Vec<_> = std::fs::read_dir(dir.path().join("logs"))
            .unwrap()
            .filter_map(Result::ok)
            .collect();
        assert_eq!(logs.len(), 1);
    }

    #[test]
    fn test_failed_conversion_exits_with_1() {
        let dir = TempDir::new().unwrap();
        let config = tools_config(dir.path(), "echo 'Unknown encoder' >&2; exit 1");
        let content = movie(dir.path());

        let output = playdv(&config, "Movie.2023.2160p.DV", "movies", &content, &[]);
        assert_eq!(output.status.code(), Some(1));
        assert!(content.join("Movie.2023.2160p.DV.mkv").exists());
        assert!(!dir.path().join("plex/Movie.2023.2160p.DV.mp4").exists());
    }
}

mod common;
mod utils;

use anyhow::Result;
use common::TestEnvironment;
use std::fs;
use utils::{dialogue_lines, run_barrage_command};

#[test]
fn test_convert_writes_track_next_to_input() -> Result<()> {
    let env = TestEnvironment::new()?;
    env.fixture("live.xml")?;

    let output = run_barrage_command(&env, &["convert", "live.xml"])?;
    assert_eq!(output.exit_code, 0, "convert failed: {}", output.stderr);
    assert!(output.stdout.contains("Wrote 3 overlay events"));

    let bytes = fs::read(env.path().join("live.ass"))?;
    assert!(bytes.starts_with("\u{feff}".as_bytes()), "missing byte order mark");
    let content = String::from_utf8(bytes)?;
    assert!(content.contains("PlayResX: 720\nPlayResY: 1280\n"));

    let lines = dialogue_lines(content.trim_start_matches('\u{feff}'));
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[0],
        r"Dialogue: 0,0:00:00.50,0:00:21.70,Default,,0,0,0,,{\move(920,896,-1000,896)}{\rUsername}kit: {\rDefault}\{first\}"
    );
    assert!(lines[1].starts_with("Dialogue: 0,0:00:01.75,0:00:23.45,"));
    assert!(lines[1].contains(r"{\rUsername}user: {\rDefault}no name given"));
    assert!(lines[2].contains(r"\move(920,960,-1000,960)"));
    assert!(lines[2].contains("that jump & landing"));
    Ok(())
}

#[test]
fn test_convert_reports_skipped_records_as_json() -> Result<()> {
    let env = TestEnvironment::new()?;
    env.fixture("live.xml")?;

    let output = run_barrage_command(
        &env,
        &["--output", "json", "convert", "live.xml", "-o", "out.ass"],
    )?;
    assert_eq!(output.exit_code, 0, "convert failed: {}", output.stderr);

    let parsed = output
        .event("barrage.layout.parsed")
        .expect("parsed event on stdout");
    assert_eq!(parsed["data"]["total"], 5);
    assert_eq!(parsed["data"]["accepted"], 3);
    assert_eq!(parsed["data"]["skipped_malformed"], 1);
    assert_eq!(parsed["data"]["skipped_empty"], 1);

    let tracks = output
        .event("barrage.layout.tracks")
        .expect("track usage event");
    assert_eq!(tracks["data"]["usage"][0], 1);
    assert_eq!(tracks["data"]["usage"][3], 0);

    let written = output
        .event("barrage.convert.written")
        .expect("written event");
    assert_eq!(written["level"], "success");
    assert_eq!(written["data"]["events"], 3);

    // warnings go to stderr
    assert!(output.stderr.contains("barrage.layout.skipped"));
    assert!(env.path().join("out.ass").exists());
    Ok(())
}

#[test]
fn test_convert_refuses_to_overwrite() -> Result<()> {
    let env = TestEnvironment::new()?;
    env.fixture("live.xml")?;
    env.write("live.ass", "keep me")?;

    let output = run_barrage_command(&env, &["convert", "live.xml"])?;
    assert_eq!(output.exit_code, 1);
    assert!(output.stderr.contains("already exists"), "{}", output.stderr);
    assert_eq!(fs::read_to_string(env.path().join("live.ass"))?, "keep me");

    let output = run_barrage_command(&env, &["convert", "live.xml", "--force"])?;
    assert_eq!(output.exit_code, 0, "forced convert failed: {}", output.stderr);
    assert_ne!(fs::read_to_string(env.path().join("live.ass"))?, "keep me");
    Ok(())
}

#[test]
fn test_frame_flags_move_the_tracks() -> Result<()> {
    let env = TestEnvironment::new()?;
    env.fixture("live.xml")?;

    let output = run_barrage_command(
        &env,
        &["convert", "live.xml", "--width", "1080", "--height", "1920"],
    )?;
    assert_eq!(output.exit_code, 0, "convert failed: {}", output.stderr);

    let content = fs::read_to_string(env.path().join("live.ass"))?;
    assert!(content.contains("PlayResX: 1080"));
    // 0.7 * 1920 = 1344, entry at 1080 + 200
    assert!(content.contains(r"{\move(1280,1344,-1000,1344)}"));
    Ok(())
}

#[test]
fn test_invalid_config_fails_before_writing() -> Result<()> {
    let env = TestEnvironment::new()?;
    env.fixture("live.xml")?;
    let config = env.write("bad.toml", "track_count = 0\n")?;

    let output = run_barrage_command(
        &env,
        &["convert", "live.xml", "--config", config.to_str().unwrap()],
    )?;
    assert_eq!(output.exit_code, 1);
    assert!(
        output.stderr.contains("track_count must be at least 1"),
        "{}",
        output.stderr
    );
    assert!(!env.path().join("live.ass").exists());
    Ok(())
}

#[test]
fn test_missing_config_file_is_an_error() -> Result<()> {
    let env = TestEnvironment::new()?;
    env.fixture("live.xml")?;

    let output = run_barrage_command(&env, &["convert", "live.xml", "--config", "nope.toml"])?;
    assert_eq!(output.exit_code, 1);
    assert!(output.stderr.contains("does not exist"), "{}", output.stderr);
    Ok(())
}

#[test]
fn test_broken_xml_is_reported() -> Result<()> {
    let env = TestEnvironment::new()?;
    env.write("broken.xml", "<i><d p=\"1,1,25,1\">unterminated")?;

    let output = run_barrage_command(&env, &["convert", "broken.xml"])?;
    assert_eq!(output.exit_code, 1);
    assert!(
        output.stderr.contains("Failed to read comments"),
        "{}",
        output.stderr
    );
    assert!(!env.path().join("broken.ass").exists());
    Ok(())
}

#[test]
fn test_sample_track() -> Result<()> {
    let env = TestEnvironment::new()?;

    let output = run_barrage_command(&env, &["sample"])?;
    assert_eq!(output.exit_code, 0, "sample failed: {}", output.stderr);

    let content = fs::read_to_string(env.path().join("test_distribution.ass"))?;
    let lines = dialogue_lines(content.trim_start_matches('\u{feff}'));
    assert_eq!(lines.len(), 9);
    assert!(lines[0].starts_with("Dialogue: 0,0:00:01.00,0:00:10.00,"));
    assert!(lines[8].starts_with("Dialogue: 0,0:00:05.00,0:00:14.00,"));

    let output = run_barrage_command(&env, &["sample"])?;
    assert_eq!(output.exit_code, 1, "second sample should not overwrite");
    Ok(())
}

#[test]
fn test_config_init_and_show() -> Result<()> {
    let env = TestEnvironment::new()?;

    let output = run_barrage_command(&env, &["config", "init"])?;
    assert_eq!(output.exit_code, 0, "init failed: {}", output.stderr);
    let written = fs::read_to_string(env.config_file())?;
    assert!(
        written.contains("# Number of horizontal tracks comments rotate over\ntrack_count = 20")
    );

    let output = run_barrage_command(&env, &["config", "init"])?;
    assert_eq!(output.exit_code, 1);

    fs::write(env.config_file(), "track_count = 8\n")?;
    let output = run_barrage_command(&env, &["config", "show"])?;
    assert_eq!(output.exit_code, 0, "show failed: {}", output.stderr);
    assert!(output.stdout.contains("track_count = 8"));
    assert!(output.stdout.contains("frame_width = 720"));

    let output = run_barrage_command(&env, &["--output", "json", "config", "path"])?;
    let path = output.event("barrage.config.path").expect("path event");
    assert_eq!(path["data"]["exists"], true);
    assert_eq!(
        path["data"]["path"],
        env.config_file().display().to_string()
    );
    Ok(())
}

#[test]
fn test_burn_dry_run_prints_command() -> Result<()> {
    let env = TestEnvironment::new()?;
    env.fixture("live.xml")?;
    env.write("live.ts", "not a real video")?;

    let output = run_barrage_command(
        &env,
        &[
            "--output",
            "json",
            "burn",
            "live.xml",
            "live.ts",
            "--mode",
            "ultrafast",
            "--dry-run",
        ],
    )?;
    assert_eq!(output.exit_code, 0, "dry run failed: {}", output.stderr);

    let command = output
        .event("barrage.burn.command")
        .expect("command event");
    let args: Vec<String> = serde_json::from_value(command["data"]["args"].clone())?;
    assert_eq!(args[..3], ["-y", "-i", "live.ts"]);
    assert!(args.windows(2).any(|w| w == ["-preset", "ultrafast"]));
    assert_eq!(args.last().map(String::as_str), Some("live_danmaku.mp4"));
    assert!(command["message"].as_str().unwrap().starts_with("ffmpeg -y -i live.ts"));

    assert!(env.path().join("live_danmaku.ass").exists());
    assert!(!env.path().join("live_danmaku.mp4").exists());
    Ok(())
}

#[test]
fn test_burn_requires_existing_video() -> Result<()> {
    let env = TestEnvironment::new()?;
    env.fixture("live.xml")?;

    let output = run_barrage_command(&env, &["burn", "live.xml", "missing.ts", "--mode", "fast"])?;
    assert_eq!(output.exit_code, 1);
    assert!(output.stderr.contains("missing.ts not found"), "{}", output.stderr);
    Ok(())
}

#[test]
fn test_burn_keeps_existing_subtitle_track() -> Result<()> {
    let env = TestEnvironment::new()?;
    env.fixture("live.xml")?;
    env.write("live.ts", "not a real video")?;
    env.write("live_danmaku.ass", "hand tuned")?;

    for flag in ["--dry-run", "--keep-ass"] {
        let output = run_barrage_command(
            &env,
            &["burn", "live.xml", "live.ts", "--mode", "fast", flag],
        )?;
        assert_eq!(output.exit_code, 1, "{flag} should refuse to overwrite");
        assert!(output.stderr.contains("already exists"), "{}", output.stderr);
        assert_eq!(
            fs::read_to_string(env.path().join("live_danmaku.ass"))?,
            "hand tuned"
        );
    }

    let output = run_barrage_command(
        &env,
        &["burn", "live.xml", "live.ts", "--mode", "fast", "--dry-run", "--force"],
    )?;
    assert_eq!(output.exit_code, 0, "forced dry run failed: {}", output.stderr);
    assert_ne!(
        fs::read_to_string(env.path().join("live_danmaku.ass"))?,
        "hand tuned"
    );
    Ok(())
}

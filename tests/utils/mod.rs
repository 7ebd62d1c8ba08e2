use anyhow::Result;
use std::process::Command;

use super::common::TestEnvironment;

pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutput {
    /// Parse every stdout line as a JSON event.
    pub fn json_events(&self) -> Vec<serde_json::Value> {
        self.stdout
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }

    pub fn event(&self, code: &str) -> Option<serde_json::Value> {
        self.json_events()
            .into_iter()
            .find(|event| event["code"] == code)
    }
}

/// Run the compiled binary inside the environment with colors off.
pub fn run_barrage_command(env: &TestEnvironment, args: &[&str]) -> Result<CommandOutput> {
    let output = Command::new(env!("CARGO_BIN_EXE_barrage"))
        .args(args)
        .current_dir(env.path())
        .env("XDG_CONFIG_HOME", env.config_home())
        .env("NO_COLOR", "1")
        .output()?;

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code: output.status.code().unwrap_or(-1),
    })
}

pub fn dialogue_lines(content: &str) -> Vec<&str> {
    content
        .lines()
        .filter(|line| line.starts_with("Dialogue:"))
        .collect()
}

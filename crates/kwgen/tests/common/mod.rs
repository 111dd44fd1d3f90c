use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

/// Runs the kwgen binary with HOME and XDG dirs pointed at temp directories.
pub struct TestEnv {
    home: TempDir,
    config: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            home: tempfile::tempdir().expect("create temporary HOME dir"),
            config: tempfile::tempdir().expect("create temporary XDG config dir"),
        }
    }

    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_kwgen"))
            .args(args)
            .env("HOME", self.home.path())
            .env("XDG_CONFIG_HOME", self.config.path())
            .env_remove("OPENAI_API_KEY")
            .env_remove("GOOGLE_API_KEY")
            .env_remove("RUST_LOG")
            .output()
            .expect("failed to execute kwgen binary")
    }

    pub fn config_path(&self) -> PathBuf {
        let output = self.run(&["config", "path"]);
        assert_success(&output, "config path");
        PathBuf::from(stdout(&output).trim())
    }

    pub fn write_config(&self, contents: &str) {
        let path = self.config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create config parent directory");
        }
        std::fs::write(&path, contents).expect("write config file");
    }

    #[allow(dead_code)]
    pub fn read_config(&self) -> String {
        std::fs::read_to_string(self.config_path()).expect("read config file")
    }
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

pub fn assert_success(output: &Output, what: &str) {
    assert!(
        output.status.success(),
        "{what} should succeed\nstdout:\n{}\nstderr:\n{}",
        stdout(output),
        stderr(output),
    );
}

/// Write a small PNG fixture.
#[allow(dead_code)]
pub fn write_png(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    image::RgbImage::from_fn(16, 12, |x, y| image::Rgb([(x * 16) as u8, (y * 20) as u8, 90]))
        .save(&path)
        .expect("write png fixture");
    path
}

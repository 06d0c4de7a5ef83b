//! Shared fixtures for driving the `gmat-lab` binary against a scratch repository.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

/// A throwaway repository root with lab layout helpers.
pub struct LabFixture {
    _temp: TempDir,
    pub root: PathBuf,
}

impl LabFixture {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("create temp dir");
        let root = temp
            .path()
            .canonicalize()
            .expect("canonicalize temp dir");
        Self { _temp: temp, root }
    }

    /// Write `contents` at a root-relative path, creating parents.
    pub fn write(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dir");
        }
        fs::write(&path, contents).expect("write fixture file");
        path
    }

    pub fn write_catalog(&self, tier: &str, json: &str) {
        self.write(&format!(".gmat-lab/cases/{tier}/catalog.json"), json);
    }

    #[cfg(unix)]
    pub fn write_executable(&self, rel: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = self.write(rel, body);
        let mut perms = fs::metadata(&path).expect("stat script").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).expect("chmod script");
        path
    }

    /// `git init` plus one commit of everything; false when git is unavailable.
    #[allow(dead_code)]
    pub fn commit_all(&self) -> bool {
        let steps: [&[&str]; 3] = [
            &["init", "-q"],
            &["add", "-A"],
            &[
                "-c",
                "user.name=lab",
                "-c",
                "user.email=lab@example.invalid",
                "commit",
                "-q",
                "-m",
                "fixture",
            ],
        ];
        for args in steps {
            let ok = Command::new("git")
                .args(args)
                .current_dir(&self.root)
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .map(|status| status.success())
                .unwrap_or(false);
            if !ok {
                eprintln!("Skipping: git unavailable or commit failed");
                return false;
            }
        }
        true
    }

    /// Run the binary with `--root` pointed at the fixture and GMAT env cleared.
    pub fn run(&self, args: &[&str], envs: &[(&str, &Path)]) -> Output {
        let mut command = Command::new(env!("CARGO_BIN_EXE_gmat-lab"));
        command
            .arg("--root")
            .arg(&self.root)
            .args(args)
            .current_dir(&self.root)
            .env_remove("GMAT_BIN")
            .env_remove("GMAT_COMPAT_LIB_DIR")
            .env_remove("GMAT_TEST_SANDBOX")
            .env_remove("RUST_LOG");
        for (key, value) in envs {
            command.env(key, value);
        }
        command.output().expect("spawn gmat-lab")
    }

    pub fn read_json(&self, rel: &str) -> serde_json::Value {
        let text = fs::read_to_string(self.root.join(rel)).expect("read json artifact");
        serde_json::from_str(&text).expect("parse json artifact")
    }
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

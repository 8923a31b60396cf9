//! Shared test infrastructure for integration tests.
//!
//! Each fixture owns a temp dir holding a fake `go` shell script, a GOBIN
//! directory, and the `go version -m` text the script replays. The script
//! appends every `go install` call to a log so tests can assert on them.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A scripted go toolchain rooted in a temp dir.
pub struct GoFixture {
    pub root: TempDir,
    pub bin_dir: PathBuf,
    script: PathBuf,
    install_log: PathBuf,
    failing: PathBuf,
}

/// One `go install` call recorded by the fake toolchain.
#[derive(Debug)]
pub struct InstallCall {
    pub spec: String,
    pub cwd: PathBuf,
}

impl GoFixture {
    /// Build a fixture whose active Go version is `active` and whose GOBIN
    /// contains the blocks in `inventory` (with `{bin}` replaced by the GOBIN
    /// path).
    pub fn new(active: &str, inventory: &str) -> anyhow::Result<Self> {
        let root = tempfile::Builder::new().prefix("gobin-fixture-").tempdir()?;
        let bin_dir = root.path().join("bin");
        fs::create_dir_all(&bin_dir)?;
        let bin = bin_dir.display().to_string();

        let inventory_path = root.path().join("inventory.txt");
        fs::write(&inventory_path, inventory.replace("{bin}", &bin))?;
        let install_log = root.path().join("installs.log");
        let failing = root.path().join("failing.txt");
        fs::write(&failing, "")?;

        let script = root.path().join("go.sh");
        fs::write(
            &script,
            render_script(&bin, active, &inventory_path, &install_log, &failing),
        )?;

        Ok(Self {
            root,
            bin_dir,
            script,
            install_log,
            failing,
        })
    }

    /// Make `go install <spec>` exit non-zero.
    pub fn fail_install(&self, spec: &str) -> anyhow::Result<()> {
        let mut current = fs::read_to_string(&self.failing)?;
        current.push_str(spec);
        current.push('\n');
        fs::write(&self.failing, current)?;
        Ok(())
    }

    /// Make every `go env` call fail.
    pub fn break_go_env(&self) -> anyhow::Result<()> {
        fs::write(self.root.path().join("env-broken"), "")?;
        Ok(())
    }

    /// Value for `--go` / `REBUILD_GOBIN_GO`.
    pub fn go_command(&self) -> String {
        shell_words::join(["sh", self.script.to_str().unwrap_or_default()])
    }

    /// Run the binary with `--go` pointing at the fake toolchain.
    pub fn run(&self, args: &[&str]) -> anyhow::Result<Output> {
        let go = self.go_command();
        let output = base_command()
            .arg("--go")
            .arg(&go)
            .args(args)
            .output()?;
        Ok(output)
    }

    /// Run the binary with the fake toolchain supplied through the environment.
    pub fn run_with_env(&self, args: &[&str]) -> anyhow::Result<Output> {
        let output = base_command()
            .env("REBUILD_GOBIN_GO", self.go_command())
            .args(args)
            .output()?;
        Ok(output)
    }

    pub fn installs(&self) -> anyhow::Result<Vec<InstallCall>> {
        if !self.install_log.is_file() {
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(&self.install_log)?;
        Ok(text
            .lines()
            .filter_map(|line| line.split_once('\t'))
            .map(|(spec, cwd)| InstallCall {
                spec: spec.to_string(),
                cwd: PathBuf::from(cwd),
            })
            .collect())
    }
}

fn base_command() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_rebuild-gobin"));
    cmd.env_remove("RUST_LOG").env_remove("REBUILD_GOBIN_GO");
    cmd
}

fn render_script(
    bin: &str,
    active: &str,
    inventory: &Path,
    install_log: &Path,
    failing: &Path,
) -> String {
    let root = inventory
        .parent()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    format!(
        r#"#!/bin/sh
case "$1" in
env)
    if [ -e "{root}/env-broken" ]; then
        echo "go: broken environment" >&2
        exit 1
    fi
    if [ "$3" = "GOBIN" ]; then
        printf '{{"GOBIN": "%s", "GOPATH": "/nonexistent"}}\n' "{bin}"
    else
        printf '{{"GOARCH": "amd64", "GOOS": "linux"}}\n'
    fi
    ;;
version)
    if [ "$2" = "-m" ]; then
        [ "$3" = "{bin}" ] || exit 2
        cat "{inventory}"
    else
        echo "go version {active} linux/amd64"
    fi
    ;;
install)
    printf '%s\t%s\n' "$2" "$(pwd)" >> "{log}"
    echo "installing $2"
    if grep -qxF "$2" "{failing}"; then
        echo "go: $2: module not found" >&2
        exit 1
    fi
    ;;
*)
    exit 2
    ;;
esac
"#,
        inventory = inventory.display(),
        log = install_log.display(),
        failing = failing.display(),
    )
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

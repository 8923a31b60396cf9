//! The `go` command as seen by the rebuild workflow.
//!
//! Discovery calls (`go env`, `go version`, `go version -m`) capture output and
//! are bounded by a timeout; a timeout or non-zero exit is an error. Installs
//! stream their output to the terminal and run without a time limit.
//!
//! The go command is resolved in priority order:
//! 1. `--go` CLI flag
//! 2. `REBUILD_GOBIN_GO` environment variable
//! 3. `go` on `PATH`
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::rebuild::RebuildSpec;
use crate::util::format_command_line;

pub const GO_COMMAND_ENV: &str = "REBUILD_GOBIN_GO";

const ENV_TIMEOUT: Duration = Duration::from_secs(1);
const VERSION_TIMEOUT: Duration = Duration::from_secs(1);
const INVENTORY_TIMEOUT: Duration = Duration::from_secs(10);
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// External collaborators the workflow depends on.
pub trait Toolchain {
    /// Directory `go install` places binaries into.
    fn install_dir(&self) -> Result<PathBuf>;

    /// Active Go version without the platform suffix, e.g. `go1.21.0`.
    fn active_version(&self) -> Result<String>;

    /// Raw `go version -m` text for every binary in `dir`.
    fn inventory(&self, dir: &Path) -> Result<String>;

    /// Run `go install <spec>` from `cwd`. Output goes straight to the
    /// operator; only success or failure is reported back.
    fn install(&self, spec: &RebuildSpec, cwd: &Path) -> Result<()>;
}

/// A go command line, e.g. `go` or `/usr/local/go/bin/go`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoCommand {
    program: String,
    args: Vec<String>,
}

impl GoCommand {
    /// Parse a command string with shell quoting rules.
    pub fn parse(command: &str) -> Result<Self> {
        let mut words =
            shell_words::split(command).with_context(|| format!("parse go command: {command}"))?;
        if words.is_empty() {
            return Err(anyhow!("go command is empty"));
        }
        let program = words.remove(0);
        Ok(Self {
            program,
            args: words,
        })
    }

    /// Resolve from the CLI flag, then the environment, then `PATH`.
    pub fn resolve(flag: Option<&str>) -> Result<Self> {
        if let Some(command) = flag {
            return Self::parse(command);
        }
        if let Ok(command) = std::env::var(GO_COMMAND_ENV) {
            return Self::parse(&command).with_context(|| format!("read {GO_COMMAND_ENV}"));
        }
        let path = which::which("go").context("locate go on PATH")?;
        Ok(Self {
            program: path.to_string_lossy().to_string(),
            args: Vec::new(),
        })
    }

    fn command<I, S>(&self, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).args(args);
        cmd
    }

    fn argv<'a>(&'a self, extra: &[&'a str]) -> Vec<&'a str> {
        let mut argv = Vec::with_capacity(1 + self.args.len() + extra.len());
        argv.push(self.program.as_str());
        argv.extend(self.args.iter().map(String::as_str));
        argv.extend_from_slice(extra);
        argv
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
struct GoEnvPaths {
    #[serde(default)]
    gobin: String,
    #[serde(default)]
    gopath: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
struct GoEnvPlatform {
    #[serde(default)]
    goos: String,
    #[serde(default)]
    goarch: String,
}

/// [`Toolchain`] backed by a real go binary.
#[derive(Debug, Clone)]
pub struct GoToolchain {
    go: GoCommand,
}

impl GoToolchain {
    pub fn new(go: GoCommand) -> Self {
        Self { go }
    }

    fn capture(&self, args: &[&str], timeout: Duration) -> Result<String> {
        let line = format_command_line(&self.go.argv(args));
        let start = Instant::now();
        let stdout = run_with_timeout(self.go.command(args), timeout)
            .with_context(|| format!("run {line}"))?;
        tracing::debug!(
            elapsed_ms = start.elapsed().as_millis(),
            stdout_bytes = stdout.len(),
            command = %line,
            "go command complete"
        );
        String::from_utf8(stdout).with_context(|| format!("decode output of {line} as UTF-8"))
    }
}

impl Toolchain for GoToolchain {
    fn install_dir(&self) -> Result<PathBuf> {
        let json = self.capture(&["env", "-json", "GOBIN", "GOPATH"], ENV_TIMEOUT)?;
        let env: GoEnvPaths =
            serde_json::from_str(&json).context("cannot parse go env output")?;
        install_dir_from_env(&env.gobin, &env.gopath, dirs::home_dir())
    }

    fn active_version(&self) -> Result<String> {
        let json = self.capture(&["env", "-json", "GOOS", "GOARCH"], ENV_TIMEOUT)?;
        let platform: GoEnvPlatform =
            serde_json::from_str(&json).context("cannot parse go env output")?;
        let raw = self.capture(&["version"], VERSION_TIMEOUT)?;
        Ok(normalize_go_version(&raw, &platform.goos, &platform.goarch))
    }

    fn inventory(&self, dir: &Path) -> Result<String> {
        let dir = dir.to_string_lossy();
        self.capture(&["version", "-m", dir.as_ref()], INVENTORY_TIMEOUT)
    }

    fn install(&self, spec: &RebuildSpec, cwd: &Path) -> Result<()> {
        let argv = self.go.argv(&["install", spec.as_str()]);
        eprintln!("running: {}", format_command_line(&argv));
        let status = self
            .go
            .command(["install", spec.as_str()])
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .context("spawn go install")?;
        if !status.success() {
            return Err(anyhow!("go install {spec} failed with {status}"));
        }
        Ok(())
    }
}

/// `GOBIN` when set, otherwise `bin` under the first `GOPATH` entry, otherwise
/// `$HOME/go/bin` (Go's own default GOPATH).
pub fn install_dir_from_env(gobin: &str, gopath: &str, home: Option<PathBuf>) -> Result<PathBuf> {
    if !gobin.is_empty() {
        return Ok(PathBuf::from(gobin));
    }
    if let Some(first) = std::env::split_paths(gopath).find(|p| !p.as_os_str().is_empty()) {
        return Ok(first.join("bin"));
    }
    let home =
        home.ok_or_else(|| anyhow!("GOBIN and GOPATH are unset and no home directory is known"))?;
    Ok(home.join("go").join("bin"))
}

/// Turn `go version go1.21.0 linux/amd64` into `go1.21.0`.
pub fn normalize_go_version(raw: &str, goos: &str, goarch: &str) -> String {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix("go version").unwrap_or(trimmed);
    let platform = format!("{goos}/{goarch}");
    let trimmed = trimmed.strip_suffix(platform.as_str()).unwrap_or(trimmed);
    trimmed.trim().to_string()
}

/// Run `cmd` to completion and return its stdout, killing it after `timeout`.
///
/// Stdout and stderr are drained on helper threads so a chatty child cannot
/// block on a full pipe while we poll.
pub fn run_with_timeout(mut cmd: Command, timeout: Duration) -> Result<Vec<u8>> {
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .context("spawn command")?;

    let stdout_reader = child.stdout.take().map(drain);
    let stderr_reader = child.stderr.take().map(drain);

    let start = Instant::now();
    let status = loop {
        if let Some(status) = child.try_wait().context("check command status")? {
            break status;
        }
        if start.elapsed() > timeout {
            let _ = child.kill();
            let _ = child.wait();
            return Err(anyhow!("timed out after {}ms", timeout.as_millis()));
        }
        thread::sleep(POLL_INTERVAL);
    };

    let stdout = join_reader(stdout_reader)?;
    let stderr = join_reader(stderr_reader)?;
    if !status.success() {
        let stderr = String::from_utf8_lossy(&stderr);
        let detail = stderr.trim().lines().next().unwrap_or_default();
        if detail.is_empty() {
            return Err(anyhow!("exited with {status}"));
        }
        return Err(anyhow!("exited with {status}: {detail}"));
    }
    Ok(stdout)
}

fn drain<R: Read + Send + 'static>(mut reader: R) -> thread::JoinHandle<std::io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

fn join_reader(
    handle: Option<thread::JoinHandle<std::io::Result<Vec<u8>>>>,
) -> Result<Vec<u8>> {
    let Some(handle) = handle else {
        return Ok(Vec::new());
    };
    handle
        .join()
        .map_err(|_| anyhow!("output reader panicked"))?
        .context("read command output")
}

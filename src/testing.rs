//! In-process stand-in for the go command used by unit tests.
use anyhow::{anyhow, Result};
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::rebuild::RebuildSpec;
use crate::toolchain::Toolchain;

#[derive(Debug, Default)]
pub struct FakeToolchain {
    pub dir: PathBuf,
    pub version: String,
    pub inventory_text: String,
    pub fail_discovery: bool,
    failing: BTreeSet<String>,
    installs: RefCell<Vec<(String, PathBuf)>>,
}

impl FakeToolchain {
    pub fn new(dir: &str, version: &str, inventory_text: &str) -> Self {
        Self {
            dir: PathBuf::from(dir),
            version: version.to_string(),
            inventory_text: inventory_text.to_string(),
            ..Self::default()
        }
    }

    /// Make `go install <spec>` fail.
    pub fn failing(mut self, spec: &str) -> Self {
        self.failing.insert(spec.to_string());
        self
    }

    /// Recorded `(spec, cwd)` pairs, in call order.
    pub fn installs(&self) -> Vec<(String, PathBuf)> {
        self.installs.borrow().clone()
    }
}

impl Toolchain for FakeToolchain {
    fn install_dir(&self) -> Result<PathBuf> {
        if self.fail_discovery {
            return Err(anyhow!("go env failed"));
        }
        Ok(self.dir.clone())
    }

    fn active_version(&self) -> Result<String> {
        Ok(self.version.clone())
    }

    fn inventory(&self, dir: &Path) -> Result<String> {
        if dir != self.dir {
            return Err(anyhow!("unexpected inventory dir {}", dir.display()));
        }
        Ok(self.inventory_text.clone())
    }

    fn install(&self, spec: &RebuildSpec, cwd: &Path) -> Result<()> {
        self.installs
            .borrow_mut()
            .push((spec.as_str().to_string(), cwd.to_path_buf()));
        if self.failing.contains(spec.as_str()) {
            return Err(anyhow!("go install {spec} failed with exit status: 1"));
        }
        Ok(())
    }
}

//! Parsing of `go version -m <dir>` output into binary records.
//!
//! The output is a sequence of blocks, one per Go binary found in the
//! directory:
//!
//! ```text
//! /home/user/go/bin/tlstun: go1.21.0
//!         path    github.com/artyom/tlstun/v2
//!         mod     github.com/artyom/tlstun/v2     v2.2.1  h1:uo/Oj/63PdKuwYJ+LiAl61wefhC2CvNpDMegN+xxpmM=
//!         dep     github.com/armon/go-socks5      v0.0.0-20160902184237-e75332964ef5      h1:0
//!         build   -compiler=gc
//! ```
//!
//! Block boundaries are detected by the header line starting with the
//! directory path. This is a prefix heuristic, not a format parser: any line
//! beginning with the directory path starts a new record.
use std::fmt;

/// Module version Go records for binaries built from a local, untagged tree.
pub const DEVEL_VERSION: &str = "(devel)";

/// One installed binary as described by `go version -m`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BinaryRecord {
    /// Main package path, e.g. `github.com/davecheney/httpstat`.
    pub path: String,
    /// Main module version, a pseudo-version, or [`DEVEL_VERSION`].
    pub module_version: String,
    /// Go version the binary was built with, e.g. `go1.21.0`.
    pub build_toolchain_version: String,
}

impl BinaryRecord {
    /// A record is usable only once all three fields were seen.
    pub fn is_valid(&self) -> bool {
        !self.path.is_empty()
            && !self.module_version.is_empty()
            && !self.build_toolchain_version.is_empty()
    }

    pub fn is_devel(&self) -> bool {
        self.module_version == DEVEL_VERSION
    }

    fn into_valid(self) -> Option<Self> {
        self.is_valid().then_some(self)
    }
}

impl fmt::Display for BinaryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{} ({})",
            self.path, self.module_version, self.build_toolchain_version
        )
    }
}

/// Consume one line of inventory text.
///
/// Returns the record under construction after this line, plus the previous
/// record when this line closed it and it was complete.
pub fn reduce_line(
    current: BinaryRecord,
    dir: &str,
    line: &str,
) -> (BinaryRecord, Option<BinaryRecord>) {
    if line.starts_with(dir) {
        let toolchain = line
            .split_once(": ")
            .map(|(_, rest)| rest)
            .unwrap_or_default();
        let next = BinaryRecord {
            build_toolchain_version: toolchain.to_string(),
            ..BinaryRecord::default()
        };
        return (next, current.into_valid());
    }

    let mut current = current;
    let fields: Vec<&str> = line.split_whitespace().collect();
    match fields.as_slice() {
        ["path", path] => current.path = (*path).to_string(),
        ["mod", _, version, ..] => current.module_version = (*version).to_string(),
        _ => {}
    }
    (current, None)
}

/// Parse the full inventory text for `dir`, keeping only complete records.
///
/// Records are returned in input order. Blocks that never gain a package
/// path, module version and Go version are dropped without diagnostics.
pub fn parse_inventory(dir: &str, text: &str) -> Vec<BinaryRecord> {
    let mut records = Vec::new();
    let mut current = BinaryRecord::default();
    for line in text.lines() {
        let (next, emitted) = reduce_line(current, dir, line);
        current = next;
        records.extend(emitted);
    }
    records.extend(current.into_valid());
    records
}

#[cfg(test)]
#[path = "inventory_tests.rs"]
mod tests;

//! CLI argument parsing.
use clap::Parser;

/// Rebuild binaries under GOBIN that were built with a different Go version.
///
/// Every binary is inspected with `go version -m`; those built with a Go
/// version other than the active one are reinstalled with
/// `go install path@version`.
#[derive(Parser, Debug)]
#[command(
    name = "rebuild-gobin",
    version,
    after_help = "Examples:\n  rebuild-gobin        Rebuild outdated binaries at their installed version\n  rebuild-gobin -u     Reinstall every binary at @latest\n  rebuild-gobin -v     Also log each planning decision"
)]
pub struct RootArgs {
    /// Reinstall programs using their '@latest' version
    #[arg(short = 'u')]
    pub upgrade: bool,

    /// Log planning decisions and go command timings
    #[arg(short, long)]
    pub verbose: bool,

    /// Go command to run (default: $REBUILD_GOBIN_GO, then `go` on PATH)
    #[arg(long, value_name = "CMD")]
    pub go: Option<String>,
}

//! Run outcome accumulation and the final operator summary.

/// Per-run accumulator filled by the executor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Packages that needed a rebuild but only had a `(devel)` version.
    pub skipped_unrebuildable: Vec<String>,
    /// Packages whose `go install` did not succeed.
    pub failed: Vec<String>,
    /// Number of successful installs; logged, not reported.
    pub rebuilt: usize,
}

impl BatchOutcome {
    pub fn is_clean(&self) -> bool {
        self.skipped_unrebuildable.is_empty() && self.failed.is_empty()
    }
}

/// Render the end-of-run summary, or `None` when there is nothing to say.
pub fn render_report(outcome: &BatchOutcome) -> Option<String> {
    if outcome.is_clean() {
        return None;
    }
    let mut out = String::new();
    if !outcome.skipped_unrebuildable.is_empty() {
        push_section(
            &mut out,
            "Skipped the following programs because of the (devel) module version:",
            &outcome.skipped_unrebuildable,
        );
    }
    if !outcome.failed.is_empty() {
        push_section(
            &mut out,
            "There were errors installing the following modules, see the full log above:",
            &outcome.failed,
        );
    }
    Some(out)
}

fn push_section(out: &mut String, title: &str, paths: &[String]) {
    out.push_str(title);
    out.push('\n');
    for path in paths {
        out.push_str("  ");
        out.push_str(path);
        out.push('\n');
    }
}

//! Unified diff preview of a run's changes.

use camino::Utf8Path;
use diffy::PatchFormatter;
use tracefix_types::report::ChangedFile;

/// Renders `changes` as a git-style patch. Paths under `root` are shown relative to it.
pub fn render_patch(root: &Utf8Path, changes: &[ChangedFile]) -> String {
    let mut out = String::new();
    let formatter = PatchFormatter::new();

    for change in changes {
        if change.before == change.after {
            continue;
        }
        let path = change.path.strip_prefix(root).unwrap_or(&change.path);

        out.push_str(&format!("diff --git a/{0} b/{0}\n", path));
        out.push_str(&format!("--- a/{0}\n+++ b/{0}\n", path));

        let patch = diffy::create_patch(&change.before, &change.after);
        let body = formatter.fmt_patch(&patch).to_string();
        // diffy repeats the header; the git-style one above replaces it.
        let hunks = body
            .split_once("\n@@")
            .map(|(_, rest)| format!("@@{rest}"))
            .unwrap_or_default();
        out.push_str(&hunks);
        if !out.ends_with('\n') {
            out.push('\n');
        }
    }

    out
}

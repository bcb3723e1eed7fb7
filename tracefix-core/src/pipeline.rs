//! The transform engine.
//!
//! Entry points are I/O-agnostic: loading and writing go through the port traits.

use crate::ports::{PackageSource, WritePort};
use crate::preview::render_patch;
use crate::settings::RunSettings;
use std::collections::{BTreeMap, BTreeSet};
use tracefix_domain::{Candidate, ResolvedSettings, TypeTags, Verdict, decide};
use tracefix_edit::{Mutator, SpanHook, imports};
use tracefix_syntax::render;
use tracefix_types::dst::assumed_name;
use tracefix_types::report::{ChangedFile, Direction, RunSummary};
use tracefix_types::{Package, SimpleResolver, SourceFile, TraceError};
use tracing::{debug, info};

/// Outcome of [`run`].
#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    pub summary: RunSummary,
    /// Unified diff of every changed file, paths relative to the run root.
    pub patch: String,
}

/// Loads packages, instruments them with the span hook and writes changed files.
pub fn run(
    settings: &RunSettings,
    source: &dyn PackageSource,
    writer: &dyn WritePort,
) -> Result<RunOutcome, TraceError> {
    let resolved = settings.settings.clone().parse()?;
    let packages = source.load_packages()?;
    debug!(packages = packages.len(), "loaded packages");

    let hook = SpanHook::new(settings.pattern.clone());
    let summary = process_packages(
        &resolved,
        packages,
        &hook,
        &settings.resolver_hints(),
        writer,
    )?;
    let patch = render_patch(&settings.root, &summary.changed);
    Ok(RunOutcome { summary, patch })
}

/// Runs `mutator` over every function of every package that is not excluded.
///
/// Files are written per package, after every file of the package has been transformed; a
/// file is written only when its rendered bytes change. The first error aborts the run and
/// packages already written stay written.
pub fn process_packages(
    settings: &ResolvedSettings,
    packages: Vec<Package>,
    mutator: &dyn Mutator,
    hints: &BTreeMap<String, String>,
    writer: &dyn WritePort,
) -> Result<RunSummary, TraceError> {
    let mut summary = RunSummary::default();
    let managed = mutator.managed_imports();

    for mut pkg in packages {
        let match_path = pkg.match_path();
        if settings.is_excluded(match_path.as_str()) {
            debug!(package = %match_path, "excluded");
            summary.packages_excluded += 1;
            continue;
        }
        summary.packages += 1;

        let types = TypeTags::scan(
            settings,
            pkg.files.iter().flat_map(|f| f.syntax.types()),
        );

        let mut staged = Vec::new();
        for file in &mut pkg.files {
            summary.files += 1;
            if let Some(change) =
                process_file(settings, file, &types, mutator, &managed, hints, &mut summary)?
            {
                staged.push(change);
            }
        }

        for change in &staged {
            writer
                .write_file(&change.path, change.after.as_bytes())
                .map_err(|source| TraceError::Write {
                    path: change.path.clone(),
                    source,
                })?;
            info!(path = %change.path, "updated");
        }
        summary.changed.extend(staged);
    }

    Ok(summary)
}

fn process_file(
    settings: &ResolvedSettings,
    file: &mut SourceFile,
    types: &TypeTags,
    mutator: &dyn Mutator,
    managed: &[String],
    hints: &BTreeMap<String, String>,
    summary: &mut RunSummary,
) -> Result<Option<ChangedFile>, TraceError> {
    let resolver = SimpleResolver::for_file(&file.syntax, hints);
    let before = render(&file.syntax, &resolver)?;

    let mut wanted = BTreeSet::new();
    let mut removed = false;
    for func in file.syntax.funcs_mut() {
        let verdict = decide(settings, &Candidate::from_func(func), types);
        match verdict {
            Verdict::Include => summary.functions_included += 1,
            Verdict::Skip => summary.functions_skipped += 1,
        }
        let outcome = mutator.mutate(func, verdict.should_skip());
        match outcome.direction {
            Direction::Insert => wanted.extend(outcome.imports),
            Direction::Remove => removed = true,
        }
    }

    // A file that lost a prologue only gets imports back through reconciliation.
    if !removed {
        for path in &wanted {
            let name = resolver
                .get(path)
                .map(str::to_owned)
                .unwrap_or_else(|| assumed_name(path));
            imports::ensure(&mut file.syntax, path, &name);
        }
    }
    let resolver = SimpleResolver::for_file(&file.syntax, hints);
    imports::reconcile(&mut file.syntax, managed, &resolver);

    let resolver = SimpleResolver::for_file(&file.syntax, hints);
    let after = render(&file.syntax, &resolver)?;
    if after == before {
        return Ok(None);
    }
    debug!(path = %file.path, "changed");
    Ok(Some(ChangedFile {
        path: file.path.clone(),
        before,
        after,
    }))
}
